use chrono::NaiveDate;
use finflow_core::{LedgerError, LedgerTransaction, Money, TransactionKind, OTHER_CATEGORY};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::backend::{ReceiptImage, ScanBackend, ScanError};

/// Expense category ids offered to the service when the caller supplies none.
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "food",
    "transport",
    "housing",
    "health",
    "education",
    "leisure",
    "clothing",
    "services",
    "investments",
    OTHER_CATEGORY,
];

/// Fields read off a receipt, already validated and defaulted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannedReceipt {
    pub description: String,
    /// Always non-negative; the sign is applied when the receipt becomes an expense.
    pub amount: Money,
    pub category: String,
    pub date: NaiveDate,
}

impl ScannedReceipt {
    pub fn into_transaction(self, id: impl Into<String>) -> Result<LedgerTransaction, LedgerError> {
        let amount = -self.amount.abs();
        if !TransactionKind::Expense.accepts(amount) {
            return Err(LedgerError::SignMismatch {
                amount,
                kind: TransactionKind::Expense,
            });
        }
        Ok(LedgerTransaction {
            id: id.into(),
            date: self.date,
            description: self.description,
            amount,
            kind: TransactionKind::Expense,
            category: self.category,
            account_id: None,
            card_id: None,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawReceipt {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    amount: Option<Value>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    date: Option<String>,
}

pub struct ReceiptScanner<B: ScanBackend> {
    backend: B,
    categories: Vec<String>,
}

impl<B: ScanBackend> ReceiptScanner<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn with_categories(mut self, categories: Vec<String>) -> Self {
        if !categories.is_empty() {
            self.categories = categories;
        }
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn instruction(&self, today: NaiveDate) -> String {
        format!(
            "Read this receipt and answer with a single JSON object and nothing else, \
             in the form {{\"description\": string, \"amount\": number, \"category\": string, \"date\": \"YYYY-MM-DD\"}}. \
             description is the merchant or a short summary. amount is the total paid. \
             category must be one of: {}. If the date is not visible use {}.",
            self.categories.join(", "),
            today.format("%Y-%m-%d"),
        )
    }

    /// One round trip to the backend. Failures are returned as-is; nothing is retried.
    pub fn scan(&self, image: &ReceiptImage, today: NaiveDate) -> Result<ScannedReceipt, ScanError> {
        if image.bytes.is_empty() {
            return Err(ScanError::EmptyImage);
        }
        let reply = self.backend.complete(image, &self.instruction(today))?;
        debug!(chars = reply.len(), "receipt scan reply received");
        parse_reply(&reply, today)
    }
}

/// Removes markdown code fences the service sometimes wraps around JSON.
pub fn strip_fences(text: &str) -> &str {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```") {
        body = rest.strip_prefix("json").unwrap_or(rest);
    }
    if let Some(rest) = body.strip_suffix("```") {
        body = rest;
    }
    body.trim()
}

pub fn parse_reply(reply: &str, today: NaiveDate) -> Result<ScannedReceipt, ScanError> {
    let raw: RawReceipt = serde_json::from_str(strip_fences(reply))
        .map_err(|e| ScanError::Unreadable(e.to_string()))?;

    let description = raw
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .ok_or_else(|| ScanError::Unreadable("missing description".to_string()))?;

    let amount = raw
        .amount
        .as_ref()
        .and_then(amount_value)
        .filter(|a| *a != 0.0)
        .ok_or_else(|| ScanError::Unreadable("missing amount".to_string()))?;

    let category = raw
        .category
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| OTHER_CATEGORY.to_string());

    let date = match raw.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        None => today,
        Some(text) => NaiveDate::parse_from_str(text, "%Y-%m-%d").unwrap_or_else(|_| {
            warn!(date = text, "unreadable receipt date, using today");
            today
        }),
    };

    Ok(ScannedReceipt {
        description,
        amount: Money::from_f64(amount.abs()),
        category,
        date,
    })
}

fn amount_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}
