use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::money::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
    Transfer,
    CardPayment,
}

impl TransactionKind {
    /// Kind implied by the sign of an amount: zero and above is income.
    pub fn from_amount(amount: Money) -> Self {
        if amount.is_negative() {
            TransactionKind::Expense
        } else {
            TransactionKind::Income
        }
    }

    /// +1 for income, -1 for every outflow kind.
    pub fn expected_sign(self) -> i8 {
        match self {
            TransactionKind::Income => 1,
            TransactionKind::Expense | TransactionKind::Transfer | TransactionKind::CardPayment => -1,
        }
    }

    pub fn accepts(self, amount: Money) -> bool {
        match self.expected_sign() {
            1 => amount.is_positive(),
            _ => amount.is_negative(),
        }
    }

    /// Transfers and card payments move money between the user's own
    /// accounts and are left out of income/expense totals.
    pub fn counts_toward_cash_flow(self) -> bool {
        matches!(self, TransactionKind::Income | TransactionKind::Expense)
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::Income => write!(f, "income"),
            TransactionKind::Expense => write!(f, "expense"),
            TransactionKind::Transfer => write!(f, "transfer"),
            TransactionKind::CardPayment => write!(f, "card_payment"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for ImportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportStatus::Pending => write!(f, "pending"),
            ImportStatus::Approved => write!(f, "approved"),
            ImportStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// A parsed statement row waiting for the user's approval.
///
/// `date` stays a string because rows whose date could not be normalized are
/// kept as-is and only rejected when merged into the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedTransaction {
    pub id: String,
    pub date: String,
    pub description: String,
    pub amount: Money,
    pub kind: TransactionKind,
    pub category: String,
    #[serde(default)]
    pub status: ImportStatus,
    #[serde(default)]
    pub is_duplicate: bool,
    #[serde(default)]
    pub duplicate_of: Option<String>,
    pub source: String,
    #[serde(default)]
    pub card: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerTransaction {
    pub id: String,
    pub date: NaiveDate,
    pub description: String,
    pub amount: Money,
    pub kind: TransactionKind,
    pub category: String,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub card_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("Amount {amount} does not match a {kind} transaction")]
    SignMismatch { amount: Money, kind: TransactionKind },
}

impl LedgerTransaction {
    /// Promotes an approved staging row into a ledger record, enforcing the
    /// ISO date and the sign/kind agreement.
    pub fn from_staged(staged: &StagedTransaction) -> Result<LedgerTransaction, LedgerError> {
        let date = NaiveDate::parse_from_str(staged.date.trim(), "%Y-%m-%d")
            .map_err(|_| LedgerError::InvalidDate(staged.date.clone()))?;

        if !staged.kind.accepts(staged.amount) {
            return Err(LedgerError::SignMismatch {
                amount: staged.amount,
                kind: staged.kind,
            });
        }

        Ok(LedgerTransaction {
            id: staged.id.clone(),
            date,
            description: staged.description.clone(),
            amount: staged.amount,
            kind: staged.kind,
            category: staged.category.clone(),
            account_id: None,
            card_id: None,
        })
    }
}

/// One confirmed import, kept as history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportRecord {
    pub id: String,
    pub imported_at: DateTime<Utc>,
    pub source: String,
    pub total: usize,
    pub approved: usize,
    pub rejected: usize,
}
