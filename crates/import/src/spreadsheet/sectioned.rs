//! Consolidated credit card statement exported by some banks as a single
//! sheet: a title row, owner details, a column header on row 4, then one
//! section per card, each closed by a subtotal row, and finally an expense
//! summary that repeats the totals and must not be read as transactions.
//!
//! Amounts follow card-statement convention: purchases are positive and
//! credits negative.

use finflow_core::{Money, StagedTransaction, TransactionKind};

use super::{is_blank_row, joined_lowercase, Matrix};
use crate::columns::DetectedRow;
use crate::normalize::{is_iso_date, normalize_date, parse_amount};
use crate::rules::Categorizer;

const TITLE_ROW: usize = 0;
const HEADER_ROW: usize = 3;
const TITLE_TOKENS: &[&str] = &["fatura", "cartão", "cartao", "card statement"];
const DATE_HEADERS: &[&str] = &["data", "date"];
const DESCRIPTION_HEADERS: &[&str] = &["descri", "lançamento", "lancamento", "histor", "estabelecimento"];
const AMOUNT_HEADERS: &[&str] = &["valor", "amount", "value"];
const SUMMARY_MARKERS: &[&str] = &["resumo de despesas", "expense summary"];

re!(re_card_section, r"(?i)\b(cart[aã]o|card)\b.*?\b(final|ending(?:\s+in)?)\s*(\d{4})\b");
re!(re_card_payment, r"(?i)pagamento.*fatura|payment.*(invoice|bill)");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Columns {
    date: usize,
    description: usize,
    amount: usize,
}

impl Columns {
    fn locate(header: &[String]) -> Option<Columns> {
        let lower: Vec<String> = header.iter().map(|h| h.trim().to_lowercase()).collect();
        let find = |tokens: &[&str], skip: Option<usize>| {
            lower
                .iter()
                .enumerate()
                .filter(|(i, _)| Some(*i) != skip)
                .find(|(_, h)| tokens.iter().any(|t| h.contains(t)))
                .map(|(i, _)| i)
        };

        let date = find(DATE_HEADERS, None)?;
        let description = find(DESCRIPTION_HEADERS, Some(date))?;
        let amount = find(AMOUNT_HEADERS, None).unwrap_or(lower.len().saturating_sub(1));
        Some(Columns {
            date,
            description,
            amount,
        })
    }
}

/// A card-statement title on row 1, a usable header on row 4, and at least
/// one card section announced below it. Plain account statements never match,
/// since this layout reverses the sign convention.
pub fn is_sectioned_statement(matrix: &Matrix) -> bool {
    let titled = matrix.get(TITLE_ROW).is_some_and(|row| {
        let text = joined_lowercase(row);
        TITLE_TOKENS.iter().any(|t| text.contains(t))
    });
    titled
        && matrix.get(HEADER_ROW).and_then(|h| Columns::locate(h)).is_some()
        && matrix.iter().skip(HEADER_ROW + 1).any(|row| card_label(row).is_some())
}

pub fn extract(matrix: &Matrix, source: &str, categorizer: &Categorizer) -> Vec<StagedTransaction> {
    let Some(columns) = matrix.get(HEADER_ROW).and_then(|h| Columns::locate(h)) else {
        return Vec::new();
    };
    let mut card: Option<String> = None;
    let mut rows = Vec::new();

    for row in matrix.iter().skip(HEADER_ROW + 1) {
        if is_blank_row(row) {
            continue;
        }
        let text = joined_lowercase(row);
        if SUMMARY_MARKERS.iter().any(|m| text.contains(m)) {
            break;
        }
        if is_subtotal(row) {
            continue;
        }

        let date = normalize_date(&cell(row, columns.date));
        if !is_iso_date(&date) {
            if let Some(label) = card_label(row) {
                card = Some(label);
            }
            continue;
        }

        let description = cell(row, columns.description);
        let value = parse_amount(&cell(row, columns.amount));
        if description.is_empty() || value.is_zero() {
            continue;
        }

        let (amount, kind) = classify(&description, value);
        let detected = DetectedRow {
            date,
            description,
            amount,
            kind,
        };
        rows.push(detected.into_staged(categorizer, source, card.clone()));
    }
    rows
}

fn classify(description: &str, value: Money) -> (Money, TransactionKind) {
    if re_card_payment().is_match(description) {
        (-value.abs(), TransactionKind::CardPayment)
    } else if value.is_positive() {
        (-value, TransactionKind::Expense)
    } else {
        (value.abs(), TransactionKind::Income)
    }
}

fn cell(row: &[String], index: usize) -> String {
    row.get(index).map(|c| c.trim()).unwrap_or_default().to_string()
}

fn is_subtotal(row: &[String]) -> bool {
    row.iter().any(|cell| {
        let cell = cell.trim().to_lowercase();
        cell == "subtotal" || cell == "total" || cell.starts_with("subtotal")
    })
}

fn card_label(row: &[String]) -> Option<String> {
    row.iter()
        .map(|cell| cell.trim())
        .find(|cell| re_card_section().is_match(cell))
        .map(str::to_string)
}
