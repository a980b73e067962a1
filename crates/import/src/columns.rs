//! Column detection for header-based layouts (delimited text and generic
//! spreadsheets).
//!
//! Each field is located by an ordered table of probes. The first probe
//! that yields a value wins, so each table reads top to bottom as its
//! priority order and every entry can be exercised on its own.

use finflow_core::{ImportStatus, Money, StagedTransaction, TransactionKind};
use std::collections::HashMap;
use uuid::Uuid;

use crate::normalize::{normalize_date, parse_amount};
use crate::rules::Categorizer;

/// One row keyed by lower-cased, trimmed header, built once and then only queried.
#[derive(Debug, Clone, Default)]
pub struct RowLookup {
    headers: Vec<String>,
    values: HashMap<String, String>,
}

impl RowLookup {
    /// Builds the lookup from `(header, value)` pairs. Blank headers are
    /// dropped; when a header repeats, its first column is kept.
    pub fn new<I, H, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (H, V)>,
        H: AsRef<str>,
        V: AsRef<str>,
    {
        let mut lookup = RowLookup::default();
        for (header, value) in pairs {
            let key = header.as_ref().trim().to_lowercase();
            if key.is_empty() || lookup.values.contains_key(&key) {
                continue;
            }
            lookup.values.insert(key.clone(), value.as_ref().trim().to_string());
            lookup.headers.push(key);
        }
        lookup
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Value under `key`, if present and non-empty.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// How a field's column is located.
#[derive(Debug, Clone, Copy)]
pub enum Probe {
    /// The first of these exact header names holding a non-empty value.
    Named(&'static [&'static str]),
    /// The first header, in column order, containing any of these fragments.
    Containing(&'static [&'static str]),
}

impl Probe {
    pub fn find<'r>(&self, row: &'r RowLookup) -> Option<&'r str> {
        match self {
            Probe::Named(names) => names.iter().find_map(|name| row.get(name)),
            Probe::Containing(fragments) => row
                .headers()
                .iter()
                .find(|h| fragments.iter().any(|f| h.contains(f)))
                .and_then(|h| row.get(h)),
        }
    }
}

/// How an amount column's value turns into a signed amount and kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountRule {
    /// Credit column: a nonzero value is income.
    Credit,
    /// Debit column: a nonzero value is an expense, forced negative.
    Debit,
    /// Single amount column: the sign decides.
    Signed,
}

#[derive(Debug, Clone, Copy)]
pub struct AmountStrategy {
    pub rule: AmountRule,
    pub probe: Probe,
}

impl AmountStrategy {
    pub fn apply(&self, row: &RowLookup) -> Option<(Money, TransactionKind)> {
        match self.rule {
            AmountRule::Credit => self
                .nonzero(row)
                .map(|amount| (amount.abs(), TransactionKind::Income)),
            AmountRule::Debit => self
                .nonzero(row)
                .map(|amount| (-amount.abs(), TransactionKind::Expense)),
            AmountRule::Signed => self.probe.find(row).map(|raw| {
                let amount = parse_amount(raw);
                (amount, TransactionKind::from_amount(amount))
            }),
        }
    }

    /// Credit/debit columns are often present with `0,00` on the other side,
    /// so a zero does not claim the row.
    fn nonzero(&self, row: &RowLookup) -> Option<Money> {
        let names: &[&str] = match self.probe {
            Probe::Named(names) => names,
            Probe::Containing(_) => {
                return self.probe.find(row).map(parse_amount).filter(|a| !a.is_zero())
            }
        };
        names
            .iter()
            .filter_map(|name| row.get(name))
            .map(parse_amount)
            .find(|amount| !amount.is_zero())
    }
}

pub const DATE_PROBES: &[Probe] = &[
    Probe::Named(&[
        "data",
        "date",
        "dt",
        "data lançamento",
        "data lancamento",
        "data transação",
        "data da compra",
        "data compra",
    ]),
    Probe::Containing(&["data", "date"]),
];

pub const DESCRIPTION_PROBES: &[Probe] = &[
    Probe::Named(&[
        "title",
        "titulo",
        "título",
        "descricao",
        "descrição",
        "description",
        "historico",
        "histórico",
        "lançamento",
        "lancamento",
        "memo",
        "name",
        "estabelecimento",
    ]),
    Probe::Containing(&["descri", "histor", "title", "lanc", "memo"]),
];

pub const AMOUNT_STRATEGIES: &[AmountStrategy] = &[
    AmountStrategy {
        rule: AmountRule::Credit,
        probe: Probe::Named(&["credito", "crédito", "credit", "valor credito", "entrada"]),
    },
    AmountStrategy {
        rule: AmountRule::Debit,
        probe: Probe::Named(&["debito", "débito", "debit", "valor debito", "saída", "saida"]),
    },
    AmountStrategy {
        rule: AmountRule::Signed,
        probe: Probe::Named(&["amount", "valor", "value", "quantia", "total"]),
    },
    AmountStrategy {
        rule: AmountRule::Signed,
        probe: Probe::Containing(&["valor", "amount", "value"]),
    },
];

/// Fields recovered from one row.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedRow {
    pub date: String,
    pub description: String,
    pub amount: Money,
    pub kind: TransactionKind,
}

impl DetectedRow {
    /// Turns the row into a pending staging entry with a fresh id.
    pub fn into_staged(
        self,
        categorizer: &Categorizer,
        source: &str,
        card: Option<String>,
    ) -> StagedTransaction {
        let category = categorizer.categorize(&self.description).to_string();
        StagedTransaction {
            id: Uuid::new_v4().to_string(),
            date: self.date,
            description: self.description,
            amount: self.amount,
            kind: self.kind,
            category,
            status: ImportStatus::Pending,
            is_duplicate: false,
            duplicate_of: None,
            source: source.to_string(),
            card,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnDetector {
    pub date: &'static [Probe],
    pub description: &'static [Probe],
    pub amount: &'static [AmountStrategy],
}

impl Default for ColumnDetector {
    fn default() -> Self {
        Self {
            date: DATE_PROBES,
            description: DESCRIPTION_PROBES,
            amount: AMOUNT_STRATEGIES,
        }
    }
}

impl ColumnDetector {
    /// Returns `None` for rows without a date or description, or with a zero amount.
    pub fn detect(&self, row: &RowLookup) -> Option<DetectedRow> {
        let date = first_match(self.date, row).map(normalize_date)?;
        if date.is_empty() {
            return None;
        }
        let description = first_match(self.description, row)?.to_string();

        let (amount, kind) = self
            .amount
            .iter()
            .find_map(|strategy| strategy.apply(row))
            .unwrap_or((Money::zero(), TransactionKind::Expense));
        if amount.is_zero() {
            return None;
        }

        Some(DetectedRow {
            date,
            description,
            amount,
            kind,
        })
    }
}

fn first_match<'r>(probes: &[Probe], row: &'r RowLookup) -> Option<&'r str> {
    probes.iter().find_map(|probe| probe.find(row))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> RowLookup {
        RowLookup::new(pairs.iter().copied())
    }

    // ── RowLookup ─────────────────────────────────────────────────────────────

    #[test]
    fn lookup_lowercases_and_trims_headers() {
        let r = row(&[(" Data ", "15/01/2024"), ("HISTÓRICO", " Uber ")]);
        assert_eq!(r.headers(), &["data".to_string(), "histórico".to_string()]);
        assert_eq!(r.get("histórico"), Some("Uber"));
    }

    #[test]
    fn lookup_hides_empty_values() {
        let r = row(&[("credit", "  ")]);
        assert_eq!(r.get("credit"), None);
    }

    #[test]
    fn lookup_keeps_first_duplicate_header() {
        let r = row(&[("valor", "1,00"), ("Valor", "2,00")]);
        assert_eq!(r.get("valor"), Some("1,00"));
        assert_eq!(r.headers().len(), 1);
    }

    // ── probes ────────────────────────────────────────────────────────────────

    #[test]
    fn named_probe_respects_name_order() {
        let r = row(&[("name", "second"), ("description", "first")]);
        assert_eq!(DESCRIPTION_PROBES[0].find(&r), Some("first"));
    }

    #[test]
    fn containing_probe_uses_column_order() {
        let r = row(&[("data do lançamento", "01/02/2024"), ("data valor", "03/02/2024")]);
        assert_eq!(DATE_PROBES[0].find(&r), None);
        assert_eq!(DATE_PROBES[1].find(&r), Some("01/02/2024"));
    }

    // ── amount strategies ─────────────────────────────────────────────────────

    #[test]
    fn credit_strategy_skips_zero_values() {
        let r = row(&[("credito", "0,00"), ("entrada", "10,00")]);
        assert_eq!(
            AMOUNT_STRATEGIES[0].apply(&r),
            Some((Money::from_cents(1000), TransactionKind::Income))
        );
    }

    #[test]
    fn debit_strategy_forces_negative() {
        let r = row(&[("debit", "150,00")]);
        assert_eq!(
            AMOUNT_STRATEGIES[1].apply(&r),
            Some((Money::from_cents(-15000), TransactionKind::Expense))
        );
        let r = row(&[("debit", "-150,00")]);
        assert_eq!(AMOUNT_STRATEGIES[1].apply(&r).map(|(a, _)| a), Some(Money::from_cents(-15000)));
    }

    #[test]
    fn signed_strategy_reads_sign() {
        let r = row(&[("amount", "-12.50")]);
        assert_eq!(
            AMOUNT_STRATEGIES[2].apply(&r),
            Some((Money::from_cents(-1250), TransactionKind::Expense))
        );
        let r = row(&[("valor (r$)", "3.000,00")]);
        assert_eq!(AMOUNT_STRATEGIES[2].apply(&r), None);
        assert_eq!(
            AMOUNT_STRATEGIES[3].apply(&r),
            Some((Money::from_cents(300000), TransactionKind::Income))
        );
    }

    // ── ColumnDetector ────────────────────────────────────────────────────────

    #[test]
    fn detects_debit_row_with_empty_credit() {
        let r = row(&[
            ("data", "05/03/2024"),
            ("descrição", "Posto Shell"),
            ("crédito", ""),
            ("débito", "150,00"),
        ]);
        let detected = ColumnDetector::default().detect(&r).unwrap();
        assert_eq!(detected.date, "2024-03-05");
        assert_eq!(detected.description, "Posto Shell");
        assert_eq!(detected.amount, Money::from_cents(-15000));
        assert_eq!(detected.kind, TransactionKind::Expense);
    }

    #[test]
    fn credit_wins_over_debit() {
        let r = row(&[
            ("date", "2024-03-05"),
            ("description", "Salary"),
            ("credit", "5000.00"),
            ("debit", "12.00"),
        ]);
        let detected = ColumnDetector::default().detect(&r).unwrap();
        assert_eq!(detected.kind, TransactionKind::Income);
        assert_eq!(detected.amount, Money::from_cents(500000));
    }

    #[test]
    fn falls_back_to_substring_headers() {
        let r = row(&[
            ("posting date", "2024-03-05"),
            ("transaction description", "Coffee"),
            ("amount usd", "-4.50"),
        ]);
        let detected = ColumnDetector::default().detect(&r).unwrap();
        assert_eq!(detected.date, "2024-03-05");
        assert_eq!(detected.description, "Coffee");
        assert_eq!(detected.amount, Money::from_cents(-450));
    }

    #[test]
    fn rows_without_date_or_description_are_discarded() {
        let detector = ColumnDetector::default();
        assert!(detector.detect(&row(&[("description", "x"), ("amount", "1")])).is_none());
        assert!(detector.detect(&row(&[("date", "2024-01-01"), ("amount", "1")])).is_none());
    }

    #[test]
    fn zero_amount_rows_are_discarded() {
        let detector = ColumnDetector::default();
        let r = row(&[("date", "2024-01-01"), ("description", "Balance"), ("amount", "0,00")]);
        assert!(detector.detect(&r).is_none());
        let r = row(&[("date", "2024-01-01"), ("description", "No amount column")]);
        assert!(detector.detect(&r).is_none());
    }
}
