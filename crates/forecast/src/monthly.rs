use finflow_core::{LedgerTransaction, Money, MonthKey, TransactionKind};
use serde::Serialize;
use std::collections::BTreeMap;

/// Cash-flow totals of one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyAggregate<'a> {
    pub month: MonthKey,
    pub income: Money,
    pub expense: Money,
    #[serde(skip)]
    pub transactions: Vec<&'a LedgerTransaction>,
}

impl MonthlyAggregate<'_> {
    pub fn net(&self) -> Money {
        self.income - self.expense
    }
}

/// Groups income and expense transactions by month, oldest first. Transfers
/// and card payments are left out. Income keeps its sign; expenses add up
/// as absolute values.
pub fn aggregate(transactions: &[LedgerTransaction]) -> Vec<MonthlyAggregate<'_>> {
    let mut months: BTreeMap<MonthKey, MonthlyAggregate<'_>> = BTreeMap::new();
    for tx in transactions.iter().filter(|tx| tx.kind.counts_toward_cash_flow()) {
        let month = MonthKey::from_date(tx.date);
        let entry = months.entry(month).or_insert_with(|| MonthlyAggregate {
            month,
            income: Money::zero(),
            expense: Money::zero(),
            transactions: Vec::new(),
        });
        match tx.kind {
            TransactionKind::Income => entry.income += tx.amount,
            _ => entry.expense += tx.amount.abs(),
        }
        entry.transactions.push(tx);
    }
    months.into_values().collect()
}

/// Transactions of one category and kind, sorted by date.
pub fn category_history<'a>(
    transactions: &'a [LedgerTransaction],
    category: &str,
    kind: TransactionKind,
) -> Vec<&'a LedgerTransaction> {
    let mut history: Vec<&LedgerTransaction> = transactions
        .iter()
        .filter(|tx| tx.kind == kind && tx.kind != TransactionKind::Transfer && tx.category == category)
        .collect();
    history.sort_by_key(|tx| tx.date);
    history
}

/// Buckets an already sorted history by month.
pub fn by_month<'a>(
    history: &[&'a LedgerTransaction],
) -> BTreeMap<MonthKey, Vec<&'a LedgerTransaction>> {
    let mut months: BTreeMap<MonthKey, Vec<&LedgerTransaction>> = BTreeMap::new();
    for tx in history {
        months.entry(MonthKey::from_date(tx.date)).or_default().push(*tx);
    }
    months
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::NaiveDate;
    use finflow_core::{LedgerTransaction, Money, TransactionKind};

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Expense in `category`; `amount` is given as a positive figure.
    pub fn expense(category: &str, on: NaiveDate, amount: f64) -> LedgerTransaction {
        tx(category, on, -amount, TransactionKind::Expense)
    }

    pub fn income(category: &str, on: NaiveDate, amount: f64) -> LedgerTransaction {
        tx(category, on, amount, TransactionKind::Income)
    }

    pub fn tx(category: &str, on: NaiveDate, amount: f64, kind: TransactionKind) -> LedgerTransaction {
        LedgerTransaction {
            id: format!("{category}-{on}-{amount}"),
            date: on,
            description: category.to_string(),
            amount: Money::from_f64(amount),
            kind,
            category: category.to_string(),
            account_id: None,
            card_id: None,
        }
    }
}
