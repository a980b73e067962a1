//! Twelve-month balance trajectory from recent cash flow.

use chrono::NaiveDate;
use finflow_core::{
    total_balance, Account, ForecastSettings, LedgerRepository, LedgerTransaction, Money, MonthKey,
};
use serde::Serialize;
use tracing::debug;

use crate::error::ForecastError;
use crate::monthly::aggregate;
use crate::stats::mean;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub month: MonthKey,
    /// Short label such as `Mar/2025`.
    pub label: String,
    pub income: Money,
    pub expense: Money,
    pub net: Money,
    pub balance: Money,
    pub savings: Money,
}

/// Historical totals for one month, as fed into the forecast.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthTotals {
    pub month: MonthKey,
    pub income: Money,
    pub expense: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastSummary {
    pub points: Vec<ForecastPoint>,
    pub avg_income: Money,
    pub avg_expense: Money,
    /// Expense slope per month over the averaging window.
    pub trend: Money,
    pub current_balance: Money,
    pub monthly: Vec<MonthTotals>,
}

#[derive(Debug, Clone, Default)]
pub struct ForecastEngine {
    settings: ForecastSettings,
}

impl ForecastEngine {
    pub fn new(settings: ForecastSettings) -> Self {
        Self { settings }
    }

    /// Projects `horizon_months` points starting the month after `today`.
    ///
    /// Income is held at the window average. Expense follows the window's
    /// linear trend but never drops below `expense_floor_ratio` of the
    /// average.
    pub fn compute(
        &self,
        transactions: &[LedgerTransaction],
        accounts: &[Account],
        today: NaiveDate,
    ) -> ForecastSummary {
        let monthly: Vec<MonthTotals> = aggregate(transactions)
            .into_iter()
            .map(|m| MonthTotals {
                month: m.month,
                income: m.income,
                expense: m.expense,
            })
            .collect();

        let window = &monthly[monthly.len().saturating_sub(self.settings.window_months)..];
        let incomes: Vec<f64> = window.iter().map(|m| m.income.to_f64()).collect();
        let expenses: Vec<f64> = window.iter().map(|m| m.expense.to_f64()).collect();
        let avg_income = mean(&incomes);
        let avg_expense = mean(&expenses);
        let trend = match (expenses.first(), expenses.last()) {
            (Some(first), Some(last)) if expenses.len() >= 2 => (last - first) / expenses.len() as f64,
            _ => 0.0,
        };

        let current_balance = total_balance(accounts);
        let start = MonthKey::from_date(today);
        let floor = avg_expense * self.settings.expense_floor_ratio;

        let mut balance = current_balance.to_f64();
        let points = (1..=self.settings.horizon_months)
            .map(|i| {
                let expense = (avg_expense + trend * i as f64).max(floor);
                let net = avg_income - expense;
                balance += net;
                let month = start.offset(i as i32);
                ForecastPoint {
                    month,
                    label: month.label(),
                    income: Money::from_f64(avg_income),
                    expense: Money::from_f64(expense),
                    net: Money::from_f64(net),
                    balance: Money::from_f64(balance),
                    savings: Money::from_f64(net.max(0.0)),
                }
            })
            .collect();

        debug!(
            months = monthly.len(),
            window = window.len(),
            avg_income,
            avg_expense,
            trend,
            "forecast computed"
        );

        ForecastSummary {
            points,
            avg_income: Money::from_f64(avg_income),
            avg_expense: Money::from_f64(avg_expense),
            trend: Money::from_f64(trend),
            current_balance,
            monthly,
        }
    }

    pub fn for_repository<R: LedgerRepository>(
        &self,
        repo: &R,
        today: NaiveDate,
    ) -> Result<ForecastSummary, ForecastError> {
        let transactions = repo.transactions()?;
        let accounts = repo.accounts()?;
        Ok(self.compute(&transactions, &accounts, today))
    }
}
