use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::money::Money;
use crate::period::MonthKey;
use crate::transaction::TransactionKind;

/// Category assigned when nothing else matches.
pub const OTHER_CATEGORY: &str = "other";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    #[default]
    Expense,
    Income,
}

impl CategoryKind {
    pub fn transaction_kind(self) -> TransactionKind {
        match self {
            CategoryKind::Expense => TransactionKind::Expense,
            CategoryKind::Income => TransactionKind::Income,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BudgetPlan {
    /// Same target every month.
    MonthlyFixed { amount: Money },
    /// A target per month number (1-12); months without an entry have no budget.
    AnnualVariable { by_month: BTreeMap<u32, Money> },
}

impl Default for BudgetPlan {
    fn default() -> Self {
        BudgetPlan::MonthlyFixed { amount: Money::zero() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBudget {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub kind: CategoryKind,
    #[serde(default)]
    pub plan: BudgetPlan,
}

impl CategoryBudget {
    pub fn monthly(id: &str, kind: CategoryKind, amount: Money) -> Self {
        CategoryBudget {
            id: id.to_string(),
            name: id.to_string(),
            kind,
            plan: BudgetPlan::MonthlyFixed { amount },
        }
    }

    pub fn amount_for(&self, month: MonthKey) -> Money {
        match &self.plan {
            BudgetPlan::MonthlyFixed { amount } => *amount,
            BudgetPlan::AnnualVariable { by_month } => {
                by_month.get(&month.month).copied().unwrap_or_default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month(m: u32) -> MonthKey {
        MonthKey::new(2024, m).unwrap()
    }

    #[test]
    fn monthly_fixed_is_the_same_every_month() {
        let budget = CategoryBudget::monthly("food", CategoryKind::Expense, Money::from_cents(150_000));
        assert_eq!(budget.amount_for(month(1)), Money::from_cents(150_000));
        assert_eq!(budget.amount_for(month(12)), Money::from_cents(150_000));
    }

    #[test]
    fn annual_variable_looks_up_month_number() {
        let budget = CategoryBudget {
            id: "education".to_string(),
            name: "Education".to_string(),
            kind: CategoryKind::Expense,
            plan: BudgetPlan::AnnualVariable {
                by_month: BTreeMap::from([(2, Money::from_cents(120_000)), (8, Money::from_cents(90_000))]),
            },
        };
        assert_eq!(budget.amount_for(month(2)), Money::from_cents(120_000));
        assert_eq!(budget.amount_for(month(3)), Money::zero());
    }

    #[test]
    fn plan_deserializes_from_tagged_json() {
        let json = r#"{"id":"salary","kind":"income","plan":{"type":"monthly_fixed","amount":5000}}"#;
        let budget: CategoryBudget = serde_json::from_str(json).unwrap();
        assert_eq!(budget.kind, CategoryKind::Income);
        assert_eq!(budget.amount_for(month(6)), Money::from_cents(500_000));
    }
}
