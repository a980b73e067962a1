use serde::{Deserialize, Serialize};
use std::fmt;

use crate::money::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    #[default]
    Checking,
    Savings,
    Investment,
    Other,
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountType::Checking => write!(f, "Checking"),
            AccountType::Savings => write!(f, "Savings"),
            AccountType::Investment => write!(f, "Investment"),
            AccountType::Other => write!(f, "Other"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub account_type: AccountType,
    pub balance: Money,
}

impl Account {
    pub fn new(id: &str, name: &str, account_type: AccountType, balance: Money) -> Self {
        Account {
            id: id.to_string(),
            name: name.to_string(),
            account_type,
            balance,
        }
    }
}

/// A payment card. `label` is the text a statement uses to announce the
/// card's section, e.g. `Card ending 1234`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub name: String,
    pub label: Option<String>,
    #[serde(default)]
    pub balance: Money,
}

/// Sum of the balances used to seed the forecast trajectory.
pub fn total_balance(accounts: &[Account]) -> Money {
    accounts.iter().map(|a| a.balance).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_balance_sums_all_accounts() {
        let accounts = vec![
            Account::new("1", "Checking", AccountType::Checking, Money::from_cents(452_387)),
            Account::new("2", "Brokerage", AccountType::Investment, Money::from_cents(4_500_000)),
        ];
        assert_eq!(total_balance(&accounts), Money::from_cents(4_952_387));
        assert_eq!(total_balance(&[]), Money::zero());
    }

    #[test]
    fn account_type_serializes_snake_case() {
        let json = serde_json::to_string(&AccountType::Investment).unwrap();
        assert_eq!(json, "\"investment\"");
    }
}
