use finflow_core::{Account, Card, CategoryBudget, ImportRecord, InMemoryLedger, LedgerTransaction};
use serde::{Deserialize, Serialize};

/// Everything the app persists, as one JSON document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub transactions: Vec<LedgerTransaction>,
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(default)]
    pub categories: Vec<CategoryBudget>,
    /// Newest first.
    #[serde(default)]
    pub import_history: Vec<ImportRecord>,
    #[serde(default)]
    pub is_sample_data: bool,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
            && self.accounts.is_empty()
            && self.cards.is_empty()
            && self.categories.is_empty()
            && self.import_history.is_empty()
    }

    pub fn to_ledger(&self) -> InMemoryLedger {
        InMemoryLedger {
            transactions: self.transactions.clone(),
            accounts: self.accounts.clone(),
            categories: self.categories.clone(),
            import_history: self.import_history.clone(),
        }
    }
}
