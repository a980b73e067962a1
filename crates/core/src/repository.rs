use thiserror::Error;

use crate::account::Account;
use crate::category::CategoryBudget;
use crate::transaction::{ImportRecord, LedgerTransaction};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Repository unavailable: {0}")]
    Unavailable(String),
    #[error("Write rejected: {0}")]
    WriteRejected(String),
}

/// Read/write access to the persisted ledger.
///
/// The import and prediction orchestrators take one of these instead of
/// holding data themselves; the implementation owns persistence lifecycle.
pub trait LedgerRepository {
    fn transactions(&self) -> Result<Vec<LedgerTransaction>, RepositoryError>;
    fn accounts(&self) -> Result<Vec<Account>, RepositoryError>;
    fn category_budgets(&self) -> Result<Vec<CategoryBudget>, RepositoryError>;
    fn append_transactions(&mut self, transactions: Vec<LedgerTransaction>) -> Result<(), RepositoryError>;
    fn record_import(&mut self, record: ImportRecord) -> Result<(), RepositoryError>;
}

/// Repository over data the host already holds in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    pub transactions: Vec<LedgerTransaction>,
    pub accounts: Vec<Account>,
    pub categories: Vec<CategoryBudget>,
    pub import_history: Vec<ImportRecord>,
}

impl InMemoryLedger {
    pub fn new(transactions: Vec<LedgerTransaction>) -> Self {
        InMemoryLedger {
            transactions,
            ..Default::default()
        }
    }
}

impl LedgerRepository for InMemoryLedger {
    fn transactions(&self) -> Result<Vec<LedgerTransaction>, RepositoryError> {
        Ok(self.transactions.clone())
    }

    fn accounts(&self) -> Result<Vec<Account>, RepositoryError> {
        Ok(self.accounts.clone())
    }

    fn category_budgets(&self) -> Result<Vec<CategoryBudget>, RepositoryError> {
        Ok(self.categories.clone())
    }

    fn append_transactions(&mut self, transactions: Vec<LedgerTransaction>) -> Result<(), RepositoryError> {
        self.transactions.extend(transactions);
        Ok(())
    }

    fn record_import(&mut self, record: ImportRecord) -> Result<(), RepositoryError> {
        // Newest first.
        self.import_history.insert(0, record);
        Ok(())
    }
}
