pub mod account;
pub mod category;
pub mod config;
pub mod money;
pub mod period;
pub mod repository;
pub mod transaction;

pub use account::{total_balance, Account, AccountType, Card};
pub use category::{BudgetPlan, CategoryBudget, CategoryKind, OTHER_CATEGORY};
pub use config::{ConfigError, EngineConfig, ForecastSettings, MonthEndSettings, PatternThresholds};
pub use money::Money;
pub use period::MonthKey;
pub use repository::{InMemoryLedger, LedgerRepository, RepositoryError};
pub use transaction::{
    ImportRecord, ImportStatus, LedgerError, LedgerTransaction, StagedTransaction, TransactionKind,
};
