use finflow_core::{LedgerError, Money, RepositoryError, TransactionKind};
use thiserror::Error;

/// Expected-column hint shown when a header-based file yields nothing.
pub const EXPECTED_COLUMNS_HINT: &str =
    "expected a header row with date (data/date), description (descrição/description) and amount (valor/amount or crédito/débito) columns";

/// Fatal, file-level ingestion failures. Rows that merely fail to parse are
/// skipped and never reach this type.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
    #[error("No transactions found in statement")]
    NoTransactions,
    #[error("No valid rows found; {hint}")]
    NoRows { hint: &'static str },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),
    #[error("Workbook has no worksheets")]
    EmptyWorkbook,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ImportError {
    pub(crate) fn no_rows() -> Self {
        ImportError::NoRows {
            hint: EXPECTED_COLUMNS_HINT,
        }
    }
}

/// Failures while merging approved staging rows into the ledger.
#[derive(Error, Debug)]
pub enum MergeError {
    #[error("No approved transactions to import")]
    NothingApproved,
    #[error("Transaction {id} has invalid date '{date}'")]
    InvalidDate { id: String, date: String },
    #[error("Transaction {id}: amount {amount} does not match kind {kind}")]
    SignMismatch {
        id: String,
        amount: Money,
        kind: TransactionKind,
    },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl MergeError {
    pub(crate) fn from_ledger(id: &str, err: LedgerError) -> Self {
        match err {
            LedgerError::InvalidDate(date) => MergeError::InvalidDate {
                id: id.to_string(),
                date,
            },
            LedgerError::SignMismatch { amount, kind } => MergeError::SignMismatch {
                id: id.to_string(),
                amount,
                kind,
            },
        }
    }
}
