use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid backup: {0}")]
    InvalidBackup(String),
    #[error("Could not determine a data directory for this platform")]
    NoDataDir,
}
