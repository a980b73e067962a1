//! JSON snapshot persistence for the ledger, with gzip backups and a
//! separately stored scan-service credential.

pub mod backup;
pub mod error;
pub mod snapshot;
pub mod store;

pub use backup::{export_backup, import_backup};
pub use error::StorageError;
pub use snapshot::Snapshot;
pub use store::{default_data_dir, SnapshotStore};
