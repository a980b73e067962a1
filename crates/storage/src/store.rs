use finflow_core::{
    Account, CategoryBudget, ImportRecord, LedgerRepository, LedgerTransaction, RepositoryError,
};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::backup::{export_backup, import_backup};
use crate::error::StorageError;
use crate::snapshot::Snapshot;

const SNAPSHOT_FILE: &str = "finflow.json";
const API_KEY_FILE: &str = "api_key";

/// Platform data directory, e.g. `~/.local/share/finflow` on Linux.
pub fn default_data_dir() -> Result<PathBuf, StorageError> {
    directories::ProjectDirs::from("app", "finflow", "FinFlow")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or(StorageError::NoDataDir)
}

/// A snapshot held in memory and written through to `<dir>/finflow.json`
/// on every change.
pub struct SnapshotStore {
    dir: PathBuf,
    snapshot: Snapshot,
}

impl SnapshotStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        let snapshot = read_snapshot(&dir.join(SNAPSHOT_FILE))?;
        debug!(
            dir = %dir.display(),
            transactions = snapshot.transactions.len(),
            "snapshot loaded"
        );
        Ok(Self { dir, snapshot })
    }

    pub fn open_default() -> Result<Self, StorageError> {
        Self::open(default_data_dir()?)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn save(&self) -> Result<(), StorageError> {
        write_atomic(&self.dir.join(SNAPSHOT_FILE), &serde_json::to_vec_pretty(&self.snapshot)?)?;
        debug!(transactions = self.snapshot.transactions.len(), "snapshot saved");
        Ok(())
    }

    pub fn replace(&mut self, snapshot: Snapshot) -> Result<(), StorageError> {
        self.snapshot = snapshot;
        self.save()
    }

    /// Applies `change` to the snapshot and saves it.
    pub fn update<F>(&mut self, change: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut Snapshot),
    {
        change(&mut self.snapshot);
        self.save()
    }

    /// Drops all data, including the sample-data flag. The API key is kept.
    pub fn clear(&mut self) -> Result<(), StorageError> {
        info!("clearing stored ledger");
        self.replace(Snapshot::default())
    }

    pub fn export_backup(&self) -> Result<Vec<u8>, StorageError> {
        export_backup(&self.snapshot)
    }

    /// Replaces the current data with a backup. Nothing changes if the backup is invalid.
    pub fn restore_backup(&mut self, bytes: &[u8]) -> Result<(), StorageError> {
        let snapshot = import_backup(bytes)?;
        info!(transactions = snapshot.transactions.len(), "restoring backup");
        self.replace(snapshot)
    }

    // ── API key ───────────────────────────────────────────────────────────────

    pub fn api_key(&self) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.dir.join(API_KEY_FILE)) {
            Ok(text) => {
                let key = text.trim();
                Ok((!key.is_empty()).then(|| key.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn set_api_key(&self, key: &str) -> Result<(), StorageError> {
        write_atomic(&self.dir.join(API_KEY_FILE), key.trim().as_bytes())
    }

    pub fn clear_api_key(&self) -> Result<(), StorageError> {
        match fs::remove_file(self.dir.join(API_KEY_FILE)) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

fn read_snapshot(path: &Path) -> Result<Snapshot, StorageError> {
    if !path.exists() {
        return Ok(Snapshot::default());
    }
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Writes to a temp file beside `path` and renames it into place.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let temp = path.with_extension("tmp");
    let mut writer = BufWriter::new(File::create(&temp)?);
    writer.write_all(bytes)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    drop(writer);

    if let Err(e) = fs::rename(&temp, path) {
        let _ = fs::remove_file(&temp);
        return Err(e.into());
    }
    Ok(())
}

fn write_rejected(e: StorageError) -> RepositoryError {
    RepositoryError::WriteRejected(e.to_string())
}

impl LedgerRepository for SnapshotStore {
    fn transactions(&self) -> Result<Vec<LedgerTransaction>, RepositoryError> {
        Ok(self.snapshot.transactions.clone())
    }

    fn accounts(&self) -> Result<Vec<Account>, RepositoryError> {
        Ok(self.snapshot.accounts.clone())
    }

    fn category_budgets(&self) -> Result<Vec<CategoryBudget>, RepositoryError> {
        Ok(self.snapshot.categories.clone())
    }

    fn append_transactions(&mut self, transactions: Vec<LedgerTransaction>) -> Result<(), RepositoryError> {
        let added = transactions.len();
        let before = self.snapshot.transactions.len();
        self.snapshot.transactions.extend(transactions);
        if let Err(e) = self.save() {
            self.snapshot.transactions.truncate(before);
            return Err(write_rejected(e));
        }
        debug!(added, "transactions appended");
        Ok(())
    }

    fn record_import(&mut self, record: ImportRecord) -> Result<(), RepositoryError> {
        self.snapshot.import_history.insert(0, record);
        if let Err(e) = self.save() {
            self.snapshot.import_history.remove(0);
            return Err(write_rejected(e));
        }
        Ok(())
    }
}
