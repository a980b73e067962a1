//! The review step between parsing and the ledger. A batch can accumulate
//! several files; every addition re-runs duplicate detection across the whole
//! batch so a row repeated in two files is caught too.

use chrono::{DateTime, Utc};
use finflow_core::{
    ImportRecord, ImportStatus, LedgerRepository, LedgerTransaction, StagedTransaction,
};
use tracing::info;
use uuid::Uuid;

use crate::dedup::detect_duplicates;
use crate::error::MergeError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub duplicates: usize,
}

/// Approved rows ready to be written, plus the history entry describing them.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmedImport {
    pub transactions: Vec<LedgerTransaction>,
    pub record: ImportRecord,
}

#[derive(Debug, Clone, Default)]
pub struct StagingBatch {
    items: Vec<StagedTransaction>,
}

impl StagingBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[StagedTransaction] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Appends freshly parsed rows and re-flags duplicates across the batch.
    pub fn extend_with(&mut self, rows: Vec<StagedTransaction>, ledger: &[LedgerTransaction]) {
        let mut all = std::mem::take(&mut self.items);
        all.extend(rows);
        self.items = detect_duplicates(all, ledger);
    }

    pub fn approve_all(&mut self) {
        self.set_pending(ImportStatus::Approved);
    }

    pub fn reject_all(&mut self) {
        self.set_pending(ImportStatus::Rejected);
    }

    fn set_pending(&mut self, status: ImportStatus) {
        self.items
            .iter_mut()
            .filter(|tx| tx.status == ImportStatus::Pending)
            .for_each(|tx| tx.status = status);
    }

    /// Returns false when no row has this id.
    pub fn set_status(&mut self, id: &str, status: ImportStatus) -> bool {
        self.find_mut(id).map(|tx| tx.status = status).is_some()
    }

    pub fn set_category(&mut self, id: &str, category: &str) -> bool {
        self.find_mut(id)
            .map(|tx| tx.category = category.to_string())
            .is_some()
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut StagedTransaction> {
        self.items.iter_mut().find(|tx| tx.id == id)
    }

    pub fn counts(&self) -> StatusCounts {
        self.items.iter().fold(StatusCounts::default(), |mut c, tx| {
            match tx.status {
                ImportStatus::Pending => c.pending += 1,
                ImportStatus::Approved => c.approved += 1,
                ImportStatus::Rejected => c.rejected += 1,
            }
            if tx.is_duplicate {
                c.duplicates += 1;
            }
            c
        })
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Validates every approved row and builds the ledger records without
    /// touching the batch. One invalid row fails the whole merge.
    pub fn prepare(&self, now: DateTime<Utc>) -> Result<ConfirmedImport, MergeError> {
        let approved: Vec<&StagedTransaction> = self
            .items
            .iter()
            .filter(|tx| tx.status == ImportStatus::Approved)
            .collect();
        let Some(first) = approved.first() else {
            return Err(MergeError::NothingApproved);
        };

        let transactions = approved
            .iter()
            .map(|tx| {
                LedgerTransaction::from_staged(tx).map_err(|e| MergeError::from_ledger(&tx.id, e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let counts = self.counts();
        let record = ImportRecord {
            id: Uuid::new_v4().to_string(),
            imported_at: now,
            source: first.source.clone(),
            total: self.items.len(),
            approved: counts.approved,
            rejected: counts.rejected,
        };

        Ok(ConfirmedImport {
            transactions,
            record,
        })
    }

    /// Like [`prepare`](Self::prepare), then empties the batch.
    pub fn confirm(&mut self, now: DateTime<Utc>) -> Result<ConfirmedImport, MergeError> {
        let confirmed = self.prepare(now)?;
        self.clear();
        Ok(confirmed)
    }

    /// Writes the approved rows and the history entry to `repo`. The batch is
    /// kept if validation or the write fails.
    pub fn commit<R: LedgerRepository>(
        &mut self,
        repo: &mut R,
        now: DateTime<Utc>,
    ) -> Result<ImportRecord, MergeError> {
        let ConfirmedImport {
            transactions,
            record,
        } = self.prepare(now)?;
        let count = transactions.len();

        repo.append_transactions(transactions)?;
        repo.record_import(record.clone())?;
        self.clear();

        info!(source = %record.source, imported = count, rejected = record.rejected, "import merged into ledger");
        Ok(record)
    }
}
