use finflow_core::{LedgerTransaction, Money, StagedTransaction};
use std::collections::{HashMap, HashSet};

use crate::normalize::canonical_text;

pub const WITHIN_FILE_REFERENCE: &str = "Duplicate within file";

/// Exact-match key: date, canonical description and absolute amount.
pub fn fingerprint(date: &str, description: &str, amount: Money) -> String {
    format!("{}|{}|{:.2}", date.trim(), canonical_text(description), amount.abs())
}

/// Flags staged rows that repeat a ledger entry or an earlier row of the
/// same batch.
#[derive(Debug, Clone, Default)]
pub struct DuplicateDetector {
    known: HashMap<String, String>,
}

impl DuplicateDetector {
    pub fn new(ledger: &[LedgerTransaction]) -> Self {
        let known = ledger
            .iter()
            .map(|tx| {
                let date = tx.date.format("%Y-%m-%d").to_string();
                (fingerprint(&date, &tx.description, tx.amount), tx.description.clone())
            })
            .collect();
        Self { known }
    }

    /// Re-evaluates every row in order. Flags are recomputed from scratch, so
    /// running it again over the same rows and ledger changes nothing.
    pub fn mark(&self, staged: Vec<StagedTransaction>) -> Vec<StagedTransaction> {
        let mut seen = HashSet::new();
        staged
            .into_iter()
            .map(|mut tx| {
                let key = fingerprint(&tx.date, &tx.description, tx.amount);
                if let Some(existing) = self.known.get(&key) {
                    tx.is_duplicate = true;
                    tx.duplicate_of = Some(existing.clone());
                } else if seen.contains(&key) {
                    tx.is_duplicate = true;
                    tx.duplicate_of = Some(WITHIN_FILE_REFERENCE.to_string());
                } else {
                    tx.is_duplicate = false;
                    tx.duplicate_of = None;
                    seen.insert(key);
                }
                tx
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}

pub fn detect_duplicates(
    staged: Vec<StagedTransaction>,
    ledger: &[LedgerTransaction],
) -> Vec<StagedTransaction> {
    DuplicateDetector::new(ledger).mark(staged)
}
