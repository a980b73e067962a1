use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::Value;
use std::io::{Read, Write};

use crate::error::StorageError;
use crate::snapshot::Snapshot;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Serializes the snapshot as gzip-compressed JSON.
pub fn export_backup(snapshot: &Snapshot) -> Result<Vec<u8>, StorageError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    serde_json::to_writer(&mut encoder, snapshot)?;
    encoder.flush()?;
    Ok(encoder.finish()?)
}

/// Reads a backup produced by [`export_backup`] or a plain JSON snapshot.
/// Documents without a `transactions` list are rejected.
pub fn import_backup(bytes: &[u8]) -> Result<Snapshot, StorageError> {
    let json = if bytes.starts_with(&GZIP_MAGIC) {
        let mut out = Vec::new();
        GzDecoder::new(bytes).read_to_end(&mut out)?;
        out
    } else {
        bytes.to_vec()
    };

    let value: Value = serde_json::from_slice(&json)
        .map_err(|e| StorageError::InvalidBackup(format!("not a JSON document: {e}")))?;
    match value.get("transactions") {
        Some(Value::Array(_)) => {}
        _ => {
            return Err(StorageError::InvalidBackup(
                "missing transactions list".to_string(),
            ))
        }
    }
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use finflow_core::{LedgerTransaction, Money, TransactionKind};

    fn sample() -> Snapshot {
        Snapshot {
            transactions: vec![LedgerTransaction {
                id: "t1".into(),
                date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                description: "Market".into(),
                amount: Money::from_cents(-5000),
                kind: TransactionKind::Expense,
                category: "food".into(),
                account_id: None,
                card_id: None,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn gzip_backup_restores() {
        let bytes = export_backup(&sample()).unwrap();
        assert!(bytes.starts_with(&GZIP_MAGIC));
        assert_eq!(import_backup(&bytes).unwrap(), sample());
    }

    #[test]
    fn plain_json_accepted() {
        let bytes = serde_json::to_vec(&sample()).unwrap();
        assert_eq!(import_backup(&bytes).unwrap(), sample());
    }

    #[test]
    fn document_without_transactions_rejected() {
        let err = import_backup(br#"{"accounts":[]}"#).unwrap_err();
        assert!(matches!(err, StorageError::InvalidBackup(_)));
        let err = import_backup(br#"{"transactions":"none"}"#).unwrap_err();
        assert!(matches!(err, StorageError::InvalidBackup(_)));
    }

    #[test]
    fn garbage_rejected() {
        assert!(matches!(import_backup(b"not json"), Err(StorageError::InvalidBackup(_))));
    }
}
