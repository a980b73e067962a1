use finflow_core::{LedgerRepository, LedgerTransaction, StagedTransaction};
use std::path::Path;
use tracing::{debug, info};

use crate::dedup::detect_duplicates;
use crate::error::ImportError;
use crate::rules::Categorizer;
use crate::staging::StagingBatch;
use crate::{csv, ofx, spreadsheet};

/// An uploaded statement: file name plus its untouched bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl RawFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    /// Lower-cased extension, empty when the name has none.
    pub fn extension(&self) -> String {
        Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementFormat {
    Ofx,
    Spreadsheet,
    Delimited { delimiter: Option<u8> },
}

impl StatementFormat {
    /// Chooses the extractor by extension. A `.txt` export that is really an
    /// OFX statement is recognised by its tags.
    pub fn detect(file: &RawFile) -> Result<Self, ImportError> {
        match file.extension().as_str() {
            "ofx" | "qfx" => Ok(StatementFormat::Ofx),
            "xlsx" | "xls" => Ok(StatementFormat::Spreadsheet),
            "tsv" => Ok(StatementFormat::Delimited {
                delimiter: Some(b'\t'),
            }),
            "txt" if looks_like_ofx(&file.bytes) => Ok(StatementFormat::Ofx),
            "csv" | "txt" => Ok(StatementFormat::Delimited { delimiter: None }),
            other => Err(ImportError::UnsupportedFormat(if other.is_empty() {
                file.file_name.clone()
            } else {
                format!(".{other}")
            })),
        }
    }
}

fn looks_like_ofx(bytes: &[u8]) -> bool {
    let text = String::from_utf8_lossy(bytes).to_uppercase();
    text.contains("<OFX>") || text.contains("<STMTTRN>")
}

/// Entry point for statement ingestion: format dispatch, extraction,
/// categorization and duplicate flagging.
#[derive(Debug, Clone, Default)]
pub struct ImportPipeline {
    categorizer: Categorizer,
}

impl ImportPipeline {
    pub fn new(categorizer: Categorizer) -> Self {
        Self { categorizer }
    }

    pub fn categorizer(&self) -> &Categorizer {
        &self.categorizer
    }

    /// Extracts staged rows without duplicate detection.
    pub fn parse(&self, file: &RawFile) -> Result<Vec<StagedTransaction>, ImportError> {
        let format = StatementFormat::detect(file)?;
        debug!(file = %file.file_name, ?format, bytes = file.bytes.len(), "dispatching statement");

        let source = file.file_name.as_str();
        match format {
            StatementFormat::Ofx => ofx::parse(&file.bytes, source, &self.categorizer),
            StatementFormat::Spreadsheet => spreadsheet::parse(&file.bytes, source, &self.categorizer),
            StatementFormat::Delimited { delimiter } => {
                csv::parse(&file.bytes, delimiter, source, &self.categorizer)
            }
        }
    }

    /// Extracts and flags duplicates against `ledger`.
    pub fn stage(
        &self,
        file: &RawFile,
        ledger: &[LedgerTransaction],
    ) -> Result<Vec<StagedTransaction>, ImportError> {
        let rows = detect_duplicates(self.parse(file)?, ledger);
        let duplicates = rows.iter().filter(|r| r.is_duplicate).count();
        info!(file = %file.file_name, rows = rows.len(), duplicates, "statement staged");
        Ok(rows)
    }

    pub fn stage_from<R: LedgerRepository>(
        &self,
        file: &RawFile,
        repo: &R,
    ) -> Result<Vec<StagedTransaction>, ImportError> {
        let ledger = repo.transactions()?;
        self.stage(file, &ledger)
    }

    /// Adds the file's rows to an existing review batch; returns how many
    /// rows the file contributed.
    pub fn stage_into(
        &self,
        file: &RawFile,
        batch: &mut StagingBatch,
        ledger: &[LedgerTransaction],
    ) -> Result<usize, ImportError> {
        let rows = self.parse(file)?;
        let added = rows.len();
        batch.extend_with(rows, ledger);
        info!(file = %file.file_name, added, batch = batch.len(), "statement added to batch");
        Ok(added)
    }
}
