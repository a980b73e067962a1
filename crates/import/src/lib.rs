//! Statement ingestion: turns bank and card exports into staged transactions
//! awaiting review, then merges the approved ones into the ledger.

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static regex::Regex {
            static R: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
            R.get_or_init(|| regex::Regex::new($pat).expect("invalid regex"))
        }
    };
}

pub mod columns;
pub mod csv;
pub mod dedup;
pub mod error;
pub mod normalize;
pub mod ofx;
pub mod pipeline;
pub mod rules;
pub mod spreadsheet;
pub mod staging;

pub use columns::{ColumnDetector, DetectedRow, RowLookup};
pub use dedup::{detect_duplicates, fingerprint, DuplicateDetector};
pub use error::{ImportError, MergeError};
pub use normalize::{canonical_text, normalize_date, parse_amount};
pub use pipeline::{ImportPipeline, RawFile, StatementFormat};
pub use rules::{Categorizer, KeywordRule, RulesError};
pub use staging::{ConfirmedImport, StagingBatch, StatusCounts};
