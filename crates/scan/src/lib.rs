//! Receipt scanning through an external vision service.
//!
//! The service gets the image bytes and an instruction asking for a JSON
//! object; [`ReceiptScanner`] validates the answer into a [`ScannedReceipt`].

pub mod backend;
pub mod http;
pub mod receipt;

pub use backend::{MockBackend, ReceiptImage, ScanBackend, ScanError};
pub use http::{error_for_status, HttpScanBackend, ScanSettings};
pub use receipt::{parse_reply, strip_fences, ReceiptScanner, ScannedReceipt, DEFAULT_CATEGORIES};
