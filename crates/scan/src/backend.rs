use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("No API key configured")]
    MissingApiKey,
    #[error("No image provided")]
    EmptyImage,
    #[error("Invalid API key")]
    Unauthorized,
    #[error("Rate limit reached, wait a moment and try again")]
    RateLimited,
    #[error("No API credit left on the account")]
    NoCredit,
    #[error("Scan service error ({status}): {message}")]
    Service { status: u16, message: String },
    #[error("Could not read receipt data: {0}")]
    Unreadable(String),
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Receipt photo as sent to the scan service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptImage {
    pub bytes: Vec<u8>,
    pub media_type: String,
}

impl ReceiptImage {
    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            media_type: "image/jpeg".to_string(),
        }
    }

    /// Media type guessed from the file extension; unknown ones are sent as JPEG.
    pub fn from_file_name(file_name: &str, bytes: Vec<u8>) -> Self {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        let media_type = match ext.as_str() {
            "png" => "image/png",
            "webp" => "image/webp",
            "gif" => "image/gif",
            _ => "image/jpeg",
        };
        Self {
            bytes,
            media_type: media_type.to_string(),
        }
    }
}

/// A service that reads an image and answers a text instruction.
/// Implementations make exactly one attempt per call.
pub trait ScanBackend: Send + Sync {
    fn complete(&self, image: &ReceiptImage, instruction: &str) -> Result<String, ScanError>;
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Answers with canned text and remembers the last instruction it received.
pub struct MockBackend {
    reply: Result<String, u16>,
    last_instruction: Mutex<Option<String>>,
}

impl MockBackend {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: Ok(reply.into()),
            last_instruction: Mutex::new(None),
        }
    }

    /// Fails every call as if the service answered with `status`.
    pub fn failing(status: u16) -> Self {
        Self {
            reply: Err(status),
            last_instruction: Mutex::new(None),
        }
    }

    pub fn last_instruction(&self) -> Option<String> {
        self.last_instruction
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
    }
}

impl ScanBackend for MockBackend {
    fn complete(&self, _image: &ReceiptImage, instruction: &str) -> Result<String, ScanError> {
        if let Ok(mut guard) = self.last_instruction.lock() {
            *guard = Some(instruction.to_string());
        }
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(status) => Err(crate::http::error_for_status(*status, "")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_returns_preset_text() {
        let b = MockBackend::new(r#"{"description":"Padaria"}"#);
        let image = ReceiptImage::jpeg(b"fake image data".to_vec());
        assert_eq!(b.complete(&image, "read it").unwrap(), r#"{"description":"Padaria"}"#);
        assert_eq!(b.last_instruction().as_deref(), Some("read it"));
    }

    #[test]
    fn failing_mock_maps_status() {
        let b = MockBackend::failing(429);
        let image = ReceiptImage::jpeg(vec![1]);
        assert!(matches!(b.complete(&image, "x"), Err(ScanError::RateLimited)));
    }

    #[test]
    fn media_type_from_extension() {
        assert_eq!(ReceiptImage::from_file_name("r.PNG", vec![]).media_type, "image/png");
        assert_eq!(ReceiptImage::from_file_name("r.jpg", vec![]).media_type, "image/jpeg");
        assert_eq!(ReceiptImage::from_file_name("photo", vec![]).media_type, "image/jpeg");
    }
}
