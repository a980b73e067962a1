//! Scan backend over an HTTP messages API that accepts base64 image blocks.

use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::backend::{ReceiptImage, ScanBackend, ScanError};

pub const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
pub const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSettings {
    pub model: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_timeout_secs() -> u64 {
    60
}

impl ScanSettings {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            endpoint: default_endpoint(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Serialize)]
struct MessageRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: Vec<ContentBlock<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock<'a> {
    Image { source: ImageSource<'a> },
    Text { text: &'a str },
}

#[derive(Debug, Serialize)]
struct ImageSource<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    media_type: &'a str,
    data: String,
}

#[derive(Deserialize)]
struct MessageResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
}

#[derive(Deserialize)]
struct ResponseBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Maps a failed response to the error kinds the caller can act on.
pub fn error_for_status(status: u16, body: &str) -> ScanError {
    match status {
        401 => ScanError::Unauthorized,
        429 => ScanError::RateLimited,
        403 => ScanError::NoCredit,
        _ => ScanError::Service {
            status,
            message: serde_json::from_str::<ErrorResponse>(body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("API error: {status}")),
        },
    }
}

pub struct HttpScanBackend {
    client: Client,
    api_key: String,
    settings: ScanSettings,
}

impl HttpScanBackend {
    pub fn new(api_key: impl Into<String>, settings: ScanSettings) -> Result<Self, ScanError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ScanError::MissingApiKey);
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_key,
            settings,
        })
    }

    fn request_body<'a>(&'a self, image: &'a ReceiptImage, instruction: &'a str) -> MessageRequest<'a> {
        build_request(&self.settings, image, instruction)
    }
}

fn build_request<'a>(
    settings: &'a ScanSettings,
    image: &'a ReceiptImage,
    instruction: &'a str,
) -> MessageRequest<'a> {
    MessageRequest {
        model: &settings.model,
        max_tokens: settings.max_tokens,
        messages: vec![Message {
            role: "user",
            content: vec![
                ContentBlock::Image {
                    source: ImageSource {
                        kind: "base64",
                        media_type: &image.media_type,
                        data: STANDARD.encode(&image.bytes),
                    },
                },
                ContentBlock::Text { text: instruction },
            ],
        }],
    }
}

impl ScanBackend for HttpScanBackend {
    fn complete(&self, image: &ReceiptImage, instruction: &str) -> Result<String, ScanError> {
        debug!(endpoint = %self.settings.endpoint, bytes = image.bytes.len(), "sending receipt image");
        let response = self
            .client
            .post(&self.settings.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&self.request_body(image, instruction))
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            warn!(status = status.as_u16(), "receipt scan rejected");
            return Err(error_for_status(status.as_u16(), &body));
        }

        let parsed: MessageResponse = response.json()?;
        Ok(parsed
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join(""))
    }
}
