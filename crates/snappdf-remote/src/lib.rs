//! Remote PDF/Word conversion client
//!
//! The conversion service exposes two endpoints, each taking a multipart
//! upload with a single file field named `file` and answering with the
//! converted binary, or with a JSON error body (see [`error`]). This crate
//! wraps that contract behind [`RemoteConverter`].

pub mod error;

pub use error::{ConvertError, ErrorDetail, FALLBACK_MESSAGE};

use reqwest::multipart;
use snappdf_core::{ConversionResult, DOCX_MIME, PDF_MIME};
use std::time::Duration;
use tracing::{info, warn};

/// Deadline applied to a conversion round trip when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Which way the conversion runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    PdfToWord,
    WordToPdf,
}

impl Direction {
    pub fn endpoint_path(&self) -> &'static str {
        match self {
            Direction::PdfToWord => "/api/v1/convert/pdf-to-word",
            Direction::WordToPdf => "/api/v1/convert/word-to-pdf",
        }
    }

    /// MIME type declared on the uploaded file.
    pub fn source_mime(&self) -> &'static str {
        match self {
            Direction::PdfToWord => PDF_MIME,
            Direction::WordToPdf => DOCX_MIME,
        }
    }

    /// MIME type implied for the converted result.
    pub fn target_mime(&self) -> &'static str {
        match self {
            Direction::PdfToWord => DOCX_MIME,
            Direction::WordToPdf => PDF_MIME,
        }
    }

    /// Extension of the default output filename.
    pub fn output_extension(&self) -> &'static str {
        match self {
            Direction::PdfToWord => "docx",
            Direction::WordToPdf => "pdf",
        }
    }
}

/// Connection settings for the conversion service.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl RemoteConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Client for the remote conversion service.
pub struct RemoteConverter {
    client: reqwest::Client,
    config: RemoteConfig,
}

impl RemoteConverter {
    pub fn new(config: RemoteConfig) -> Result<Self, ConvertError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    /// Upload one file and return the converted binary.
    ///
    /// A non-success response yields [`ConvertError::Service`] carrying the
    /// extracted message; an expired deadline yields
    /// [`ConvertError::TimedOut`].
    pub async fn convert(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        direction: Direction,
    ) -> Result<ConversionResult, ConvertError> {
        let url = format!(
            "{}{}",
            self.config.base_url.trim_end_matches('/'),
            direction.endpoint_path()
        );
        let size = bytes.len();

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(direction.source_mime())?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status.is_success() {
            let body = response
                .bytes()
                .await
                .map_err(|e| self.transport_error(e))?;
            info!(
                file = file_name,
                direction = ?direction,
                size_before = size,
                size_after = body.len(),
                "conversion succeeded"
            );
            Ok(ConversionResult::new(body.to_vec(), direction.target_mime()))
        } else {
            let body = response.bytes().await.unwrap_or_default();
            let message = error::extract_message(&body);
            warn!(file = file_name, status = %status, message = %message, "conversion failed");
            Err(ConvertError::Service(message))
        }
    }

    fn transport_error(&self, e: reqwest::Error) -> ConvertError {
        if e.is_timeout() {
            ConvertError::TimedOut(self.config.timeout)
        } else {
            ConvertError::Http(e)
        }
    }
}
