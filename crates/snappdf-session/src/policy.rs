//! Input acceptance policy.
//!
//! The boundary check that runs before a record exists: declared type and
//! size only. Whether the bytes actually parse is the transform's problem.

use snappdf_core::MediaType;
use thiserror::Error;

/// Per-file ceiling applied unless a session overrides it.
pub const DEFAULT_MAX_FILE_BYTES: u64 = 100 * 1024 * 1024;

#[derive(Debug, Error, PartialEq)]
pub enum PolicyError {
    #[error("Unsupported file type: {name}")]
    UnsupportedType { name: String },

    #[error("File too large: {name} is {size} bytes (limit {limit})")]
    TooLarge { name: String, size: u64, limit: u64 },
}

#[derive(Debug, Clone)]
pub struct InputPolicy {
    accepted: &'static [MediaType],
    max_bytes: u64,
}

impl InputPolicy {
    /// PDF-only tools (compress, merge, pdf-to-word).
    pub fn pdf() -> Self {
        Self {
            accepted: &[MediaType::Pdf],
            max_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }

    /// Image pack tool.
    pub fn images() -> Self {
        Self {
            accepted: &[
                MediaType::Jpeg,
                MediaType::Png,
                MediaType::Gif,
                MediaType::Webp,
            ],
            max_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }

    /// Word input (word-to-pdf).
    pub fn word() -> Self {
        Self {
            accepted: &[MediaType::Doc, MediaType::Docx],
            max_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Accept or reject a file by declared type and size.
    pub fn check(&self, name: &str, size: u64) -> Result<MediaType, PolicyError> {
        let media_type = MediaType::from_name(name)
            .filter(|t| self.accepted.contains(t))
            .ok_or_else(|| PolicyError::UnsupportedType {
                name: name.to_string(),
            })?;

        if size > self.max_bytes {
            return Err(PolicyError::TooLarge {
                name: name.to_string(),
                size,
                limit: self.max_bytes,
            });
        }

        Ok(media_type)
    }
}
