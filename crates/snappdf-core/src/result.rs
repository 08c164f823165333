use serde::Serialize;

/// Binary output of a transform, paired with its content type.
///
/// Opaque to callers beyond size and savability.
#[derive(Debug, Clone)]
pub struct ConversionResult {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

impl ConversionResult {
    pub fn new(bytes: Vec<u8>, content_type: &'static str) -> Self {
        Self {
            bytes,
            content_type,
        }
    }

    pub fn pdf(bytes: Vec<u8>) -> Self {
        Self::new(bytes, crate::media::PDF_MIME)
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Size and timing figures for one completed job.
#[derive(Debug, Clone, Serialize)]
pub struct JobMetrics {
    pub input_size_bytes: u64,
    pub output_size_bytes: u64,
    pub elapsed_ms: u64,
}
