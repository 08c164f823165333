//! Per-file processing records.
//!
//! A record moves strictly forward: Pending → Processing → Done or Error.
//! Terminal records stay terminal until they are removed; a settled record
//! is never reprocessed.

use snappdf_core::{ConversionResult, MediaType};

/// Session-local record identity, distinct from the filename.
pub type RecordId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStatus {
    Pending,
    Processing,
    Done,
    Error,
}

impl RecordStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RecordStatus::Done | RecordStatus::Error)
    }
}

#[derive(Debug)]
pub struct FileRecord {
    pub id: RecordId,
    pub name: String,
    pub media_type: MediaType,
    bytes: Vec<u8>,
    status: RecordStatus,
    result: Option<ConversionResult>,
    error: Option<String>,
}

impl FileRecord {
    pub(crate) fn new(id: RecordId, name: String, media_type: MediaType, bytes: Vec<u8>) -> Self {
        Self {
            id,
            name,
            media_type,
            bytes,
            status: RecordStatus::Pending,
            result: None,
            error: None,
        }
    }

    pub fn status(&self) -> RecordStatus {
        self.status
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn result(&self) -> Option<&ConversionResult> {
        self.result.as_ref()
    }

    /// Error message, verbatim from the failed transform.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn size_before(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn size_after(&self) -> Option<u64> {
        self.result.as_ref().map(ConversionResult::len)
    }

    pub(crate) fn start(&mut self) {
        debug_assert_eq!(self.status, RecordStatus::Pending);
        self.status = RecordStatus::Processing;
    }

    pub(crate) fn settle_ok(&mut self, result: ConversionResult) {
        debug_assert_eq!(self.status, RecordStatus::Processing);
        self.result = Some(result);
        self.status = RecordStatus::Done;
    }

    pub(crate) fn settle_err(&mut self, message: String) {
        debug_assert_eq!(self.status, RecordStatus::Processing);
        self.error = Some(message);
        self.status = RecordStatus::Error;
    }
}

/// Source file in an ordered-list tool (merge, image pack). Unlike
/// [`FileRecord`] it carries no status: those tools settle one combined job.
#[derive(Debug)]
pub struct SourceFile {
    pub id: RecordId,
    pub name: String,
    pub media_type: MediaType,
    bytes: Vec<u8>,
}

impl SourceFile {
    pub(crate) fn new(id: RecordId, name: String, media_type: MediaType, bytes: Vec<u8>) -> Self {
        Self {
            id,
            name,
            media_type,
            bytes,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

// Default allows std::mem::take while reordering.
impl Default for SourceFile {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            media_type: MediaType::Pdf,
            bytes: Vec::new(),
        }
    }
}
