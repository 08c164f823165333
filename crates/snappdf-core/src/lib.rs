//! Local PDF transforms
//!
//! This crate provides the client-side PDF manipulation used by the snappdf
//! tools, built on lopdf:
//! - `compress_document`: blank descriptive metadata and compact structure
//! - `merge_documents`: concatenate documents' pages in caller order
//! - `images_to_pdf`: one exactly-sized page per input image
//!
//! Remote PDF/Word conversion lives in `snappdf-remote`; tool state machines
//! live in `snappdf-session`.

pub mod compress;
pub mod error;
pub mod filename;
pub mod images;
pub mod media;
pub mod merge;
pub mod result;

pub use compress::compress_document;
pub use error::PdfToolError;
pub use images::{images_to_pdf, ImageFile};
pub use media::{MediaType, DOCX_MIME, PDF_MIME};
pub use merge::merge_documents;
pub use result::{ConversionResult, JobMetrics};

/// Parse PDF bytes and return the page count.
pub fn page_count(bytes: &[u8]) -> Result<u32, PdfToolError> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| PdfToolError::Parse(e.to_string()))?;
    Ok(doc.get_pages().len() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count_rejects_invalid_bytes() {
        assert!(page_count(b"definitely not a pdf").is_err());
    }
}
