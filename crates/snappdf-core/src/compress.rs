//! PDF compression
//!
//! Shrinks a document by blanking descriptive metadata and compacting its
//! structure. Image data is passed through untouched: this is NOT a lossy
//! recompression pass, and callers must not expect one.

use crate::error::PdfToolError;
use crate::result::ConversionResult;
use lopdf::{Document, Object};
use tracing::info;

/// Descriptive Info-dictionary fields blanked during compression.
const DESCRIPTIVE_KEYS: [&[u8]; 6] = [
    b"Title",
    b"Author",
    b"Subject",
    b"Keywords",
    b"Creator",
    b"Producer",
];

/// Compress a PDF.
///
/// Encrypted documents are loaded as-is; the protection flag is not honored
/// and is not an error. Size reduction comes from blanking the descriptive
/// metadata fields, pruning unreferenced objects, and Flate-compressing
/// uncompressed streams.
pub fn compress_document(bytes: &[u8]) -> Result<ConversionResult, PdfToolError> {
    let mut doc = Document::load_mem(bytes).map_err(|e| PdfToolError::Parse(e.to_string()))?;

    blank_descriptive_metadata(&mut doc);

    doc.prune_objects();
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| PdfToolError::Operation(format!("Failed to save compressed PDF: {}", e)))?;

    info!(
        size_before = bytes.len(),
        size_after = buffer.len(),
        "compressed document"
    );

    Ok(ConversionResult::pdf(buffer))
}

/// Blank Title/Author/Subject/Keywords/Creator/Producer in the Info
/// dictionary. A document without an Info dictionary is left alone.
fn blank_descriptive_metadata(doc: &mut Document) {
    let info_id = match doc.trailer.get(b"Info").and_then(Object::as_reference) {
        Ok(id) => id,
        Err(_) => return,
    };

    if let Some(Object::Dictionary(info)) = doc.objects.get_mut(&info_id) {
        for key in DESCRIPTIVE_KEYS {
            info.set(key, Object::string_literal(""));
        }
    }
}
