//! PDF merge
//!
//! Combines multiple PDFs into a single document whose page sequence is the
//! concatenation of the inputs' page sequences, in caller order.

use crate::error::PdfToolError;
use crate::result::ConversionResult;
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::info;

/// Page attributes a page may inherit from its page-tree ancestors. These
/// are resolved down onto each page before it is re-parented, so pages that
/// relied on inheritance keep rendering after the transplant.
const INHERITABLE_PAGE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Merge multiple PDFs into one.
///
/// The algorithm:
/// 1. Create a fresh destination document and reserve its page tree root.
/// 2. For each source, in caller order:
///    a. Load it (encrypted sources are loaded as-is, like `compress`).
///    b. Resolve inheritable attributes onto each page.
///    c. Import every object under offset-remapped ids.
///    d. Re-parent the pages and append them to the page list.
/// 3. Build the page tree root and catalog, prune orphaned source nodes,
///    compress, and serialize.
///
/// Caller order is significant: no reordering or deduplication happens. A
/// single-input list is re-serialized through the same path.
pub fn merge_documents(inputs: Vec<Vec<u8>>) -> Result<ConversionResult, PdfToolError> {
    if inputs.is_empty() {
        return Err(PdfToolError::Operation("No documents to merge".into()));
    }

    let mut dest = Document::with_version("1.7");
    let pages_root_id = dest.new_object_id();
    let mut page_refs: Vec<ObjectId> = Vec::new();

    for (index, bytes) in inputs.iter().enumerate() {
        let source = Document::load_mem(bytes).map_err(|e| {
            PdfToolError::Parse(format!("Failed to load document {}: {}", index, e))
        })?;
        append_document(&mut dest, source, pages_root_id, &mut page_refs);
    }

    let kids: Vec<Object> = page_refs.iter().map(|&id| Object::Reference(id)).collect();
    let pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(page_refs.len() as i64)),
        ("Kids", Object::Array(kids)),
    ]);
    dest.objects.insert(pages_root_id, Object::Dictionary(pages));

    let catalog = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_root_id)),
    ]);
    let catalog_id = dest.add_object(catalog);
    dest.trailer.set("Root", Object::Reference(catalog_id));

    // Source page-tree nodes are orphaned once their pages are re-parented.
    dest.prune_objects();
    dest.compress();

    let mut buffer = Vec::new();
    dest.save_to(&mut buffer)
        .map_err(|e| PdfToolError::Operation(format!("Failed to save merged PDF: {}", e)))?;

    info!(
        documents = inputs.len(),
        pages = page_refs.len(),
        size = buffer.len(),
        "merged documents"
    );

    Ok(ConversionResult::pdf(buffer))
}

/// Import one source document into the destination, appending its pages in
/// their original index order.
fn append_document(
    dest: &mut Document,
    source: Document,
    pages_root_id: ObjectId,
    page_refs: &mut Vec<ObjectId>,
) {
    let source_pages: Vec<ObjectId> = source.get_pages().values().copied().collect();
    let source_max_id = source.max_id;

    // Resolve inherited attributes while the source page tree is intact.
    let mut resolved: Vec<(ObjectId, Vec<(Vec<u8>, Object)>)> = Vec::new();
    for &page_id in &source_pages {
        let mut inherited = Vec::new();
        let has_key = |key: &[u8]| {
            source
                .objects
                .get(&page_id)
                .and_then(|o| o.as_dict().ok())
                .map(|d| d.has(key))
                .unwrap_or(false)
        };
        for key in INHERITABLE_PAGE_KEYS {
            if !has_key(key) {
                if let Some(value) = inherited_attribute(&source, page_id, key) {
                    inherited.push((key.to_vec(), value));
                }
            }
        }
        resolved.push((page_id, inherited));
    }

    // Offset every imported object id past the destination's current ids.
    let offset = dest.max_id;
    for (old_id, object) in source.objects.into_iter() {
        let new_id = (old_id.0 + offset, old_id.1);
        dest.objects.insert(new_id, remap_object_refs(object, offset));
    }
    dest.max_id = (offset + source_max_id).max(dest.max_id);

    for (old_page_id, inherited) in resolved {
        let new_page_id = (old_page_id.0 + offset, old_page_id.1);
        if let Some(Object::Dictionary(page)) = dest.objects.get_mut(&new_page_id) {
            for (key, value) in inherited {
                page.set(key, remap_object_refs(value, offset));
            }
            page.set("Parent", Object::Reference(pages_root_id));
        }
        page_refs.push(new_page_id);
    }
}

/// Look an inheritable attribute up the Parent chain of a page.
fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = page_id;
    // Bounded walk: a well-formed page tree is shallow, a malformed one may cycle.
    for _ in 0..64 {
        let dict = doc.objects.get(&current)?.as_dict().ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value.clone());
        }
        current = dict.get(b"Parent").ok()?.as_reference().ok()?;
    }
    None
}

/// Recursively remap object references in an object.
fn remap_object_refs(obj: Object, offset: u32) -> Object {
    match obj {
        Object::Reference(id) => Object::Reference((id.0 + offset, id.1)),
        Object::Array(arr) => Object::Array(
            arr.into_iter()
                .map(|o| remap_object_refs(o, offset))
                .collect(),
        ),
        Object::Dictionary(mut dict) => {
            for (_, value) in dict.iter_mut() {
                *value = remap_object_refs(value.clone(), offset);
            }
            Object::Dictionary(dict)
        }
        Object::Stream(mut stream) => {
            for (_, value) in stream.dict.iter_mut() {
                *value = remap_object_refs(value.clone(), offset);
            }
            Object::Stream(stream)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{content::Content, content::Operation, Stream};

    /// Create a PDF with `num_pages` pages of the given width, so merged
    /// page order can be read back from MediaBox widths.
    fn create_test_pdf(num_pages: u32, width: i64) -> Vec<u8> {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();

        let mut page_ids = Vec::new();
        for i in 0..num_pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new(
                        "Tj",
                        vec![Object::String(
                            format!("Page {}", i + 1).into_bytes(),
                            lopdf::StringFormat::Literal,
                        )],
                    ),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));

            let page = Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(pages_id)),
                (
                    "MediaBox",
                    Object::Array(vec![
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Integer(width),
                        Object::Integer(792),
                    ]),
                ),
                ("Contents", Object::Reference(content_id)),
            ]);
            page_ids.push(doc.add_object(page));
        }

        let pages = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(num_pages as i64)),
            (
                "Kids",
                Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
            ),
        ]);
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]);
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    /// MediaBox widths of a document's pages, in page order.
    fn page_widths(bytes: &[u8]) -> Vec<i64> {
        let doc = Document::load_mem(bytes).unwrap();
        doc.get_pages()
            .values()
            .map(|page_id| {
                let page = doc.objects.get(page_id).unwrap().as_dict().unwrap();
                let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
                media_box[2].as_i64().unwrap()
            })
            .collect()
    }

    #[test]
    fn test_merge_empty_fails() {
        let result = merge_documents(vec![]);
        assert!(result.is_err());
    }

    #[test]
    fn test_merge_single_document_reserializes() {
        let pdf = create_test_pdf(2, 612);

        let result = merge_documents(vec![pdf]).unwrap();

        assert_eq!(result.content_type, crate::media::PDF_MIME);
        let doc = Document::load_mem(&result.bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn test_merge_two_documents_combines_pages() {
        let doc_a = create_test_pdf(2, 612);
        let doc_b = create_test_pdf(3, 500);

        let merged = merge_documents(vec![doc_a, doc_b]).unwrap();

        let doc = Document::load_mem(&merged.bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 5, "merged document should have 5 pages");
    }

    #[test]
    fn test_merge_preserves_page_order() {
        let doc_a = create_test_pdf(2, 612);
        let doc_b = create_test_pdf(1, 500);
        let doc_c = create_test_pdf(2, 400);

        let merged = merge_documents(vec![doc_a, doc_b, doc_c]).unwrap();

        assert_eq!(page_widths(&merged.bytes), vec![612, 612, 500, 400, 400]);
    }

    #[test]
    fn test_merge_resolves_inherited_media_box() {
        // MediaBox on the Pages node only; pages inherit it.
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let page = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
        ]);
        let page_id = doc.add_object(page);
        let pages = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(1)),
            ("Kids", Object::Array(vec![Object::Reference(page_id)])),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(300),
                    Object::Integer(300),
                ]),
            ),
        ]);
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]);
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", Object::Reference(catalog_id));
        let mut inheriting = Vec::new();
        doc.save_to(&mut inheriting).unwrap();

        let plain = create_test_pdf(1, 612);
        let merged = merge_documents(vec![inheriting, plain]).unwrap();

        assert_eq!(page_widths(&merged.bytes), vec![300, 612]);
    }

    #[test]
    fn test_merged_document_is_valid_pdf() {
        let doc_a = create_test_pdf(2, 612);
        let doc_b = create_test_pdf(2, 612);

        let merged = merge_documents(vec![doc_a, doc_b]).unwrap();

        assert!(merged.bytes.starts_with(b"%PDF-"));
        let doc = Document::load_mem(&merged.bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 4);
    }
}
