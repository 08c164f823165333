//! Images to PDF
//!
//! Packs a list of images into a PDF, one page per image, each page sized
//! exactly to the image's pixel dimensions. The embed path is chosen by the
//! DECLARED media type; bytes that fail both decoders are an error.

use crate::error::PdfToolError;
use crate::media::MediaType;
use crate::result::ConversionResult;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::{ColorType, GenericImageView, ImageFormat};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::io::Write;
use tracing::info;

/// One image input: filename, declared type, raw bytes.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub name: String,
    pub media_type: MediaType,
    pub bytes: Vec<u8>,
}

/// An image XObject already inserted into the document.
struct EmbeddedImage {
    xobject_id: ObjectId,
    width: u32,
    height: u32,
}

/// Build a PDF from images, one page per image, in input order.
///
/// Declared JPEGs embed as raw DCTDecode streams; declared PNGs decode to
/// pixels and embed as FlateDecode streams (with a soft mask for alpha).
/// Any other declared type is attempted as PNG first, then as JPEG; if both
/// decoders reject the bytes the whole transform fails.
pub fn images_to_pdf(images: &[ImageFile]) -> Result<ConversionResult, PdfToolError> {
    if images.is_empty() {
        return Err(PdfToolError::Operation("No images to convert".into()));
    }

    let mut doc = Document::with_version("1.7");
    let pages_root_id = doc.new_object_id();
    let mut page_ids = Vec::new();

    for img in images {
        let embedded = embed_image(&mut doc, img)?;
        page_ids.push(add_image_page(&mut doc, pages_root_id, &embedded)?);
    }

    let pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(page_ids.len() as i64)),
        (
            "Kids",
            Object::Array(page_ids.iter().map(|&id| Object::Reference(id)).collect()),
        ),
    ]);
    doc.objects.insert(pages_root_id, Object::Dictionary(pages));

    let catalog = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_root_id)),
    ]);
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));

    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| PdfToolError::Operation(format!("Failed to save image PDF: {}", e)))?;

    info!(images = images.len(), size = buffer.len(), "packed images into PDF");

    Ok(ConversionResult::pdf(buffer))
}

fn embed_image(doc: &mut Document, img: &ImageFile) -> Result<EmbeddedImage, PdfToolError> {
    match img.media_type {
        MediaType::Jpeg => embed_jpeg(doc, &img.bytes),
        MediaType::Png => embed_png(doc, &img.bytes),
        // Best effort for anything else: strict PNG decode, then strict JPEG.
        _ => embed_png(doc, &img.bytes)
            .or_else(|_| embed_jpeg(doc, &img.bytes))
            .map_err(|_| PdfToolError::UnsupportedImage(img.name.clone())),
    }
}

/// Embed a JPEG as-is: the DCT stream is passed through untouched.
fn embed_jpeg(doc: &mut Document, bytes: &[u8]) -> Result<EmbeddedImage, PdfToolError> {
    let decoded = image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)
        .map_err(|e| PdfToolError::Image(e.to_string()))?;
    let (width, height) = decoded.dimensions();

    let color_space: &[u8] = match decoded.color() {
        ColorType::L8 | ColorType::L16 | ColorType::La8 | ColorType::La16 => b"DeviceGray",
        _ => b"DeviceRGB",
    };

    let mut dict = Dictionary::new();
    dict.set("Type", Object::Name(b"XObject".to_vec()));
    dict.set("Subtype", Object::Name(b"Image".to_vec()));
    dict.set("Width", Object::Integer(width as i64));
    dict.set("Height", Object::Integer(height as i64));
    dict.set("ColorSpace", Object::Name(color_space.to_vec()));
    dict.set("BitsPerComponent", Object::Integer(8));
    dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));

    let xobject_id = doc.add_object(Stream::new(dict, bytes.to_vec()));
    Ok(EmbeddedImage {
        xobject_id,
        width,
        height,
    })
}

/// Embed a PNG by decoding to pixels and writing a FlateDecode stream.
/// Alpha goes into a DeviceGray soft mask.
fn embed_png(doc: &mut Document, bytes: &[u8]) -> Result<EmbeddedImage, PdfToolError> {
    let decoded = image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .map_err(|e| PdfToolError::Image(e.to_string()))?;
    let (width, height) = decoded.dimensions();

    let pixel_count = width as usize * height as usize;
    let xobject_id = if decoded.color().has_alpha() {
        let rgba = decoded.to_rgba8();
        let mut rgb = Vec::with_capacity(pixel_count * 3);
        let mut alpha = Vec::with_capacity(pixel_count);
        for px in rgba.pixels() {
            rgb.extend_from_slice(&px.0[..3]);
            alpha.push(px.0[3]);
        }
        let smask_id = add_pixel_stream(doc, width, height, b"DeviceGray", &alpha, None)?;
        add_pixel_stream(doc, width, height, b"DeviceRGB", &rgb, Some(smask_id))?
    } else {
        match decoded.color() {
            ColorType::L8 | ColorType::L16 => {
                let gray = decoded.to_luma8();
                add_pixel_stream(doc, width, height, b"DeviceGray", gray.as_raw(), None)?
            }
            _ => {
                let rgb = decoded.to_rgb8();
                add_pixel_stream(doc, width, height, b"DeviceRGB", rgb.as_raw(), None)?
            }
        }
    };

    Ok(EmbeddedImage {
        xobject_id,
        width,
        height,
    })
}

fn add_pixel_stream(
    doc: &mut Document,
    width: u32,
    height: u32,
    color_space: &[u8],
    pixels: &[u8],
    smask: Option<ObjectId>,
) -> Result<ObjectId, PdfToolError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(pixels)
        .and_then(|_| encoder.finish())
        .map_err(|e| PdfToolError::Operation(format!("Failed to compress image data: {}", e)))
        .map(|data| {
            let mut dict = Dictionary::new();
            dict.set("Type", Object::Name(b"XObject".to_vec()));
            dict.set("Subtype", Object::Name(b"Image".to_vec()));
            dict.set("Width", Object::Integer(width as i64));
            dict.set("Height", Object::Integer(height as i64));
            dict.set("ColorSpace", Object::Name(color_space.to_vec()));
            dict.set("BitsPerComponent", Object::Integer(8));
            dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));
            if let Some(id) = smask {
                dict.set("SMask", Object::Reference(id));
            }
            doc.add_object(Stream::new(dict, data))
        })
}

/// Add a page sized exactly to the image and draw the image filling it.
fn add_image_page(
    doc: &mut Document,
    pages_root_id: ObjectId,
    image: &EmbeddedImage,
) -> Result<ObjectId, PdfToolError> {
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Integer(image.width as i64),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(image.height as i64),
                    Object::Integer(0),
                    Object::Integer(0),
                ],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let encoded = content
        .encode()
        .map_err(|e| PdfToolError::Operation(format!("Failed to encode page content: {}", e)))?;
    let content_id = doc.add_object(Stream::new(Dictionary::new(), encoded));

    let resources = Dictionary::from_iter(vec![(
        "XObject",
        Object::Dictionary(Dictionary::from_iter(vec![(
            "Im0",
            Object::Reference(image.xobject_id),
        )])),
    )]);

    let page = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Page".to_vec())),
        ("Parent", Object::Reference(pages_root_id)),
        (
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(image.width as i64),
                Object::Integer(image.height as i64),
            ]),
        ),
        ("Resources", Object::Dictionary(resources)),
        ("Contents", Object::Reference(content_id)),
    ]);

    Ok(doc.add_object(page))
}
