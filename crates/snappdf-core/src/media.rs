//! Media types accepted at the tool boundary.
//!
//! Declared types are derived from filenames; they decide which embed or
//! upload path a file takes, not whether its bytes actually decode.

/// MIME type of PDF output produced by every local transform.
pub const PDF_MIME: &str = "application/pdf";

/// MIME type of Word documents produced by the pdf-to-word conversion.
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Pdf,
    Jpeg,
    Png,
    Gif,
    Webp,
    Doc,
    Docx,
}

impl MediaType {
    /// Declared media type from a filename extension, case-insensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        let ext = name.rsplit_once('.').map(|(_, ext)| ext)?;
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(MediaType::Pdf),
            "jpg" | "jpeg" => Some(MediaType::Jpeg),
            "png" => Some(MediaType::Png),
            "gif" => Some(MediaType::Gif),
            "webp" => Some(MediaType::Webp),
            "doc" => Some(MediaType::Doc),
            "docx" => Some(MediaType::Docx),
            _ => None,
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            MediaType::Pdf => PDF_MIME,
            MediaType::Jpeg => "image/jpeg",
            MediaType::Png => "image/png",
            MediaType::Gif => "image/gif",
            MediaType::Webp => "image/webp",
            MediaType::Doc => "application/msword",
            MediaType::Docx => DOCX_MIME,
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(
            self,
            MediaType::Jpeg | MediaType::Png | MediaType::Gif | MediaType::Webp
        )
    }
}
