use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfToolError {
    #[error("Failed to parse PDF: {0}")]
    Parse(String),

    #[error("Failed to decode image: {0}")]
    Image(String),

    #[error("Unsupported image format: {0}")]
    UnsupportedImage(String),

    #[error("PDF operation failed: {0}")]
    Operation(String),
}
