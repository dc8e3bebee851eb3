use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("PDF parse error: {0}")]
    Parse(String),

    #[error("Page {0} not found")]
    PageNotFound(u32),

    #[error("Invalid page structure: {0}")]
    Structure(String),

    #[error("Failed to save PDF: {0}")]
    Save(String),
}

pub type Result<T> = std::result::Result<T, PdfError>;
