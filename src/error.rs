use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("Invalid PDF: missing %PDF header")]
    MissingHeader,

    #[error("Invalid PDF: missing startxref marker")]
    MissingEof,

    #[error("Parse error at byte {position}: {message}")]
    Parse { position: usize, message: String },

    #[error("Invalid xref table")]
    InvalidXref,

    #[error("Object not found: {0} {1} R")]
    ObjectNotFound(u32, u16),

    #[error("Invalid document structure: {0}")]
    InvalidStructure(String),

    #[error("Encrypted PDFs are not supported")]
    Encrypted,

    #[error("Unsupported filter: {0}")]
    UnsupportedFilter(String),

    #[error("Decompression failed: {0}")]
    DecompressError(String),

    #[error("Invalid UTF-8 in string")]
    InvalidUtf8,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PdfError>;

/// Failures of the conversion pipeline that are not about table content.
///
/// A PDF that cannot be parsed is not an `ExtractError`: it is recorded as a
/// failed attempt and reported as "no tables".
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Failed to read {}: {source}", path.display())]
    ReadInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    WriteCsv {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
