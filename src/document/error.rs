// ABOUTME: Error types for Word document handling
// ABOUTME: Covers package (zip), XML parsing and serialization failures

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Document package error: {0}")]
    Package(#[from] zip::result::ZipError),

    #[error("Document part missing: {part}")]
    MissingPart { part: String },

    #[error("XML error in {part}: {message}")]
    Xml { part: String, message: String },

    #[error("Document part {part} is not valid UTF-8")]
    Encoding { part: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DocumentError {
    pub(crate) fn xml(part: &str, message: impl std::fmt::Display) -> Self {
        DocumentError::Xml {
            part: part.to_string(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DocumentError>;
