//! Error types for extraction and storage.

use thiserror::Error;

use crate::types::FormatTag;

/// Failure reported by the extraction pipeline.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// Extension is not in any recognized group.
    #[error("unsupported file type: {0}")]
    UnsupportedFormat(String),

    /// The format-specific decoder rejected the input.
    #[error("failed to decode {format}: {cause}")]
    Decode {
        format: FormatTag,
        #[source]
        cause: DecodeError,
    },
}

impl ExtractionError {
    /// Single message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            ExtractionError::UnsupportedFormat(ext) if ext.is_empty() => {
                "Unsupported file type.".to_string()
            }
            ExtractionError::UnsupportedFormat(ext) => {
                format!("Unsupported file type: .{}", ext)
            }
            ExtractionError::Decode { format, .. } => {
                format!("Error reading file ({}).", format.label())
            }
        }
    }
}

/// Format-specific decode failures.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("missing package part: {0}")]
    MissingPart(String),

    #[error("malformed content: {0}")]
    Malformed(String),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the recent-uploads store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
