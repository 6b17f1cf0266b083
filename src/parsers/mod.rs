//! Format extractors: raw bytes of one format to normalized text.

pub mod docx;
pub mod ooxml;
pub mod pdf;
pub mod pptx;
pub mod text;
pub mod xlsx;

use async_trait::async_trait;

use crate::error::DecodeError;
use crate::types::FormatTag;

pub use docx::DocxExtractor;
pub use pdf::{PageSource, PdfExtractor};
pub use pptx::PptxExtractor;
pub use text::TextExtractor;
pub use xlsx::XlsxExtractor;

/// Shared extraction capability implemented once per format.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, bytes: &[u8]) -> Result<String, DecodeError>;
}

/// The handler for a format.
pub fn extractor_for(format: FormatTag) -> Box<dyn Extractor> {
    match format {
        FormatTag::PlainText => Box::new(TextExtractor),
        FormatTag::Pdf => Box::new(PdfExtractor),
        FormatTag::WordProcessor => Box::new(DocxExtractor),
        FormatTag::Spreadsheet => Box::new(XlsxExtractor),
        FormatTag::Presentation => Box::new(PptxExtractor),
    }
}
