//! Drives one extraction: format dispatch, decode, failure policy.

use std::collections::HashMap;
use std::time::Instant;

use crate::error::ExtractionError;
use crate::parsers::{extractor_for, Extractor};
use crate::types::{Document, FailurePolicy, FormatTag};
use crate::utils::parse_format;

pub struct ExtractionPipeline {
    extractors: HashMap<FormatTag, Box<dyn Extractor>>,
}

impl Default for ExtractionPipeline {
    fn default() -> Self {
        Self {
            extractors: FormatTag::ALL
                .into_iter()
                .map(|format| (format, extractor_for(format)))
                .collect(),
        }
    }
}

impl ExtractionPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the handler for a format.
    pub fn with_extractor(mut self, format: FormatTag, extractor: Box<dyn Extractor>) -> Self {
        self.extractors.insert(format, extractor);
        self
    }

    /// Extract a file into a new `Document`. The format comes from the file
    /// name; unrecognized extensions fail before any decoding starts.
    pub async fn run(&self, file_name: &str, bytes: &[u8]) -> Result<Document, ExtractionError> {
        let format = parse_format(file_name)?;

        let start = Instant::now();
        let text = self.extract(bytes, format).await?;
        let document = Document::new(file_name, format, text);

        tracing::info!(
            file = file_name,
            format = %format,
            bytes = bytes.len(),
            chars = document.text.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "extracted document"
        );
        if document.is_blank() {
            tracing::warn!(file = file_name, "extraction produced no text");
        }
        Ok(document)
    }

    /// Decode `bytes` as `format`, applying the format's failure policy.
    pub async fn extract(&self, bytes: &[u8], format: FormatTag) -> Result<String, ExtractionError> {
        let extractor = self.extractors.get(&format).ok_or_else(|| {
            ExtractionError::UnsupportedFormat(format.extensions()[0].to_string())
        })?;

        match extractor.extract(bytes).await {
            Ok(text) => Ok(text),
            Err(cause) => match format.failure_policy() {
                FailurePolicy::Fallback(text) => {
                    tracing::warn!(format = %format, error = %cause, "decode failed, using fallback text");
                    Ok(text.to_string())
                }
                FailurePolicy::Propagate => Err(ExtractionError::Decode { format, cause }),
            },
        }
    }
}
