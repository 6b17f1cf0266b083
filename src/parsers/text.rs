use async_trait::async_trait;

use super::Extractor;
use crate::error::DecodeError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Best-effort UTF-8 decode; malformed sequences become U+FFFD.
pub struct TextExtractor;

#[async_trait]
impl Extractor for TextExtractor {
    async fn extract(&self, bytes: &[u8]) -> Result<String, DecodeError> {
        Ok(decode_text(bytes))
    }
}

pub fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}
