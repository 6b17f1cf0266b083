use async_trait::async_trait;
use roxmltree::Node;
use std::time::Instant;

use super::ooxml::Package;
use super::Extractor;
use crate::error::DecodeError;

/// Raw text of a word-processor document. Formatting is discarded; every
/// paragraph is followed by a blank line.
pub struct DocxExtractor;

#[async_trait]
impl Extractor for DocxExtractor {
    async fn extract(&self, bytes: &[u8]) -> Result<String, DecodeError> {
        extract_docx(bytes)
    }
}

pub fn extract_docx(bytes: &[u8]) -> Result<String, DecodeError> {
    let start = Instant::now();
    let mut package = Package::from_bytes(bytes)?;

    let doc_name = package.main_part()?;
    tracing::debug!(part = %doc_name, "found main document part");

    let buffer = package.read_part(&doc_name)?;
    let doc = roxmltree::Document::parse(&buffer)?;

    let body = doc
        .root_element()
        .children()
        .find(|n| n.has_tag_name("body"))
        .ok_or_else(|| DecodeError::Malformed("document has no body".to_string()))?;

    let mut text = String::new();
    collect_blocks(body, &mut text);

    tracing::debug!(
        chars = text.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "extracted word document"
    );
    Ok(text)
}

/// Walk block-level content, emitting one entry per paragraph.
fn collect_blocks(node: Node, out: &mut String) {
    for child in node.children().filter(|n| n.is_element()) {
        if child.has_tag_name("p") {
            let mut paragraph = String::new();
            let mut nested = String::new();
            collect_runs(child, &mut paragraph, &mut nested);
            out.push_str(&paragraph);
            out.push_str("\n\n");
            out.push_str(&nested);
        } else {
            collect_blocks(child, out);
        }
    }
}

/// Inline content of a paragraph. Text boxes anchored in the paragraph hold
/// their own paragraphs, which go to `nested` so they follow their host.
fn collect_runs(node: Node, paragraph: &mut String, nested: &mut String) {
    for child in node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "t" => paragraph.push_str(child.text().unwrap_or("")),
            "tab" => paragraph.push('\t'),
            "br" | "cr" => paragraph.push('\n'),
            "txbxContent" => collect_blocks(child, nested),
            // properties carry tab stop definitions, not tabs
            "pPr" | "rPr" => {}
            // VML copy of content already present in the DrawingML choice
            "Fallback" => {}
            _ => collect_runs(child, paragraph, nested),
        }
    }
}
