use async_trait::async_trait;
use roxmltree::Node;
use std::io::{Read, Seek};
use std::time::Instant;

use super::ooxml::{relationship_id, Package, RelationshipKind};
use super::Extractor;
use crate::error::DecodeError;
use crate::types::PRESENTATION_EMPTY;

/// Slide titles, body text and speaker notes, one `--- Slide n ---` block per
/// slide. Container-level failures are returned as errors here; turning them
/// into the fallback text is the pipeline's job (see `FailurePolicy`).
pub struct PptxExtractor;

#[async_trait]
impl Extractor for PptxExtractor {
    async fn extract(&self, bytes: &[u8]) -> Result<String, DecodeError> {
        extract_pptx(bytes)
    }
}

#[derive(Debug, Default, PartialEq)]
struct SlideContent {
    title: Option<String>,
    texts: Vec<String>,
    notes: Vec<String>,
}

pub fn extract_pptx(bytes: &[u8]) -> Result<String, DecodeError> {
    let start = Instant::now();
    let mut package = Package::from_bytes(bytes)?;

    let presentation_part = package.main_part()?;
    let presentation_rels = package.relationships(&presentation_part)?;
    let xml = package.read_part(&presentation_part)?;
    let presentation = roxmltree::Document::parse(&xml)?;

    let slide_ids: Vec<String> = presentation
        .descendants()
        .filter(|n| n.has_tag_name("sldId"))
        .filter_map(relationship_id)
        .collect();

    let mut text = String::new();
    for (index, rel_id) in slide_ids.iter().enumerate() {
        let rel = presentation_rels
            .iter()
            .find(|r| &r.id == rel_id && r.is(RelationshipKind::Slide))
            .ok_or_else(|| DecodeError::MissingPart(format!("slide {}", index + 1)))?;
        let slide = read_slide(&mut package, &rel.target)?;

        text.push_str(&format!("\n--- Slide {} ---\n", index + 1));
        if let Some(title) = &slide.title {
            text.push_str(&format!("Title: {}\n", title));
        }
        if !slide.texts.is_empty() {
            text.push_str(&slide.texts.join("\n"));
            text.push('\n');
        }
        if !slide.notes.is_empty() {
            text.push_str("Notes:\n");
            text.push_str(&slide.notes.join("\n"));
            text.push('\n');
        }
        tracing::debug!(slide = index + 1, blocks = slide.texts.len(), "extracted slide");
    }

    tracing::debug!(
        slides = slide_ids.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "extracted presentation"
    );

    if text.trim().is_empty() {
        return Ok(PRESENTATION_EMPTY.to_string());
    }
    Ok(text)
}

fn read_slide<R: Read + Seek>(
    package: &mut Package<R>,
    part: &str,
) -> Result<SlideContent, DecodeError> {
    let xml = package.read_part(part)?;
    let doc = roxmltree::Document::parse(&xml)?;

    let mut slide = SlideContent::default();
    for body in text_bodies(&doc) {
        let block = block_text(body);
        if block.trim().is_empty() {
            continue;
        }
        let is_title = matches!(placeholder_type(body), Some("title" | "ctrTitle"));
        if is_title && slide.title.is_none() {
            slide.title = Some(block);
        } else {
            slide.texts.push(block);
        }
    }

    let notes_part = package
        .relationships(part)?
        .into_iter()
        .find(|r| r.is(RelationshipKind::NotesSlide));
    if let Some(notes) = notes_part {
        let xml = package.read_part(&notes.target)?;
        let doc = roxmltree::Document::parse(&xml)?;
        slide.notes = text_bodies(&doc)
            .filter(|body| placeholder_type(*body) == Some("body"))
            .map(block_text)
            .filter(|block| !block.trim().is_empty())
            .collect();
    }

    Ok(slide)
}

/// Every text body (shapes and table cells) in document order.
fn text_bodies<'a, 'input>(
    doc: &'a roxmltree::Document<'input>,
) -> impl Iterator<Item = Node<'a, 'input>> {
    doc.descendants().filter(|n| n.has_tag_name("txBody"))
}

/// Placeholder type of the shape owning a text body, if it is a placeholder.
fn placeholder_type<'a>(body: Node<'a, '_>) -> Option<&'a str> {
    let shape = body.parent_element()?;
    let properties = shape.children().find(|n| n.has_tag_name("nvSpPr"))?;
    let placeholder = properties.descendants().find(|n| n.has_tag_name("ph"))?;
    // a placeholder without a type is a body placeholder
    Some(placeholder.attribute("type").unwrap_or("body"))
}

/// Paragraphs of a text body joined by newlines.
fn block_text(body: Node) -> String {
    body.children()
        .filter(|n| n.has_tag_name("p"))
        .map(|p| {
            p.descendants()
                .filter(|n| n.is_element())
                .filter_map(|n| match n.tag_name().name() {
                    "t" => n.text(),
                    "br" => Some("\n"),
                    _ => None,
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::ooxml::fixtures::{package, rels};

    const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

    fn shape(ph: Option<&str>, paragraphs: &[&str]) -> String {
        let ph = match ph {
            Some(kind) => format!(r#"<p:nvPr><p:ph type="{}"/></p:nvPr>"#, kind),
            None => "<p:nvPr/>".to_string(),
        };
        let paras: String = paragraphs
            .iter()
            .map(|t| format!("<a:p><a:r><a:t>{}</a:t></a:r></a:p>", t))
            .collect();
        format!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="1" name="s"/><p:cNvSpPr/>{}</p:nvSpPr><p:txBody><a:bodyPr/>{}</p:txBody></p:sp>"#,
            ph, paras
        )
    }

    fn slide_xml(shapes: &[String]) -> String {
        format!(
            r#"<p:sld {}><p:cSld><p:spTree>{}</p:spTree></p:cSld></p:sld>"#,
            NS,
            shapes.concat()
        )
    }

    /// Slides are `(slide xml, optional notes xml)`, listed in deck order but
    /// stored under reversed part names to prove ordering follows sldIdLst.
    fn deck(slides: &[(String, Option<String>)]) -> Vec<u8> {
        let count = slides.len();
        let ids: String = (0..count)
            .map(|i| format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + i, i + 1))
            .collect();
        let presentation = format!(
            r#"<p:presentation {}><p:sldIdLst>{}</p:sldIdLst></p:presentation>"#,
            NS, ids
        );

        let mut owned: Vec<(String, String)> = vec![
            (
                "_rels/.rels".to_string(),
                rels(&[("rId1", "officeDocument", "ppt/presentation.xml")]),
            ),
            ("ppt/presentation.xml".to_string(), presentation),
        ];

        let mut pres_rels = Vec::new();
        for (i, (slide, notes)) in slides.iter().enumerate() {
            let file_no = count - i;
            pres_rels.push((format!("rId{}", i + 1), format!("slides/slide{}.xml", file_no)));
            owned.push((format!("ppt/slides/slide{}.xml", file_no), slide.clone()));
            if let Some(notes) = notes {
                let target = format!("../notesSlides/notesSlide{}.xml", file_no);
                owned.push((
                    format!("ppt/slides/_rels/slide{}.xml.rels", file_no),
                    rels(&[("rId9", "notesSlide", target.as_str())]),
                ));
                owned.push((format!("ppt/notesSlides/notesSlide{}.xml", file_no), notes.clone()));
            }
        }
        let rel_refs: Vec<(&str, &str, &str)> = pres_rels
            .iter()
            .map(|(id, target)| (id.as_str(), "slide", target.as_str()))
            .collect();
        owned.push(("ppt/_rels/presentation.xml.rels".to_string(), rels(&rel_refs)));

        let parts: Vec<(&str, &str)> = owned.iter().map(|(n, c)| (n.as_str(), c.as_str())).collect();
        package(&parts)
    }

    #[test]
    fn test_titles_bodies_and_notes() {
        let first = slide_xml(&[
            shape(Some("ctrTitle"), &["Quarterly Review"]),
            shape(None, &["Revenue up", "Costs down"]),
        ]);
        let notes = format!(
            r#"<p:notes {}><p:cSld><p:spTree>{}{}</p:spTree></p:cSld></p:notes>"#,
            NS,
            shape(Some("sldNum"), &["1"]),
            shape(Some("body"), &["Mention the hiring freeze"]),
        );
        let second = slide_xml(&[shape(Some("body"), &["Questions?"])]);

        let bytes = deck(&[(first, Some(notes)), (second, None)]);
        let text = extract_pptx(&bytes).unwrap();
        assert_eq!(
            text,
            "\n--- Slide 1 ---\nTitle: Quarterly Review\nRevenue up\nCosts down\nNotes:\nMention the hiring freeze\n\
             \n--- Slide 2 ---\nQuestions?\n"
        );
    }

    #[test]
    fn test_deck_without_slides_yields_placeholder() {
        let bytes = deck(&[]);
        assert_eq!(extract_pptx(&bytes).unwrap(), PRESENTATION_EMPTY);
    }

    #[test]
    fn test_empty_shapes_are_skipped() {
        let slide = slide_xml(&[shape(Some("title"), &[" "]), shape(None, &["Only body"])]);
        let bytes = deck(&[(slide, None)]);
        assert_eq!(extract_pptx(&bytes).unwrap(), "\n--- Slide 1 ---\nOnly body\n");
    }

    #[test]
    fn test_corrupt_container_is_an_error() {
        assert!(extract_pptx(b"definitely not a deck").is_err());
    }
}
