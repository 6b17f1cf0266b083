//! Shared helpers for Office Open XML packages (docx, xlsx, pptx).
//!
//! A package is a zip archive of XML parts linked by relationship files.
//! Part names here are always archive paths without a leading slash.

use std::io::{Cursor, Read, Seek};

use roxmltree::Node;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::DecodeError;

/// Relationship types the extractors follow, matched by suffix so both the
/// transitional and strict schema URIs are accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelationshipKind {
    OfficeDocument,
    Worksheet,
    SharedStrings,
    Slide,
    NotesSlide,
}

impl RelationshipKind {
    fn as_str(&self) -> &'static str {
        match self {
            RelationshipKind::OfficeDocument => "/officeDocument",
            RelationshipKind::Worksheet => "/worksheet",
            RelationshipKind::SharedStrings => "/sharedStrings",
            RelationshipKind::Slide => "/slide",
            RelationshipKind::NotesSlide => "/notesSlide",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    /// Resolved part name the relationship points at
    pub target: String,
}

impl Relationship {
    pub fn is(&self, kind: RelationshipKind) -> bool {
        self.rel_type.ends_with(kind.as_str())
    }
}

pub struct Package<R> {
    archive: ZipArchive<R>,
}

impl<'a> Package<Cursor<&'a [u8]>> {
    pub fn from_bytes(bytes: &'a [u8]) -> Result<Self, DecodeError> {
        Self::new(Cursor::new(bytes))
    }
}

impl<R> Package<R>
where
    R: Read + Seek,
{
    pub fn new(reader: R) -> Result<Self, DecodeError> {
        Ok(Self {
            archive: ZipArchive::new(reader)?,
        })
    }

    /// Read a part, returning `None` when the archive does not contain it.
    pub fn try_read_part(&mut self, name: &str) -> Result<Option<String>, DecodeError> {
        let mut part = match self.archive.by_name(name) {
            Ok(part) => part,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut buffer = String::new();
        part.read_to_string(&mut buffer)?;
        Ok(Some(buffer))
    }

    pub fn read_part(&mut self, name: &str) -> Result<String, DecodeError> {
        self.try_read_part(name)?
            .ok_or_else(|| DecodeError::MissingPart(name.to_string()))
    }

    /// Relationships declared by `part` (use `""` for the package itself).
    /// A part without a relationship file has none.
    pub fn relationships(&mut self, part: &str) -> Result<Vec<Relationship>, DecodeError> {
        let Some(xml) = self.try_read_part(&rels_path(part))? else {
            return Ok(Vec::new());
        };
        let doc = roxmltree::Document::parse(&xml)?;

        let rels = doc
            .descendants()
            .filter(|n| n.has_tag_name("Relationship"))
            .filter(|n| n.attribute("TargetMode") != Some("External"))
            .filter_map(|n| {
                Some(Relationship {
                    id: n.attribute("Id")?.to_string(),
                    rel_type: n.attribute("Type")?.to_string(),
                    target: resolve(part, n.attribute("Target")?),
                })
            })
            .collect();
        Ok(rels)
    }

    /// Name of the package's main part (document.xml, workbook.xml, ...)
    pub fn main_part(&mut self) -> Result<String, DecodeError> {
        self.relationships("")?
            .into_iter()
            .find(|r| r.is(RelationshipKind::OfficeDocument))
            .map(|r| r.target)
            .ok_or_else(|| DecodeError::MissingPart("officeDocument relationship".to_string()))
    }
}

/// Location of the relationship part for `part`.
pub fn rels_path(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None if part.is_empty() => "_rels/.rels".to_string(),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target relative to the part that declares it.
pub fn resolve(base_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = match base_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

/// Value of the `r:id` attribute linking an element to a relationship.
pub fn relationship_id(node: Node) -> Option<String> {
    node.attributes()
        .find(|a| a.name() == "id" && a.namespace().map_or(false, |ns| ns.ends_with("relationships")))
        .map(|a| a.value().to_string())
}

/// Concatenated text of every `t` element below `node`.
pub fn text_of(node: Node) -> String {
    node.descendants()
        .filter(|n| n.has_tag_name("t"))
        .filter_map(|n| n.text())
        .collect()
}


#[cfg(test)]
mod tests {
    use super::fixtures::{package, rels};
    use super::*;

    #[test]
    fn test_rels_path() {
        assert_eq!(rels_path(""), "_rels/.rels");
        assert_eq!(rels_path("xl/workbook.xml"), "xl/_rels/workbook.xml.rels");
        assert_eq!(
            rels_path("ppt/slides/slide1.xml"),
            "ppt/slides/_rels/slide1.xml.rels"
        );
    }

    #[test]
    fn test_resolve() {
        assert_eq!(resolve("", "word/document.xml"), "word/document.xml");
        assert_eq!(resolve("xl/workbook.xml", "worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
        assert_eq!(resolve("xl/workbook.xml", "/xl/worksheets/sheet2.xml"), "xl/worksheets/sheet2.xml");
        assert_eq!(
            resolve("ppt/slides/slide1.xml", "../notesSlides/notesSlide1.xml"),
            "ppt/notesSlides/notesSlide1.xml"
        );
    }

    #[test]
    fn test_main_part_and_missing_parts() {
        let bytes = package(&[(
            "_rels/.rels",
            rels(&[("rId1", "officeDocument", "word/document.xml")]).as_str(),
        )]);
        let mut pkg = Package::from_bytes(&bytes).unwrap();
        assert_eq!(pkg.main_part().unwrap(), "word/document.xml");
        assert!(pkg.try_read_part("word/document.xml").unwrap().is_none());
        assert!(matches!(
            pkg.read_part("word/document.xml"),
            Err(DecodeError::MissingPart(name)) if name == "word/document.xml"
        ));
        assert!(pkg.relationships("word/document.xml").unwrap().is_empty());
    }

    #[test]
    fn test_not_a_zip() {
        assert!(matches!(
            Package::from_bytes(b"plain bytes, not an archive"),
            Err(DecodeError::Archive(_))
        ));
    }
}
