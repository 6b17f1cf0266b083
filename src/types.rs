use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity assigned to a document when it is extracted
pub type DocumentId = Uuid;

/// Supported document formats, derived once from the file extension
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormatTag {
    /// Plain text and CSV (.txt, .csv)
    PlainText,
    /// Portable Document Format (.pdf)
    Pdf,
    /// Word processor document (.doc, .docx)
    WordProcessor,
    /// Spreadsheet workbook (.xls, .xlsx)
    Spreadsheet,
    /// Presentation deck (.ppt, .pptx)
    Presentation,
}

/// What an extractor does when decoding fails
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Report the failure to the pipeline
    Propagate,
    /// Swallow the failure and return this text instead
    Fallback(&'static str),
}

pub const PRESENTATION_FALLBACK: &str =
    "Unable to extract PowerPoint text. Please check file format.";

pub const PRESENTATION_EMPTY: &str = "No readable text found in this presentation.";

impl FormatTag {
    pub const ALL: [FormatTag; 5] = [
        FormatTag::PlainText,
        FormatTag::Pdf,
        FormatTag::WordProcessor,
        FormatTag::Spreadsheet,
        FormatTag::Presentation,
    ];

    /// Map a bare extension (no dot, any case) to its format
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "txt" | "csv" => Some(FormatTag::PlainText),
            "pdf" => Some(FormatTag::Pdf),
            "doc" | "docx" => Some(FormatTag::WordProcessor),
            "xls" | "xlsx" => Some(FormatTag::Spreadsheet),
            "ppt" | "pptx" => Some(FormatTag::Presentation),
            _ => None,
        }
    }

    /// Extensions recognized for this format
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            FormatTag::PlainText => &["txt", "csv"],
            FormatTag::Pdf => &["pdf"],
            FormatTag::WordProcessor => &["doc", "docx"],
            FormatTag::Spreadsheet => &["xls", "xlsx"],
            FormatTag::Presentation => &["ppt", "pptx"],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FormatTag::PlainText => "Plain text",
            FormatTag::Pdf => "PDF document",
            FormatTag::WordProcessor => "Word document",
            FormatTag::Spreadsheet => "Spreadsheet",
            FormatTag::Presentation => "Presentation",
        }
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        match self {
            FormatTag::Presentation => FailurePolicy::Fallback(PRESENTATION_FALLBACK),
            _ => FailurePolicy::Propagate,
        }
    }
}

impl std::fmt::Display for FormatTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A file converted into normalized text. Immutable once created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub name: String,
    pub format: FormatTag,
    pub text: String,
}

impl Document {
    pub fn new(name: impl Into<String>, format: FormatTag, text: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            format,
            text,
        }
    }

    /// True when extraction produced no visible characters
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension() {
        assert_eq!(FormatTag::from_extension("TXT"), Some(FormatTag::PlainText));
        assert_eq!(FormatTag::from_extension("csv"), Some(FormatTag::PlainText));
        assert_eq!(FormatTag::from_extension("Pdf"), Some(FormatTag::Pdf));
        assert_eq!(FormatTag::from_extension("doc"), Some(FormatTag::WordProcessor));
        assert_eq!(FormatTag::from_extension("XLSX"), Some(FormatTag::Spreadsheet));
        assert_eq!(FormatTag::from_extension("ppt"), Some(FormatTag::Presentation));
        assert_eq!(FormatTag::from_extension("md"), None);
        assert_eq!(FormatTag::from_extension(""), None);
    }

    #[test]
    fn test_extensions_round_trip_to_their_format() {
        for format in FormatTag::ALL {
            for ext in format.extensions() {
                assert_eq!(FormatTag::from_extension(ext), Some(format));
            }
        }
    }

    #[test]
    fn test_only_presentation_swallows_failures() {
        for format in FormatTag::ALL {
            let policy = format.failure_policy();
            if format == FormatTag::Presentation {
                assert_eq!(policy, FailurePolicy::Fallback(PRESENTATION_FALLBACK));
            } else {
                assert_eq!(policy, FailurePolicy::Propagate);
            }
        }
    }

    #[test]
    fn test_documents_get_fresh_ids() {
        let a = Document::new("a.txt", FormatTag::PlainText, "x".into());
        let b = Document::new("a.txt", FormatTag::PlainText, "x".into());
        assert_ne!(a.id, b.id);
        assert!(!a.is_blank());
        assert!(Document::new("b.txt", FormatTag::PlainText, " \n".into()).is_blank());
    }
}
