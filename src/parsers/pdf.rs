use async_trait::async_trait;
use std::panic;
use std::time::Instant;

use super::Extractor;
use crate::error::DecodeError;

/// Page-addressable view of a decoded PDF container.
#[async_trait]
pub trait PageSource: Send {
    /// Number of pages in the container.
    fn page_count(&self) -> usize;

    /// Ordered text runs of a 1-based page.
    async fn page_runs(&mut self, page: usize) -> Result<Vec<String>, DecodeError>;
}

/// A PDF decoded in memory by `pdf-extract`.
pub struct LoadedPdf {
    pages: Vec<String>,
}

impl LoadedPdf {
    pub fn load(bytes: &[u8]) -> Result<Self, DecodeError> {
        // pdf-extract panics on some malformed inputs; report those as decode errors
        let decoded = panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes));
        match decoded {
            Ok(Ok(pages)) => Ok(Self { pages }),
            Ok(Err(e)) => Err(DecodeError::Pdf(e.to_string())),
            Err(_) => Err(DecodeError::Pdf(
                "PDF decoder aborted on malformed input".to_string(),
            )),
        }
    }
}

#[async_trait]
impl PageSource for LoadedPdf {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    async fn page_runs(&mut self, page: usize) -> Result<Vec<String>, DecodeError> {
        let content = page
            .checked_sub(1)
            .and_then(|i| self.pages.get(i))
            .ok_or_else(|| DecodeError::Pdf(format!("page {} out of range", page)))?;

        Ok(content
            .lines()
            .map(str::trim)
            .filter(|run| !run.is_empty())
            .map(str::to_string)
            .collect())
    }
}

/// Walk the pages strictly in order, emitting a `--- Page n ---` block for
/// each. Any page failure aborts the whole extraction.
pub async fn extract_pages<S>(source: &mut S) -> Result<String, DecodeError>
where
    S: PageSource + ?Sized,
{
    let mut text = String::new();
    for page in 1..=source.page_count() {
        let runs = source.page_runs(page).await?;
        text.push_str(&format!("\n--- Page {} ---\n", page));
        text.push_str(&runs.join(" "));
        text.push_str("\n\n");
        tracing::debug!(page, runs = runs.len(), "extracted page");
        tokio::task::yield_now().await;
    }
    Ok(text)
}

pub struct PdfExtractor;

#[async_trait]
impl Extractor for PdfExtractor {
    async fn extract(&self, bytes: &[u8]) -> Result<String, DecodeError> {
        let start = Instant::now();
        let mut pdf = LoadedPdf::load(bytes)?;
        tracing::debug!(
            pages = pdf.page_count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "decoded PDF container"
        );
        extract_pages(&mut pdf).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakePages {
        pages: Vec<Vec<&'static str>>,
        fail_on: Option<usize>,
        requested: Vec<usize>,
    }

    impl FakePages {
        fn new(pages: Vec<Vec<&'static str>>) -> Self {
            Self {
                pages,
                fail_on: None,
                requested: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl PageSource for FakePages {
        fn page_count(&self) -> usize {
            self.pages.len()
        }

        async fn page_runs(&mut self, page: usize) -> Result<Vec<String>, DecodeError> {
            self.requested.push(page);
            if self.fail_on == Some(page) {
                return Err(DecodeError::Pdf(format!("bad content stream on page {}", page)));
            }
            Ok(self.pages[page - 1].iter().map(|s| s.to_string()).collect())
        }
    }

    #[tokio::test]
    async fn test_two_pages_in_order() {
        let mut source = FakePages::new(vec![vec!["Alpha"], vec!["Beta"]]);
        let text = extract_pages(&mut source).await.unwrap();

        assert_eq!(text, "\n--- Page 1 ---\nAlpha\n\n\n--- Page 2 ---\nBeta\n\n");
        let alpha = text.find("Alpha").unwrap();
        let beta = text.find("Beta").unwrap();
        assert!(text.find("--- Page 1 ---").unwrap() < alpha);
        assert!(alpha < text.find("--- Page 2 ---").unwrap());
        assert!(alpha < beta);
        assert_eq!(source.requested, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_runs_joined_with_single_space() {
        let mut source = FakePages::new(vec![vec!["Quarterly", "report", "2024"]]);
        let text = extract_pages(&mut source).await.unwrap();
        assert_eq!(text, "\n--- Page 1 ---\nQuarterly report 2024\n\n");
    }

    #[tokio::test]
    async fn test_page_failure_aborts_extraction() {
        let mut source = FakePages::new(vec![vec!["one"], vec!["two"], vec!["three"]]);
        source.fail_on = Some(2);
        let err = extract_pages(&mut source).await.unwrap_err();

        assert!(err.to_string().contains("page 2"));
        assert_eq!(source.requested, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_empty_document_has_no_pages() {
        let mut source = FakePages::new(Vec::new());
        assert_eq!(extract_pages(&mut source).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_loaded_pages_split_into_runs() {
        let mut pdf = LoadedPdf {
            pages: vec!["  Title line \n\n body text\n".to_string()],
        };
        assert_eq!(pdf.page_count(), 1);
        assert_eq!(pdf.page_runs(1).await.unwrap(), vec!["Title line", "body text"]);
        assert!(pdf.page_runs(2).await.is_err());
        assert!(pdf.page_runs(0).await.is_err());
    }

    /// Minimal PDF with one line of Helvetica text per page and a correct
    /// cross-reference table.
    fn text_pdf(pages: &[&str]) -> Vec<u8> {
        let page_count = pages.len();
        let font_id = 3 + page_count;
        let kids: Vec<String> = (0..page_count).map(|i| format!("{} 0 R", 3 + i)).collect();

        let mut objects = vec![
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids.join(" "), page_count),
        ];
        for i in 0..page_count {
            objects.push(format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Resources << /Font << /F1 {} 0 R >> >> /Contents {} 0 R >>",
                font_id,
                font_id + 1 + i
            ));
        }
        objects.push("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>".to_string());
        for text in pages {
            let content = format!("BT /F1 24 Tf 72 700 Td ({}) Tj ET", text);
            objects.push(format!(
                "<< /Length {} >>\nstream\n{}\nendstream",
                content.len(),
                content
            ));
        }

        let mut pdf = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        for (i, object) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, object).as_bytes());
        }

        let xref = pdf.len();
        let mut table = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
        for offset in offsets {
            table.push_str(&format!("{:010} 00000 n \n", offset));
        }
        table.push_str(&format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref
        ));
        pdf.extend_from_slice(table.as_bytes());
        pdf
    }

    #[tokio::test]
    async fn test_real_pdf_pages_in_order() {
        let bytes = text_pdf(&["Alpha", "Beta"]);

        let pdf = LoadedPdf::load(&bytes).unwrap();
        assert_eq!(pdf.page_count(), 2);

        let text = PdfExtractor.extract(&bytes).await.unwrap();
        assert_eq!(text, "\n--- Page 1 ---\nAlpha\n\n\n--- Page 2 ---\nBeta\n\n");
    }

    #[tokio::test]
    async fn test_garbage_bytes_are_a_decode_error() {
        let result = PdfExtractor.extract(b"%PDF-1.4 truncated garbage").await;
        assert!(matches!(result, Err(DecodeError::Pdf(_))));
    }
}
