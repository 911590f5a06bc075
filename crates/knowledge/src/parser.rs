//! Document format detection and text extraction.

use docqa_core::{AppError, AppResult};
use std::path::Path;

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Supported upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Markdown,
    PlainText,
}

impl DocumentFormat {
    /// Detect the format from the filename extension and leading bytes.
    ///
    /// A `.pdf` name must carry the `%PDF-` header; bytes with the header
    /// are treated as PDF whatever the name says.
    pub fn detect(filename: &str, bytes: &[u8]) -> AppResult<Self> {
        if bytes.starts_with(PDF_MAGIC) {
            return Ok(Self::Pdf);
        }

        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("pdf") => Err(AppError::Extraction(format!(
                "{} is not a valid PDF (missing %PDF- header)",
                filename
            ))),
            Some("md") | Some("markdown") => Ok(Self::Markdown),
            Some("txt") | Some("text") => Ok(Self::PlainText),
            _ => Err(AppError::Extraction(format!(
                "Unsupported file type: {} (expected .pdf, .txt or .md)",
                filename
            ))),
        }
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Markdown => "markdown",
            Self::PlainText => "text",
        }
    }
}

/// Text extracted from a document, one entry per page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub pages: Vec<String>,
}

impl ExtractedText {
    /// Page texts joined in document order.
    pub fn joined(&self) -> String {
        self.pages.join("\n")
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Extract text from raw document bytes.
pub fn extract_text(bytes: &[u8], format: DocumentFormat) -> AppResult<ExtractedText> {
    let pages = match format {
        DocumentFormat::Pdf => extract_pdf(bytes)?,
        DocumentFormat::Markdown => vec![clean_markdown(&decode_utf8(bytes)?)],
        DocumentFormat::PlainText => vec![decode_utf8(bytes)?],
    };

    Ok(ExtractedText { pages })
}

fn extract_pdf(bytes: &[u8]) -> AppResult<Vec<String>> {
    let document = lopdf::Document::load_mem(bytes)
        .map_err(|e| AppError::Extraction(format!("Failed to parse PDF: {}", e)))?;

    let page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();
    if page_numbers.is_empty() {
        return Err(AppError::Extraction("PDF contains no pages".to_string()));
    }

    let mut pages = Vec::with_capacity(page_numbers.len());
    for number in page_numbers {
        match document.extract_text(&[number]) {
            Ok(text) => pages.push(text),
            Err(e) => {
                // Unreadable pages (image-only scans) contribute no text
                tracing::warn!(page = number, "Failed to extract page text: {}", e);
                pages.push(String::new());
            }
        }
    }

    tracing::debug!("Extracted text from {} PDF pages", pages.len());
    Ok(pages)
}

fn decode_utf8(bytes: &[u8]) -> AppResult<String> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| AppError::Extraction(format!("File is not valid UTF-8 text: {}", e)))?;

    if text.contains('\0') {
        return Err(AppError::Extraction(
            "Binary content is not supported".to_string(),
        ));
    }

    Ok(text.to_string())
}

/// Clean markdown by removing heading markers and fence lines.
fn clean_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for line in text.lines() {
        let trimmed = line.trim_start_matches('#').trim();

        // Skip horizontal rules and code fences
        if trimmed.starts_with("---") || trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            continue;
        }

        if !trimmed.is_empty() {
            result.push_str(trimmed);
            result.push('\n');
        }
    }

    result.trim().to_string()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    /// Build an in-memory PDF with one page per entry of `pages`.
    pub(crate) fn build_pdf(pages: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_detect_by_magic_and_extension() {
        assert_eq!(
            DocumentFormat::detect("report.pdf", b"%PDF-1.7 ...").unwrap(),
            DocumentFormat::Pdf
        );
        assert_eq!(
            DocumentFormat::detect("upload.bin", b"%PDF-1.4").unwrap(),
            DocumentFormat::Pdf
        );
        assert_eq!(
            DocumentFormat::detect("README.MD", b"# hi").unwrap(),
            DocumentFormat::Markdown
        );
        assert_eq!(
            DocumentFormat::detect("notes.txt", b"hi").unwrap(),
            DocumentFormat::PlainText
        );
    }

    #[test]
    fn test_fake_pdf_is_extraction_error() {
        let err = DocumentFormat::detect("fake.pdf", b"PK\x03\x04 zip data").unwrap_err();
        assert_eq!(err.kind(), "extraction_error");
    }

    #[test]
    fn test_unsupported_extension() {
        let err = DocumentFormat::detect("photo.png", b"\x89PNG").unwrap_err();
        assert!(err.to_string().contains("Unsupported file type"));
    }

    #[test]
    fn test_extract_pdf_pages_in_order() {
        let bytes = build_pdf(&["First page text", "Second page text"]);
        let extracted = extract_text(&bytes, DocumentFormat::Pdf).unwrap();

        assert_eq!(extracted.page_count(), 2);
        assert!(extracted.pages[0].contains("First page text"));
        assert!(extracted.pages[1].contains("Second page text"));

        let joined = extracted.joined();
        assert!(joined.find("First").unwrap() < joined.find("Second").unwrap());
    }

    #[test]
    fn test_corrupted_pdf_is_extraction_error() {
        let mut bytes = b"%PDF-1.5\n".to_vec();
        bytes.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef, 0x00, 0x01]);

        let err = extract_text(&bytes, DocumentFormat::Pdf).unwrap_err();
        assert!(matches!(err, AppError::Extraction(_)));
    }

    #[test]
    fn test_invalid_utf8_text() {
        let err = extract_text(&[0xff, 0xfe, 0xfd], DocumentFormat::PlainText).unwrap_err();
        assert!(matches!(err, AppError::Extraction(_)));
    }

    #[test]
    fn test_clean_markdown() {
        let input = "# Header\n\nSome text\n\n```rust\ncode\n```\n\nMore text";
        let output = clean_markdown(input);
        assert!(output.contains("Header"));
        assert!(output.contains("Some text"));
        assert!(output.contains("code"));
        assert!(!output.contains("```"));
        assert!(!output.contains('#'));
    }
}
