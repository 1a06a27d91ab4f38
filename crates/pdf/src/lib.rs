use thiserror::Error;

use parser::backend::{LopdfBackend, PdfBackend};

pub mod parser;
pub mod titles;
pub mod types;

pub use titles::{scan_candidates, TitlePattern, UnknownTitlePattern};
pub use types::*;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("Document is encrypted")]
    Encrypted,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// A loaded PDF seen two ways: page layout and flat text.
///
/// Both views come from the same bytes but from independent extraction
/// passes, so character offsets in one say nothing about the other. The
/// passes share string decoding and word spacing, so a line of the layout
/// view reads the same in the flat text. Immutable once built.
#[derive(Debug, Clone)]
pub struct Document {
    pages: Vec<Page>,
    flat_text: String,
    metadata: DocumentMetadata,
}

impl Document {
    /// Parse PDF bytes and run both extraction passes. Fails if either does.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PdfError> {
        let backend = LopdfBackend::load_bytes(bytes)?;
        let metadata = extract_metadata(&backend);
        Self::from_backend(&backend, metadata)
    }

    /// Build from any backend; the layout pass runs first, then the flat pass.
    pub fn from_backend(
        backend: &dyn PdfBackend,
        metadata: DocumentMetadata,
    ) -> Result<Self, PdfError> {
        let pages = parser::layout::extract_layout(backend)?;
        let flat_text =
            parser::normalize::normalize_text(&parser::flat::extract_flat_text(backend)?);

        log::info!(
            "extracted {} pages ({} flat text bytes)",
            pages.len(),
            flat_text.len()
        );

        Ok(Document {
            pages,
            flat_text,
            metadata,
        })
    }

    /// Assemble a document from already-extracted views.
    pub fn from_parts(pages: Vec<Page>, flat_text: String, metadata: DocumentMetadata) -> Self {
        Document {
            pages,
            flat_text,
            metadata,
        }
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn flat_text(&self) -> &str {
        &self.flat_text
    }

    pub fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }

    /// Lines of the layout view that match `pattern`.
    pub fn candidate_lines(&self, pattern: &TitlePattern) -> Vec<CandidateLine> {
        scan_candidates(&self.pages, pattern)
    }
}

/// Get document metadata without running text extraction.
pub fn info(bytes: &[u8]) -> Result<DocumentMetadata, PdfError> {
    let backend = LopdfBackend::load_bytes(bytes)?;
    Ok(extract_metadata(&backend))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn extract_metadata(backend: &LopdfBackend) -> DocumentMetadata {
    let mut raw = backend.metadata();
    DocumentMetadata {
        title: raw.remove("Title"),
        author: raw.remove("Author"),
        subject: raw.remove("Subject"),
        creator: raw.remove("Creator"),
        producer: raw.remove("Producer"),
        page_count: backend.page_count(),
    }
}

#[cfg(test)]
mod tests {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream, StringFormat};

    use super::parser::backend::{
        BackendFontInfo, ContentOp, PageId, PdfBackend, SimpleTextDecoder, TextDecoder,
    };
    use super::parser::layout::tests::{text_at, MockBackend};
    use super::*;

    #[test]
    fn from_backend_builds_both_views() {
        let mut ops = text_at("1 Introduction", 72.0, 700.0, 12.0);
        ops.extend(text_at("We study e\u{FB03}cient things.", 72.0, 686.0, 12.0));
        let backend = MockBackend {
            page_ops: vec![ops],
        };

        let doc = Document::from_backend(&backend, DocumentMetadata::default()).unwrap();

        assert_eq!(doc.pages().len(), 1);
        assert_eq!(
            doc.flat_text(),
            "1 Introduction\nWe study efficient things.\n"
        );
        let candidates = doc.candidate_lines(&TitlePattern::Digits);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].text, "1 Introduction");
    }

    #[test]
    fn unreadable_page_fails_the_load() {
        struct Unreadable;
        impl PdfBackend for Unreadable {
            fn pages(&self) -> std::collections::BTreeMap<u32, PageId> {
                [(1, (1, 0))].into_iter().collect()
            }
            fn page_fonts(&self, _: PageId) -> Result<Vec<BackendFontInfo>, PdfError> {
                Ok(vec![])
            }
            fn page_content(&self, _: PageId) -> Result<Vec<u8>, PdfError> {
                Err(PdfError::Parse("broken text layer".into()))
            }
            fn decode_content(&self, _: &[u8]) -> Result<Vec<ContentOp>, PdfError> {
                Ok(vec![])
            }
            fn text_decoder(&self, _: PageId) -> Box<dyn TextDecoder + '_> {
                Box::new(SimpleTextDecoder)
            }
        }

        let err = Document::from_backend(&Unreadable, DocumentMetadata::default()).unwrap_err();
        assert!(err.to_string().contains("broken text layer"));
    }

    fn show(text: &[u8]) -> Operation {
        Operation::new(
            "Tj",
            vec![Object::String(text.to_vec(), StringFormat::Literal)],
        )
    }

    /// A one-page paper set in WinAnsi Helvetica: a title with a curly
    /// apostrophe, a title assembled from two positioned runs, and a
    /// right-hand column sharing a title's baseline.
    fn winansi_paper() -> Vec<u8> {
        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });

        let operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), 700.into()]),
            show(b"1 Introduction"),
            Operation::new("ET", vec![]),
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), 680.into()]),
            show(b"2 Users\x92 Study"),
            Operation::new("Td", vec![248.into(), 0.into()]),
            show(b"right column text"),
            Operation::new("ET", vec![]),
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), 660.into()]),
            show(b"3"),
            Operation::new("Td", vec![12.into(), 0.into()]),
            show(b"Results"),
            Operation::new("ET", vec![]),
        ];
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
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
    fn real_pdf_candidates_are_found_in_flat_text() {
        let doc = Document::from_bytes(&winansi_paper()).unwrap();

        let texts: Vec<String> = doc
            .candidate_lines(&TitlePattern::Digits)
            .into_iter()
            .map(|c| c.text)
            .collect();
        assert_eq!(
            texts,
            vec!["1 Introduction", "2 Users\u{2019} Study", "3 Results"]
        );

        for text in &texts {
            assert!(
                doc.flat_text().contains(text.as_str()),
                "{:?} missing from {:?}",
                text,
                doc.flat_text()
            );
        }
        assert_eq!(doc.metadata().page_count, 1);
    }

    #[test]
    fn real_pdf_columns_stay_apart() {
        let doc = Document::from_bytes(&winansi_paper()).unwrap();

        let lines: Vec<&str> = doc.pages()[0]
            .elements
            .iter()
            .flat_map(|e| e.lines.iter().map(String::as_str))
            .collect();
        assert!(lines.contains(&"2 Users\u{2019} Study"));
        assert!(lines.contains(&"right column text"));
        assert!(doc.flat_text().contains("Study\nright column text"));
    }

    #[test]
    fn garbage_bytes_are_a_parse_error() {
        assert!(matches!(
            Document::from_bytes(b"%PDF-garbage"),
            Err(PdfError::Parse(_))
        ));
        assert!(info(&[]).is_err());
    }
}
