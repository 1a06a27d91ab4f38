//! Flat text: every page's spans in content-stream order.
//!
//! Runs independently of line and block grouping, but joins neighbouring
//! spans with the same [`joint`] rule the layout lines use, so a title
//! reads identically in both views.

use super::backend::PdfBackend;
use super::layout::{extract_page_spans, joint, push_joined, Joint, TextSpan};
use crate::PdfError;

/// Join spans in the order they were painted.
pub fn stream_text(spans: &[TextSpan]) -> String {
    let mut out = String::new();
    let mut prev: Option<&TextSpan> = None;

    for span in spans {
        let link = prev.map_or(Joint::Adjacent, |p| joint(p, span));
        push_joined(&mut out, link, &span.text);
        prev = Some(span);
    }

    out
}

/// Run the flat pass over every page, in page order. Each non-empty page
/// ends with a newline.
pub fn extract_flat_text(backend: &dyn PdfBackend) -> Result<String, PdfError> {
    let mut text = String::new();

    for (&number, &page_id) in &backend.pages() {
        let spans = extract_page_spans(backend, page_id)?;
        let page = stream_text(&spans);
        log::trace!("page {}: {} flat text bytes", number, page.len());

        if !page.is_empty() {
            text.push_str(&page);
            text.push('\n');
        }
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::super::layout::tests::{op, text_at, MockBackend};
    use super::super::backend::PdfValue;
    use super::*;

    #[test]
    fn positioned_runs_get_a_word_gap() {
        // BT /F1 12 Tf 72 660 Td (3) Tj 12 0 Td (Results) Tj ET
        let backend = MockBackend {
            page_ops: vec![vec![
                op("BT", vec![]),
                op(
                    "Tf",
                    vec![PdfValue::Name(b"F1".to_vec()), PdfValue::Integer(12)],
                ),
                op("Td", vec![PdfValue::Integer(72), PdfValue::Integer(660)]),
                op("Tj", vec![PdfValue::Str(b"3".to_vec())]),
                op("Td", vec![PdfValue::Integer(12), PdfValue::Integer(0)]),
                op("Tj", vec![PdfValue::Str(b"Results".to_vec())]),
                op("ET", vec![]),
            ]],
        };

        assert_eq!(extract_flat_text(&backend).unwrap(), "3 Results\n");
    }

    #[test]
    fn baseline_change_is_a_newline() {
        let mut ops = text_at("1 Introduction", 72.0, 700.0, 12.0);
        ops.extend(text_at("We study things.", 72.0, 680.0, 12.0));
        let backend = MockBackend {
            page_ops: vec![ops],
        };

        assert_eq!(
            extract_flat_text(&backend).unwrap(),
            "1 Introduction\nWe study things.\n"
        );
    }

    #[test]
    fn column_jump_is_a_newline() {
        let mut ops = text_at("3 Methods", 72.0, 700.0, 10.0);
        ops.extend(text_at("right column line two", 320.0, 700.0, 10.0));
        let backend = MockBackend {
            page_ops: vec![ops],
        };

        assert_eq!(
            extract_flat_text(&backend).unwrap(),
            "3 Methods\nright column line two\n"
        );
    }

    #[test]
    fn pages_follow_page_order() {
        let backend = MockBackend {
            page_ops: vec![
                text_at("1 Introduction", 72.0, 700.0, 12.0),
                vec![],
                text_at("2 Related Work", 72.0, 700.0, 12.0),
            ],
        };

        assert_eq!(
            extract_flat_text(&backend).unwrap(),
            "1 Introduction\n2 Related Work\n"
        );
    }
}
