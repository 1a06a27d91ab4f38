//! Carving the flat text into sections at confirmed title positions.
//!
//! Titles are located by literal search, not by correlating offsets with
//! the layout view: the two extraction passes do not agree on whitespace.

use serde::{Deserialize, Serialize};

/// Where a confirmed title first occurs in the flat text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TitlePosition {
    /// Byte offset into the flat text.
    pub offset: usize,
    pub title: String,
}

/// One contiguous slice of the document, starting at its title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub text: String,
}

/// Find each title's first literal occurrence and return the hits in
/// document order.
///
/// Titles that never occur are dropped silently. A title that also appears
/// earlier as a substring of unrelated text is anchored at that earlier
/// occurrence.
pub fn locate_titles<S: AsRef<str>>(flat_text: &str, titles: &[S]) -> Vec<TitlePosition> {
    let mut positions: Vec<TitlePosition> = titles
        .iter()
        .map(AsRef::as_ref)
        .filter_map(|title| match flat_text.find(title) {
            Some(offset) if !title.is_empty() => Some(TitlePosition {
                offset,
                title: title.to_string(),
            }),
            _ => {
                log::debug!("title not found in flat text, skipping: {:?}", title);
                None
            }
        })
        .collect();

    positions.sort();
    // Only literally identical titles at the same offset collapse; distinct
    // titles resolving to one offset both survive.
    positions.dedup();
    positions
}

/// Split `flat_text` into sections, one per located title.
///
/// Each section runs from its title's offset up to the next title's offset,
/// the last one to the end of the text. Slices are trimmed. Text before the
/// first title belongs to no section.
pub fn partition<S: AsRef<str>>(flat_text: &str, titles: &[S]) -> Vec<Section> {
    let positions = locate_titles(flat_text, titles);

    let ends = positions
        .iter()
        .skip(1)
        .map(|p| p.offset)
        .chain(std::iter::once(flat_text.len()));

    positions
        .iter()
        .zip(ends)
        .map(|(position, end)| Section {
            title: position.title.clone(),
            text: flat_text[position.offset..end].trim().to_string(),
        })
        .collect()
}
