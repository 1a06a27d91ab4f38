//! Candidate section-title discovery over the layout view.
//!
//! A [`TitlePattern`] is a plain value handed to [`scan_candidates`], so two
//! documents with different numbering conventions never share state.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::{CandidateLine, Page};

/// Lexical shape of a top-level section title line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TitlePattern {
    /// `3. Methods`
    DigitsDot,
    /// `3 Methods`
    #[default]
    Digits,
    /// `III. Methods` or `III Methods`
    Roman,
}

impl TitlePattern {
    pub const ALL: [TitlePattern; 3] = [Self::DigitsDot, Self::Digits, Self::Roman];

    fn regex(&self) -> &'static Regex {
        static DIGITS_DOT: OnceLock<Regex> = OnceLock::new();
        static DIGITS: OnceLock<Regex> = OnceLock::new();
        static ROMAN: OnceLock<Regex> = OnceLock::new();

        let (cell, source) = match self {
            Self::DigitsDot => (&DIGITS_DOT, r"^\d+\.\s+.+"),
            Self::Digits => (&DIGITS, r"^\d+\s+.+"),
            Self::Roman => (&ROMAN, r"^[IVXLCDM]+\.?\s+.+"),
        };
        cell.get_or_init(|| Regex::new(source).expect("title pattern regex is valid"))
    }

    /// Whether `line` looks like a title line under this pattern.
    pub fn is_match(&self, line: &str) -> bool {
        self.regex().is_match(line)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DigitsDot => "digits-dot",
            Self::Digits => "digits",
            Self::Roman => "roman",
        }
    }
}

impl fmt::Display for TitlePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown title pattern '{0}' (expected digits-dot, digits or roman)")]
pub struct UnknownTitlePattern(pub String);

impl FromStr for TitlePattern {
    type Err = UnknownTitlePattern;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownTitlePattern(s.to_string()))
    }
}

/// Collect every layout line matching `pattern`, in page order and then
/// in-page order. Repeated lines are all kept.
pub fn scan_candidates(pages: &[Page], pattern: &TitlePattern) -> Vec<CandidateLine> {
    let mut candidates = Vec::new();

    for page in pages {
        for element in &page.elements {
            for line in element.text().split('\n') {
                if pattern.is_match(line) {
                    candidates.push(CandidateLine {
                        text: line.to_string(),
                        page: page.number,
                        order: candidates.len(),
                    });
                }
            }
        }
    }

    log::debug!(
        "{} candidate title lines matched pattern '{}'",
        candidates.len(),
        pattern
    );
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TextElement;

    fn page(number: usize, blocks: &[&[&str]]) -> Page {
        Page {
            number,
            elements: blocks
                .iter()
                .map(|lines| TextElement {
                    lines: lines.iter().map(|l| l.to_string()).collect(),
                })
                .collect(),
        }
    }

    #[test]
    fn digits_dot_pattern() {
        let p = TitlePattern::DigitsDot;
        assert!(p.is_match("3. Methods"));
        assert!(p.is_match("12.  Conclusion and Future Work"));
        assert!(!p.is_match("3 Methods"));
        assert!(!p.is_match("3.1 Sampling"));
        assert!(!p.is_match("Section 3: Methods"));
    }

    #[test]
    fn digits_pattern() {
        let p = TitlePattern::Digits;
        assert!(p.is_match("3 Methods"));
        assert!(!p.is_match("3. Methods"));
        assert!(!p.is_match("A Methods"));
        assert!(!p.is_match("3"));
    }

    #[test]
    fn roman_pattern() {
        let p = TitlePattern::Roman;
        assert!(p.is_match("III. Methods"));
        assert!(p.is_match("IV Results"));
        assert!(!p.is_match("3. Methods"));
        assert!(!p.is_match("iii. methods"));
    }

    #[test]
    fn parse_and_display_round_trip_names() {
        for p in TitlePattern::ALL {
            assert_eq!(p.to_string().parse::<TitlePattern>().unwrap(), p);
        }
        assert!("dotted".parse::<TitlePattern>().is_err());
        assert_eq!(TitlePattern::default(), TitlePattern::Digits);
    }

    #[test]
    fn scan_preserves_encounter_order_across_pages() {
        let pages = vec![
            page(1, &[&["Paper title", "1 Introduction"], &["Body text"]]),
            page(2, &[&["2 Methods", "more body"], &["3 Results"]]),
        ];

        let candidates = scan_candidates(&pages, &TitlePattern::Digits);
        let texts: Vec<&str> = candidates.iter().map(|c| c.text.as_str()).collect();

        assert_eq!(texts, vec!["1 Introduction", "2 Methods", "3 Results"]);
        assert_eq!(candidates[0].page, 1);
        assert_eq!(candidates[2].page, 2);
        assert_eq!(
            candidates.iter().map(|c| c.order).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn scan_keeps_duplicates() {
        let pages = vec![
            page(1, &[&["2 Journal of Things"], &["1 Introduction"]]),
            page(2, &[&["2 Journal of Things"]]),
        ];

        let candidates = scan_candidates(&pages, &TitlePattern::Digits);
        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates[0].text, candidates[2].text);
    }

    #[test]
    fn pattern_is_per_call() {
        let pages = vec![page(1, &[&["1. Introduction", "II Background"]])];

        assert_eq!(scan_candidates(&pages, &TitlePattern::DigitsDot).len(), 1);
        assert_eq!(scan_candidates(&pages, &TitlePattern::Roman).len(), 1);
        assert!(scan_candidates(&pages, &TitlePattern::Digits).is_empty());
    }
}
