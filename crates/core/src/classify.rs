//! Deciding which candidate lines are real section titles.
//!
//! The lexical scan lets through numbered captions, running headers,
//! reference entries and equation numbers. A [`TitleClassifier`] removes
//! them; the partitioner only ever sees its output.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::future::Future;
use std::sync::OnceLock;

use pdf::CandidateLine;
use regex::Regex;
use serde::Deserialize;

use crate::generate::Generator;
use crate::prompt::title_identification_messages;
use crate::ReaderError;

/// Candidate lines in, confirmed title strings out (original text,
/// numbering included). Output order carries no meaning.
pub trait TitleClassifier {
    fn classify(
        &self,
        candidates: &[CandidateLine],
    ) -> impl Future<Output = Result<Vec<String>, ReaderError>>;
}

#[derive(Debug, Deserialize)]
struct TitlesResponse {
    titles: Vec<String>,
}

/// Pull the JSON object out of a model reply.
///
/// Strips markdown fences and any commentary around the outermost braces.
/// Whatever remains is returned as-is, valid or not.
pub fn extract_json(response: &str) -> &str {
    let mut text = response.trim();

    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    let text = text.trim();

    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

/// Parse a classification reply of the form `{"titles": [string, ...]}`.
pub fn parse_titles(response: &str) -> Result<Vec<String>, ReaderError> {
    serde_json::from_str::<TitlesResponse>(extract_json(response))
        .map(|parsed| parsed.titles)
        .map_err(|e| ReaderError::ClassificationParse(e.to_string()))
}

// ---------------------------------------------------------------------------
// Model-backed classifier
// ---------------------------------------------------------------------------

/// Asks the generation service to pick the titles, all candidates in one
/// request.
pub struct LlmTitleClassifier<G> {
    generator: G,
}

impl<G: Generator> LlmTitleClassifier<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }
}

impl<G: Generator> TitleClassifier for LlmTitleClassifier<G> {
    async fn classify(&self, candidates: &[CandidateLine]) -> Result<Vec<String>, ReaderError> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<&str> = candidates.iter().map(|c| c.text.as_str()).collect();
        log::info!("classifying {} candidate title lines", texts.len());

        let reply = self
            .generator
            .generate(&title_identification_messages(&texts))
            .await?;
        let titles = parse_titles(&reply)?;

        log::debug!("classifier confirmed {} titles", titles.len());
        Ok(titles)
    }
}

// ---------------------------------------------------------------------------
// Rule-based classifier
// ---------------------------------------------------------------------------

/// Offline heuristics: short, capitalised, unpunctuated lines that are not
/// running headers.
#[derive(Debug, Clone)]
pub struct RuleTitleClassifier {
    /// Longest title, in words, after the leading numeral.
    pub max_words: usize,
    /// A line repeated on this many distinct pages is a running header or
    /// footer and never a title.
    pub running_header_pages: usize,
}

impl Default for RuleTitleClassifier {
    fn default() -> Self {
        Self {
            max_words: 12,
            running_header_pages: 3,
        }
    }
}

fn numbering() -> &'static Regex {
    static NUMBERING: OnceLock<Regex> = OnceLock::new();
    NUMBERING.get_or_init(|| Regex::new(r"^(?:\d+|[IVXLCDM]+)\.?\s+").unwrap())
}

impl RuleTitleClassifier {
    /// Whether one line, taken on its own, reads like a section heading.
    pub fn looks_like_title(&self, line: &str) -> bool {
        let heading = numbering().replace(line.trim(), "");
        let heading = heading.trim();

        let starts_upper = heading.chars().next().is_some_and(char::is_uppercase);
        let words = heading.split_whitespace().count();
        let trailing_punct = heading.ends_with(['.', ',', ';']);
        let markup = heading.contains(['[', ']', '=', '@']);

        starts_upper && words <= self.max_words && !trailing_punct && !markup
    }

    /// Apply the per-line rule and drop running headers. Any other repeated
    /// line (a title echoed by a table of contents, say) is kept once, at its
    /// first occurrence.
    pub fn select(&self, candidates: &[CandidateLine]) -> Vec<String> {
        let mut pages: HashMap<&str, BTreeSet<usize>> = HashMap::new();
        for candidate in candidates {
            pages
                .entry(candidate.text.as_str())
                .or_default()
                .insert(candidate.page);
        }

        let mut seen: HashSet<&str> = HashSet::new();
        candidates
            .iter()
            .filter(|c| pages[c.text.as_str()].len() < self.running_header_pages)
            .filter(|c| seen.insert(c.text.as_str()))
            .filter(|c| self.looks_like_title(&c.text))
            .map(|c| c.text.clone())
            .collect()
    }
}

impl TitleClassifier for RuleTitleClassifier {
    async fn classify(&self, candidates: &[CandidateLine]) -> Result<Vec<String>, ReaderError> {
        Ok(self.select(candidates))
    }
}
