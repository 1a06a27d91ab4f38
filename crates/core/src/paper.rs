use pdf::{CandidateLine, Document, DocumentMetadata, TitlePattern};

use crate::classify::TitleClassifier;
use crate::generate::Generator;
use crate::partition::{partition, Section};
use crate::prompt::format_key_points;
use crate::summarize::{CostEstimate, ProgressFn, SectionSummary, Summarizer};
use crate::tokens::TokenCounter;
use crate::ReaderError;

/// One research paper: its extracted text, its sections once partitioned,
/// and the summaries produced so far.
///
/// Sections are computed lazily and cached; [`Paper::clear_sections`]
/// forces the next read to recompute them.
#[derive(Debug, Clone)]
pub struct Paper {
    document: Document,
    pattern: TitlePattern,
    sections: Option<Vec<Section>>,
    summaries: Vec<SectionSummary>,
}

impl Paper {
    pub fn new(document: Document, pattern: TitlePattern) -> Self {
        Paper {
            document,
            pattern,
            sections: None,
            summaries: Vec::new(),
        }
    }

    /// Load and extract a paper from PDF bytes.
    pub fn from_bytes(bytes: &[u8], pattern: TitlePattern) -> Result<Self, ReaderError> {
        Ok(Self::new(Document::from_bytes(bytes)?, pattern))
    }

    pub fn pattern(&self) -> TitlePattern {
        self.pattern
    }

    pub fn metadata(&self) -> &DocumentMetadata {
        self.document.metadata()
    }

    pub fn flat_text(&self) -> &str {
        self.document.flat_text()
    }

    pub fn candidate_lines(&self) -> Vec<CandidateLine> {
        self.document.candidate_lines(&self.pattern)
    }

    pub fn sections(&self) -> Option<&[Section]> {
        self.sections.as_deref()
    }

    pub fn clear_sections(&mut self) {
        self.sections = None;
    }

    /// Partition the flat text at `titles` and cache the result.
    pub fn split_by_titles<S: AsRef<str>>(&mut self, titles: &[S]) -> &[Section] {
        let sections = partition(self.document.flat_text(), titles);
        log::info!("partitioned paper into {} sections", sections.len());
        self.sections.insert(sections)
    }

    /// Scan for candidates and let `classifier` pick the real titles.
    pub async fn identify_titles<C: TitleClassifier>(
        &self,
        classifier: &C,
    ) -> Result<Vec<String>, ReaderError> {
        let candidates = self.candidate_lines();
        log::debug!(
            "found {} candidate lines with pattern {}",
            candidates.len(),
            self.pattern
        );
        classifier.classify(&candidates).await
    }

    /// Cached sections, computing them first if needed.
    pub async fn ensure_sections<C: TitleClassifier>(
        &mut self,
        classifier: &C,
    ) -> Result<&[Section], ReaderError> {
        if self.sections.is_none() {
            let titles = self.identify_titles(classifier).await?;
            self.split_by_titles(&titles);
        }
        Ok(self.sections.as_deref().unwrap_or_default())
    }

    /// Summarize every section, in order, storing each summary as soon as
    /// it is complete.
    ///
    /// A failure aborts the read; summaries stored before it are kept.
    pub async fn read_paper<C, G, T>(
        &mut self,
        classifier: &C,
        summarizer: &Summarizer<G, T>,
        key_points: &[String],
        mut progress: Option<&mut ProgressFn<'_>>,
    ) -> Result<(), ReaderError>
    where
        C: TitleClassifier,
        G: Generator,
        T: TokenCounter,
    {
        self.ensure_sections(classifier).await?;
        let key_points = format_key_points(key_points);

        let sections = self.sections.as_deref().unwrap_or_default();
        for section in sections {
            let summary = summarizer
                .summarize_section(section, &key_points, progress.as_deref_mut())
                .await?;
            upsert(&mut self.summaries, &section.title, summary);
        }

        Ok(())
    }

    pub fn summaries(&self) -> &[SectionSummary] {
        &self.summaries
    }

    pub fn summary(&self, title: &str) -> Option<&str> {
        self.summaries
            .iter()
            .find(|s| s.title == title)
            .map(|s| s.summary.as_str())
    }

    /// Price a read of the cached sections.
    pub fn estimate_cost<G: Generator, T: TokenCounter>(
        &self,
        summarizer: &Summarizer<G, T>,
        key_points: &[String],
        dollars_per_k_tokens: f64,
    ) -> Result<CostEstimate, ReaderError> {
        let sections = self.sections.as_deref().ok_or(ReaderError::NotPartitioned)?;
        Ok(summarizer.estimate_cost(
            sections,
            &format_key_points(key_points),
            dollars_per_k_tokens,
        ))
    }
}

/// Replace the summary stored under `title`, or append a new one.
fn upsert(summaries: &mut Vec<SectionSummary>, title: &str, summary: String) {
    match summaries.iter_mut().find(|s| s.title == title) {
        Some(existing) => existing.summary = summary,
        None => summaries.push(SectionSummary {
            title: title.to_string(),
            summary,
        }),
    }
}

#[cfg(test)]
mod tests {
    use pdf::{Page, TextElement};

    use super::*;
    use crate::classify::{LlmTitleClassifier, RuleTitleClassifier};
    use crate::generate::tests::ScriptedGenerator;
    use crate::tokens::EstimateTokenCounter;

    const FLAT: &str = "A Study of Things\n1 Introduction\nWe begin.\n2 Methods\nWe sample.\n\
3 Results\nIt works.\n1 Smith, J. Things. 2020.";

    fn paper() -> Paper {
        let lines = [
            "A Study of Things",
            "1 Introduction",
            "We begin.",
            "2 Methods",
            "We sample.",
            "3 Results",
            "It works.",
            "1 Smith, J. Things. 2020.",
        ];
        let page = Page {
            number: 1,
            elements: lines
                .iter()
                .map(|line| TextElement {
                    lines: vec![line.to_string()],
                })
                .collect(),
        };
        let document = Document::from_parts(vec![page], FLAT.to_string(), DocumentMetadata::default());
        Paper::new(document, TitlePattern::Digits)
    }

    fn summarizer(replies: &[&str]) -> Summarizer<ScriptedGenerator, EstimateTokenCounter> {
        Summarizer::new(ScriptedGenerator::new(replies.iter().copied()), EstimateTokenCounter)
    }

    #[test]
    fn candidates_come_from_the_layout_view() {
        let texts: Vec<String> = paper().candidate_lines().into_iter().map(|c| c.text).collect();
        assert_eq!(
            texts,
            vec!["1 Introduction", "2 Methods", "3 Results", "1 Smith, J. Things. 2020."]
        );
    }

    #[test]
    fn split_by_titles_caches_sections() {
        let mut paper = paper();
        assert!(paper.sections().is_none());

        paper.split_by_titles(&["2 Methods", "1 Introduction"]);
        let sections = paper.sections().unwrap();

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].title, "1 Introduction");
        assert_eq!(sections[0].text, "1 Introduction\nWe begin.");
        assert!(sections[1].text.ends_with("1 Smith, J. Things. 2020."));
    }

    #[tokio::test]
    async fn ensure_sections_classifies_once() {
        let mut paper = paper();
        let classifier = LlmTitleClassifier::new(ScriptedGenerator::new([
            r#"{"titles": ["1 Introduction", "2 Methods", "3 Results"]}"#,
        ]));

        let first = paper.ensure_sections(&classifier).await.unwrap().to_vec();
        let second = paper.ensure_sections(&classifier).await.unwrap().to_vec();

        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
        assert_eq!(first[2].text, "3 Results\nIt works.\n1 Smith, J. Things. 2020.");
    }

    #[tokio::test]
    async fn clear_sections_forces_recompute() {
        let mut paper = paper();
        paper.split_by_titles(&["2 Methods"]);
        paper.clear_sections();
        assert!(paper.sections().is_none());

        let sections = paper
            .ensure_sections(&RuleTitleClassifier::default())
            .await
            .unwrap();
        let titles: Vec<&str> = sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["1 Introduction", "2 Methods", "3 Results"]);
    }

    #[tokio::test]
    async fn read_paper_summarizes_every_section_in_order() {
        let mut paper = paper();
        paper.split_by_titles(&["1 Introduction", "2 Methods"]);
        let summarizer = summarizer(&["intro summary", "methods summary"]);
        let key_points = vec!["datasets".to_string()];

        let mut titles = Vec::new();
        let mut record = |_: &str, title: &str, _: usize, _: usize| titles.push(title.to_string());
        paper
            .read_paper(&RuleTitleClassifier::default(), &summarizer, &key_points, Some(&mut record))
            .await
            .unwrap();

        assert_eq!(titles, vec!["1 Introduction", "2 Methods"]);
        assert_eq!(paper.summary("1 Introduction"), Some("intro summary\n\n"));
        assert_eq!(paper.summary("2 Methods"), Some("methods summary\n\n"));
        assert_eq!(paper.summary("3 Results"), None);

        let calls = summarizer.generator().calls.borrow();
        assert!(calls[0][1].content.contains("about them:\n1. datasets\n"));
    }

    #[tokio::test]
    async fn rereading_replaces_summaries() {
        let mut paper = paper();
        paper.split_by_titles(&["2 Methods"]);
        let rules = RuleTitleClassifier::default();

        paper
            .read_paper(&rules, &summarizer(&["old"]), &[], None)
            .await
            .unwrap();
        paper
            .read_paper(&rules, &summarizer(&["new"]), &[], None)
            .await
            .unwrap();

        assert_eq!(paper.summaries().len(), 1);
        assert_eq!(paper.summary("2 Methods"), Some("new\n\n"));
    }

    #[tokio::test]
    async fn no_titles_means_no_summaries_and_no_error() {
        let mut paper = paper();
        let classifier = LlmTitleClassifier::new(ScriptedGenerator::new([r#"{"titles": []}"#]));
        let summarizer = summarizer(&[]);

        paper
            .read_paper(&classifier, &summarizer, &[], None)
            .await
            .unwrap();

        assert_eq!(paper.sections(), Some(&[][..]));
        assert!(paper.summaries().is_empty());
        assert_eq!(summarizer.generator().call_count(), 0);
    }

    #[tokio::test]
    async fn failure_keeps_earlier_summaries() {
        let mut paper = paper();
        paper.split_by_titles(&["1 Introduction", "2 Methods"]);
        let generator = ScriptedGenerator::new(["intro summary"]);
        generator.push_failure("timeout");
        let summarizer = Summarizer::new(generator, EstimateTokenCounter);

        let err = paper
            .read_paper(&RuleTitleClassifier::default(), &summarizer, &[], None)
            .await
            .unwrap_err();

        assert!(matches!(err, ReaderError::Generation(_)));
        assert_eq!(paper.summaries().len(), 1);
        assert_eq!(paper.summary("1 Introduction"), Some("intro summary\n\n"));
    }

    #[test]
    fn estimate_requires_sections() {
        let paper = paper();
        let err = paper.estimate_cost(&summarizer(&[]), &[], 0.002).unwrap_err();
        assert!(matches!(err, ReaderError::NotPartitioned));
    }

    #[test]
    fn estimate_covers_cached_sections() {
        let mut paper = paper();
        paper.split_by_titles(&["1 Introduction", "2 Methods", "3 Results"]);

        let estimate = paper.estimate_cost(&summarizer(&[]), &[], 0.002).unwrap();

        assert_eq!(estimate.sections.len(), 3);
        assert_eq!(estimate.overhead_tokens, 300);
    }
}
