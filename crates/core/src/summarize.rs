//! Per-section summarization and its cost estimate.

use serde::Serialize;

use crate::generate::Generator;
use crate::partition::Section;
use crate::prompt::section_summarization_messages;
use crate::splitter::{SplitterConfig, TextSplitter};
use crate::tokens::TokenCounter;
use crate::ReaderError;

/// Fixed allowance per section for the model's reply.
pub const SECTION_OVERHEAD_TOKENS: usize = 100;

/// Called after each chunk's reply arrives, with
/// `(generated_text, section_title, chunk_index, chunk_count)`.
pub type ProgressFn<'a> = dyn FnMut(&str, &str, usize, usize) + 'a;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionSummary {
    pub title: String,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionCost {
    pub title: String,
    pub prompt_tokens: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostEstimate {
    pub sections: Vec<SectionCost>,
    pub prompt_tokens: usize,
    pub overhead_tokens: usize,
    pub estimated_tokens: usize,
    pub dollars_per_k_tokens: f64,
    pub estimated_cost: f64,
}

/// Drives the generation service over sections, one chunk at a time.
pub struct Summarizer<G, T> {
    generator: G,
    counter: T,
    config: SplitterConfig,
}

impl<G: Generator, T: TokenCounter> Summarizer<G, T> {
    pub fn new(generator: G, counter: T) -> Self {
        Self {
            generator,
            counter,
            config: SplitterConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SplitterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// The chunks a section's text is sent in.
    pub fn chunks(&self, text: &str) -> Vec<String> {
        TextSplitter::new(self.config, &self.counter).split_text(text)
    }

    /// Summarize one section chunk by chunk, in order.
    ///
    /// Each reply is appended followed by a blank line. The first failed
    /// request aborts the section.
    pub async fn summarize_section(
        &self,
        section: &Section,
        key_points: &str,
        mut progress: Option<&mut ProgressFn<'_>>,
    ) -> Result<String, ReaderError> {
        let chunks = self.chunks(&section.text);
        let count = chunks.len();
        log::info!("summarizing section {:?} in {} chunk(s)", section.title, count);

        let mut summary = String::new();
        for (index, chunk) in chunks.iter().enumerate() {
            let messages = section_summarization_messages(key_points, &section.title, chunk);
            let reply = self.generator.generate(&messages).await?;

            if let Some(callback) = progress.as_mut() {
                callback(reply.as_str(), section.title.as_str(), index, count);
            }
            summary.push_str(&reply);
            summary.push_str("\n\n");
        }

        Ok(summary)
    }

    /// Price a run over `sections` without calling the service.
    ///
    /// Each section is charged the full prompt built from its whole text,
    /// plus [`SECTION_OVERHEAD_TOKENS`]. Chunk overlap is not counted.
    pub fn estimate_cost(
        &self,
        sections: &[Section],
        key_points: &str,
        dollars_per_k_tokens: f64,
    ) -> CostEstimate {
        let sections: Vec<SectionCost> = sections
            .iter()
            .map(|section| SectionCost {
                title: section.title.clone(),
                prompt_tokens: self.counter.count_messages(&section_summarization_messages(
                    key_points,
                    &section.title,
                    &section.text,
                )),
            })
            .collect();

        let prompt_tokens: usize = sections.iter().map(|s| s.prompt_tokens).sum();
        let overhead_tokens = sections.len() * SECTION_OVERHEAD_TOKENS;
        let estimated_tokens = prompt_tokens + overhead_tokens;

        CostEstimate {
            sections,
            prompt_tokens,
            overhead_tokens,
            estimated_tokens,
            dollars_per_k_tokens,
            estimated_cost: estimated_tokens as f64 * dollars_per_k_tokens / 1000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::tests::ScriptedGenerator;
    use crate::tokens::EstimateTokenCounter;

    fn section(title: &str, text: &str) -> Section {
        Section {
            title: title.to_string(),
            text: text.to_string(),
        }
    }

    fn small_chunks() -> SplitterConfig {
        SplitterConfig {
            chunk_size: 4,
            chunk_overlap: 0,
        }
    }

    #[tokio::test]
    async fn short_section_is_one_request() {
        let summarizer = Summarizer::new(ScriptedGenerator::new(["It works."]), EstimateTokenCounter);
        let methods = section("3 Methods", "3 Methods\nWe sample.");

        let summary = summarizer
            .summarize_section(&methods, "1. results", None)
            .await
            .unwrap();

        assert_eq!(summary, "It works.\n\n");
        let calls = summarizer.generator().calls.borrow();
        assert_eq!(calls.len(), 1);
        assert!(calls[0][1].content.ends_with("3 Methods\nWe sample."));
    }

    #[tokio::test]
    async fn long_section_is_sent_in_order_with_progress() {
        let text = "aaaa bbbb cccc\n\ndddd eeee ffff\n\ngggg hhhh";
        let chunks = TextSplitter::new(small_chunks(), &EstimateTokenCounter).split_text(text);
        assert!(chunks.len() > 1);

        let summarizer = Summarizer::new(
            ScriptedGenerator::new((0..chunks.len()).map(|i| format!("s{i}"))),
            EstimateTokenCounter,
        )
        .with_config(small_chunks());

        let mut seen = Vec::new();
        let mut record = |generated: &str, title: &str, index: usize, count: usize| {
            seen.push((generated.to_string(), title.to_string(), index, count));
        };
        let summary = summarizer
            .summarize_section(&section("2 Work", text), "", Some(&mut record))
            .await
            .unwrap();

        let expected: String = (0..chunks.len()).map(|i| format!("s{i}\n\n")).collect();
        assert_eq!(summary, expected);
        assert_eq!(seen.len(), chunks.len());
        let calls = summarizer.generator().calls.borrow();
        for (call, chunk) in calls.iter().zip(&chunks) {
            assert!(call[1].content.ends_with(chunk.as_str()));
        }
        for (i, (generated, title, index, count)) in seen.iter().enumerate() {
            assert_eq!(generated, &format!("s{i}"));
            assert_eq!(title, "2 Work");
            assert_eq!(*index, i);
            assert_eq!(*count, chunks.len());
        }
    }

    #[tokio::test]
    async fn failed_request_aborts_section() {
        let generator = ScriptedGenerator::new(["first"]);
        generator.push_failure("connection refused");
        let summarizer = Summarizer::new(generator, EstimateTokenCounter).with_config(small_chunks());

        let err = summarizer
            .summarize_section(&section("1 A", "aaaa bbbb cccc dddd eeee ffff gggg"), "", None)
            .await
            .unwrap_err();

        assert!(matches!(err, ReaderError::Generation(m) if m == "connection refused"));
        assert_eq!(summarizer.generator().call_count(), 2);
    }

    #[test]
    fn estimate_adds_fixed_overhead_per_section() {
        let summarizer = Summarizer::new(ScriptedGenerator::default(), EstimateTokenCounter);
        let sections = [section("1 Intro", "1 Intro\nHello."), section("2 End", "2 End\nBye.")];

        let estimate = summarizer.estimate_cost(&sections, "1. novelty", 0.002);

        assert_eq!(estimate.sections.len(), 2);
        assert_eq!(estimate.overhead_tokens, 200);
        assert_eq!(
            estimate.estimated_tokens,
            estimate.sections.iter().map(|s| s.prompt_tokens).sum::<usize>() + 200
        );
        let expected = estimate.estimated_tokens as f64 * 0.002 / 1000.0;
        assert!((estimate.estimated_cost - expected).abs() < 1e-12);
        assert_eq!(summarizer.generator().call_count(), 0);
    }

    #[test]
    fn estimate_for_single_chunk_matches_the_request() {
        let summarizer = Summarizer::new(ScriptedGenerator::default(), EstimateTokenCounter);
        let methods = section("3 Methods", "3 Methods\nWe sample widely and often.");
        let key_points = "1. sampling";

        let estimate = summarizer.estimate_cost(std::slice::from_ref(&methods), key_points, 1.0);
        let chunks = summarizer.chunks(&methods.text);
        assert_eq!(chunks, vec![methods.text.clone()]);

        let request = section_summarization_messages(key_points, &methods.title, &chunks[0]);
        assert_eq!(
            estimate.sections[0].prompt_tokens,
            EstimateTokenCounter.count_messages(&request)
        );
    }

    #[test]
    fn estimate_of_nothing_is_free() {
        let summarizer = Summarizer::new(ScriptedGenerator::default(), EstimateTokenCounter);
        let estimate = summarizer.estimate_cost(&[], "", 0.002);

        assert_eq!(estimate.estimated_tokens, 0);
        assert_eq!(estimate.estimated_cost, 0.0);
    }
}
