//! Core library for paper-reader
//!
//! This crate implements the **Functional Core** of the paper-reader application,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! The project uses a three-crate architecture:
//!
//! - **`pdf`**: PDF parsing, the layout and flat text views, and title candidate scanning
//! - **`paper_reader_core`** (this crate): section segmentation and the summarization driver
//! - **`paper_reader`**: the CLI, the generation service client, and all terminal output
//!
//! Nothing here performs network I/O. The generation service is reached through
//! the [`generate::Generator`] trait, which the shell implements and tests replace
//! with scripted replies.
//!
//! # Pipeline
//!
//! 1. [`pdf::Document`] extracts the layout view and the flat text.
//! 2. A [`pdf::TitlePattern`] selects candidate title lines from the layout view.
//! 3. A [`classify::TitleClassifier`] confirms which candidates are real titles.
//! 4. [`partition::partition`] carves the flat text at the confirmed titles.
//! 5. [`summarize::Summarizer`] chunks each section and summarizes it chunk by chunk.
//!
//! [`paper::Paper`] ties the steps together and caches sections and summaries.
//!
//! # Module Organization
//!
//! - [`classify`]: model-backed and rule-based title classification
//! - [`generate`]: the generation service seam
//! - [`paper`]: the per-document aggregate
//! - [`partition`]: title location and section spans
//! - [`prompt`]: prompt messages and key point formatting
//! - [`splitter`]: token-measured recursive text splitting
//! - [`summarize`]: per-section summarization and cost estimation
//! - [`tokens`]: token counting
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use paper_reader_core::partition::partition;
//!
//! let flat = "Intro stuff 1. Methods method body 2. Results result body";
//! let sections = partition(flat, &["2. Results", "1. Methods"]);
//!
//! assert_eq!(sections[0].text, "1. Methods method body");
//! assert_eq!(sections[1].text, "2. Results result body");
//! ```

use thiserror::Error;

pub mod classify;
pub mod generate;
pub mod paper;
pub mod partition;
pub mod prompt;
pub mod splitter;
pub mod summarize;
pub mod tokens;

pub use classify::{LlmTitleClassifier, RuleTitleClassifier, TitleClassifier};
pub use generate::Generator;
pub use paper::Paper;
pub use partition::{locate_titles, partition, Section, TitlePosition};
pub use prompt::{format_key_points, Message, Role};
pub use splitter::{SplitterConfig, TextSplitter};
pub use summarize::{CostEstimate, ProgressFn, SectionCost, SectionSummary, Summarizer};
pub use tokens::{EstimateTokenCounter, TokenCounter};

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("failed to read document: {0}")]
    DocumentParse(#[from] pdf::PdfError),
    #[error("title classification reply is not valid JSON: {0}")]
    ClassificationParse(String),
    #[error("generation request failed: {0}")]
    Generation(String),
    #[error("paper has not been partitioned into sections")]
    NotPartitioned,
}
