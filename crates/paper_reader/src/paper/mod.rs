use std::path::{Path, PathBuf};

use crate::ollama::OllamaGenerator;
use crate::prelude::*;
use paper_reader_core::{
    LlmTitleClassifier, Paper, ReaderError, RuleTitleClassifier, SplitterConfig, TitleClassifier,
};
use pdf::{CandidateLine, TitlePattern};

pub mod candidates;
pub mod estimate;
pub mod info;
pub mod read;
pub mod sections;

/// The PDF to work on and how its titles are numbered.
#[derive(Debug, Clone, clap::Args)]
pub struct DocumentArgs {
    /// Path to the PDF file
    pub path: PathBuf,

    /// Numbering style of section titles (digits, digits-dot or roman)
    #[clap(long, env = "PAPER_READER_PATTERN", default_value = "digits")]
    pub pattern: TitlePattern,
}

impl DocumentArgs {
    pub fn load(&self) -> Result<Paper> {
        let bytes = std::fs::read(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let paper = Paper::from_bytes(&bytes, self.pattern)?;
        log::info!(
            "loaded {} ({} pages)",
            self.path.display(),
            paper.metadata().page_count
        );
        Ok(paper)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ClassifierKind {
    /// Ask the model which candidates are titles
    Llm,
    /// Offline heuristics, no model call
    Rules,
}

#[derive(Debug, Clone, clap::Args)]
pub struct ClassifierArgs {
    /// How candidate lines are confirmed as section titles
    #[clap(
        long,
        value_enum,
        env = "PAPER_READER_CLASSIFIER",
        default_value = "llm"
    )]
    pub classifier: ClassifierKind,
}

/// Either title classifier, chosen at run time.
pub enum Classifier<'a> {
    Llm(LlmTitleClassifier<&'a OllamaGenerator>),
    Rules(RuleTitleClassifier),
}

impl<'a> Classifier<'a> {
    pub fn new(kind: ClassifierKind, generator: &'a OllamaGenerator) -> Self {
        match kind {
            ClassifierKind::Llm => Classifier::Llm(LlmTitleClassifier::new(generator)),
            ClassifierKind::Rules => Classifier::Rules(RuleTitleClassifier::default()),
        }
    }
}

impl TitleClassifier for Classifier<'_> {
    async fn classify(&self, candidates: &[CandidateLine]) -> Result<Vec<String>, ReaderError> {
        match self {
            Classifier::Llm(classifier) => classifier.classify(candidates).await,
            Classifier::Rules(classifier) => classifier.classify(candidates).await,
        }
    }
}

#[derive(Debug, Clone, clap::Args)]
pub struct KeyPointArgs {
    /// A topic the summaries should address (repeatable)
    #[clap(long = "key-point")]
    pub key_points: Vec<String>,

    /// File with one key point per line
    #[clap(long)]
    pub key_points_file: Option<PathBuf>,
}

impl KeyPointArgs {
    /// Flag values first, then file entries.
    pub fn resolve(&self) -> Result<Vec<String>> {
        let mut key_points: Vec<String> = self
            .key_points
            .iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();

        if let Some(path) = &self.key_points_file {
            let from_file = read_key_points(path)?;
            if from_file.is_empty() {
                return Err(Error::EmptyKeyPointsFile(path.clone()).into());
            }
            key_points.extend(from_file);
        }

        if key_points.is_empty() {
            return Err(Error::NoKeyPoints.into());
        }
        Ok(key_points)
    }
}

fn read_key_points(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read key points from {}", path.display()))?;
    Ok(parse_key_points(&content))
}

fn parse_key_points(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, clap::Args)]
pub struct SplitterArgs {
    /// Largest chunk sent per request, in tokens
    #[clap(long, env = "PAPER_READER_CHUNK_SIZE", default_value = "2000")]
    pub chunk_size: usize,

    /// Tokens shared between consecutive chunks
    #[clap(long, env = "PAPER_READER_CHUNK_OVERLAP", default_value = "200")]
    pub chunk_overlap: usize,
}

impl SplitterArgs {
    pub fn config(&self) -> Result<SplitterConfig> {
        if self.chunk_overlap >= self.chunk_size {
            return Err(eyre!(
                "Chunk overlap ({}) must be smaller than chunk size ({})",
                self.chunk_overlap,
                self.chunk_size
            ));
        }
        Ok(SplitterConfig {
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
        })
    }
}

/// First `max_chars` characters on one line, with an ellipsis if cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let cut: String = flat.chars().take(max_chars).collect();
        format!("{}...", cut.trim_end())
    }
}
