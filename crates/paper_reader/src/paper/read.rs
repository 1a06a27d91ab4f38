use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use paper_reader_core::{EstimateTokenCounter, Summarizer};

use super::{Classifier, ClassifierArgs, DocumentArgs, KeyPointArgs, SplitterArgs};
use crate::ollama::OllamaGenerator;
use crate::prelude::{eprintln, println, *};

#[derive(Debug, clap::Parser)]
pub struct Options {
    #[clap(flatten)]
    pub document: DocumentArgs,

    #[clap(flatten)]
    pub classifier: ClassifierArgs,

    #[clap(flatten)]
    pub key_points: KeyPointArgs,

    #[clap(flatten)]
    pub splitter: SplitterArgs,

    /// Output as JSON
    #[clap(long)]
    pub json: bool,
}

fn progress_bar(chunks: usize) -> ProgressBar {
    let pb = ProgressBar::new(chunks as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks {msg}",
        )
        .unwrap()
        .progress_chars("#>-"),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

pub async fn run(options: Options, global: crate::Global) -> Result<()> {
    let key_points = options.key_points.resolve()?;
    let mut paper = options.document.load()?;
    let generator = OllamaGenerator::from_global(&global)?;
    let classifier = Classifier::new(options.classifier.classifier, &generator);
    let summarizer = Summarizer::new(&generator, EstimateTokenCounter)
        .with_config(options.splitter.config()?);

    let sections = paper.ensure_sections(&classifier).await?;
    let total_chunks: usize = sections
        .iter()
        .map(|section| summarizer.chunks(&section.text).len())
        .sum();

    if global.verbose {
        eprintln!(
            "Reading {} sections in {} chunks",
            sections.len(),
            total_chunks
        );
    }

    let pb = progress_bar(total_chunks);
    let mut on_chunk = |generated: &str, title: &str, index: usize, count: usize| {
        log::debug!("{} [{}/{}]: {} chars", title, index + 1, count, generated.len());
        pb.set_message(title.to_string());
        pb.inc(1);
    };
    let result = paper
        .read_paper(&classifier, &summarizer, &key_points, Some(&mut on_chunk))
        .await;
    pb.finish_and_clear();
    result?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(paper.summaries())?);
        return Ok(());
    }

    if paper.summaries().is_empty() {
        println!("No section titles were found; nothing to summarize.");
        return Ok(());
    }

    for summary in paper.summaries() {
        println!("\n{}", format!("== {} ==", summary.title).bold().cyan());
        println!("{}", summary.summary.trim());
    }

    Ok(())
}
