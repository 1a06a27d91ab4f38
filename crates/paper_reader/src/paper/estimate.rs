use colored::Colorize;
use paper_reader_core::{EstimateTokenCounter, Summarizer};

use super::{Classifier, ClassifierArgs, DocumentArgs, KeyPointArgs, SplitterArgs};
use crate::ollama::OllamaGenerator;
use crate::prelude::{println, *};

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

    /// Price per thousand tokens, in dollars
    #[clap(long, env = "PAPER_READER_DOLLARS_PER_K_TOKENS", default_value = "0.002")]
    pub dollars_per_k_tokens: f64,

    /// Output as JSON
    #[clap(long)]
    pub json: bool,
}

pub async fn run(options: Options, global: crate::Global) -> Result<()> {
    let key_points = options.key_points.resolve()?;
    let mut paper = options.document.load()?;
    let generator = OllamaGenerator::from_global(&global)?;
    let classifier = Classifier::new(options.classifier.classifier, &generator);

    paper.ensure_sections(&classifier).await?;

    let summarizer = Summarizer::new(&generator, EstimateTokenCounter)
        .with_config(options.splitter.config()?);
    let estimate = paper.estimate_cost(&summarizer, &key_points, options.dollars_per_k_tokens)?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&estimate)?);
        return Ok(());
    }

    let mut table = new_table();
    table.add_row(prettytable::row![
        "Section".bold().cyan(),
        "Prompt tokens".bold().cyan()
    ]);
    for section in &estimate.sections {
        table.add_row(prettytable::row![
            section.title.bright_white(),
            section.prompt_tokens.to_string().green()
        ]);
    }
    table.printstd();

    println!();
    println!(
        "{} {} prompt + {} overhead = {}",
        "Estimated tokens:".bold(),
        estimate.prompt_tokens,
        estimate.overhead_tokens,
        estimate.estimated_tokens.to_string().bright_yellow()
    );
    println!(
        "{} ${:.4} at ${}/1K tokens",
        "Estimated cost:".bold(),
        estimate.estimated_cost,
        estimate.dollars_per_k_tokens
    );

    Ok(())
}
