use std::path::PathBuf;

use crate::prelude::{println, *};

#[derive(Debug, clap::Parser)]
pub struct Options {
    /// Path to the PDF file
    pub path: PathBuf,
}

pub async fn run(options: Options, _global: crate::Global) -> Result<()> {
    let bytes = std::fs::read(&options.path)
        .with_context(|| format!("Failed to read {}", options.path.display()))?;
    let meta = pdf::info(&bytes)?;
    println!("{}", serde_json::to_string_pretty(&meta)?);
    Ok(())
}
