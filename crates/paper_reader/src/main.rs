use crate::prelude::*;
use clap::Parser;

mod error;
mod ollama;
mod paper;
mod prelude;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Split research papers into sections and summarize them against your key points"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Ollama base URL
    #[clap(
        long,
        env = "OLLAMA_URL",
        global = true,
        default_value = "http://localhost:11434"
    )]
    ollama_url: String,

    /// Model used for title classification and summaries
    #[clap(long, env = "PAPER_READER_MODEL", global = true, default_value = "llama3.1")]
    model: String,

    /// Sampling temperature; the model's default when unset
    #[clap(long, env = "PAPER_READER_TEMPERATURE", global = true)]
    temperature: Option<f64>,

    /// Whether to display additional information.
    #[clap(
        long,
        env = "PAPER_READER_VERBOSE",
        global = true,
        default_value = "false"
    )]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Print document metadata
    Info(crate::paper::info::Options),

    /// List lines that match the section title pattern
    Candidates(crate::paper::candidates::Options),

    /// Split the paper into sections
    Sections(crate::paper::sections::Options),

    /// Estimate the token cost of reading the paper
    Estimate(crate::paper::estimate::Options),

    /// Summarize every section against a set of key points
    Read(crate::paper::read::Options),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Info(options) => crate::paper::info::run(options, app.global).await,
        SubCommands::Candidates(options) => crate::paper::candidates::run(options, app.global).await,
        SubCommands::Sections(options) => crate::paper::sections::run(options, app.global).await,
        SubCommands::Estimate(options) => crate::paper::estimate::run(options, app.global).await,
        SubCommands::Read(options) => crate::paper::read::run(options, app.global).await,
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
