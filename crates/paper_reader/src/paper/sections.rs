use colored::Colorize;

use super::{preview, Classifier, ClassifierArgs, DocumentArgs};
use crate::ollama::OllamaGenerator;
use crate::prelude::{println, *};

#[derive(Debug, clap::Parser)]
pub struct Options {
    #[clap(flatten)]
    pub document: DocumentArgs,

    #[clap(flatten)]
    pub classifier: ClassifierArgs,

    /// Output as JSON, with full section text
    #[clap(long)]
    pub json: bool,
}

pub async fn run(options: Options, global: crate::Global) -> Result<()> {
    let mut paper = options.document.load()?;
    let generator = OllamaGenerator::from_global(&global)?;
    let classifier = Classifier::new(options.classifier.classifier, &generator);

    let sections = paper.ensure_sections(&classifier).await?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&sections)?);
    } else if sections.is_empty() {
        println!("No section titles were found.");
    } else {
        let mut table = new_table();
        table.add_row(prettytable::row![
            "Title".bold().cyan(),
            "Chars".bold().cyan(),
            "Preview".bold().cyan()
        ]);
        for section in sections {
            table.add_row(prettytable::row![
                section.title.bright_white(),
                section.text.chars().count().to_string().green(),
                preview(&section.text, 60).bright_black()
            ]);
        }
        table.printstd();
    }

    Ok(())
}
