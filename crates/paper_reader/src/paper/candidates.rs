use colored::Colorize;

use super::DocumentArgs;
use crate::prelude::{eprintln, println, *};

#[derive(Debug, clap::Parser)]
pub struct Options {
    #[clap(flatten)]
    pub document: DocumentArgs,

    /// Output as JSON
    #[clap(long)]
    pub json: bool,
}

pub async fn run(options: Options, global: crate::Global) -> Result<()> {
    let paper = options.document.load()?;
    let candidates = paper.candidate_lines();

    if global.verbose {
        eprintln!(
            "{} candidate lines for pattern {}",
            candidates.len(),
            paper.pattern()
        );
    }

    if options.json {
        println!("{}", serde_json::to_string_pretty(&candidates)?);
    } else if candidates.is_empty() {
        println!("No lines match the {} title pattern.", paper.pattern());
    } else {
        let mut table = new_table();
        table.add_row(prettytable::row![
            "#".bold().cyan(),
            "Page".bold().cyan(),
            "Line".bold().cyan()
        ]);
        for candidate in &candidates {
            table.add_row(prettytable::row![
                candidate.order.to_string().bright_black(),
                candidate.page.to_string().green(),
                candidate.text.bright_white()
            ]);
        }
        table.printstd();
    }

    Ok(())
}
