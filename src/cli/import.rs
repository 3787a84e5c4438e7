use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Parser;
use docxreq::{Directory, Outcome, Report, Resolution, Session, paragraphs_from_docx};
use tracing::instrument;

use super::{Context, terminal::Colorize};

#[derive(Debug, Parser)]
pub struct Import {
    /// The .docx document to read requirements from
    document: PathBuf,

    /// Print the changes as JSON once the import has finished
    #[arg(long)]
    json: bool,
}

impl Import {
    #[instrument(level = "debug", skip(self, context), fields(document = %self.document.display()))]
    pub fn run(self, context: &Context, resolution: Resolution) -> anyhow::Result<()> {
        let mut session = context.session()?.resolution(resolution);

        if self.json {
            let report = import(&mut session, &self.document, |_| {})?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            let report = import(&mut session, &self.document, print_outcome)?;
            print_summary(&report);
        }

        Ok(())
    }
}

/// Run one import pass over a `.docx` document.
pub fn import(
    session: &mut Session<Directory>,
    document: &Path,
    on_outcome: impl FnMut(&Outcome),
) -> anyhow::Result<Report> {
    let paragraphs = paragraphs_from_docx(document)
        .with_context(|| format!("Failed to read {}", document.display()))?;

    session
        .import(paragraphs, on_outcome)
        .with_context(|| format!("Failed to import {}", document.display()))
}

pub fn print_outcome(outcome: &Outcome) {
    let verb = match outcome {
        Outcome::Created(_) => outcome.verb().success(),
        Outcome::Updated(_) => outcome.verb().info(),
        Outcome::Deleted(_) => outcome.verb().warning(),
    };
    println!("{verb} {}", outcome.identifier());
}

pub fn print_summary(report: &Report) {
    if report.is_empty() {
        println!("{}", "No requirements found".dim());
        return;
    }

    println!(
        "{}",
        format!(
            "{} created, {} updated, {} deleted",
            report.created, report.updated, report.deleted
        )
        .dim()
    );
}
