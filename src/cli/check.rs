use std::{path::Path, process};

use clap::Parser;
use docxreq::{Directory, Issue};
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Parser, Default)]
#[command(about = "Report broken links, empty requirements and unreadable files")]
pub struct Check {
    /// Output format (table, json)
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl Check {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let directory = Directory::open(root.to_path_buf())?;
        let issues = directory.issues();

        match self.output {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&issues)?),
            OutputFormat::Table => print_table(&directory, &issues),
        }

        // Exit with a non-zero code when the tree needs attention.
        if !issues.is_empty() {
            process::exit(2);
        }

        Ok(())
    }
}

/// Print the documents of the tree and every issue found in it.
pub fn print_table(directory: &Directory, issues: &[Issue]) {
    print_documents(directory);
    println!();

    if issues.is_empty() {
        println!("Issues: {} ✅", "0".success());
        return;
    }

    println!("Issues: {} ⚠️", issues.len().to_string().warning());
    for issue in issues {
        println!("  • {issue}");
    }
}

/// Print each document with its parent.
pub fn print_documents(directory: &Directory) {
    println!("Requirement documents");
    println!("{}", "─────────────────────".dim());

    let mut any = false;
    for (path, settings) in directory.documents() {
        any = true;
        let parent = settings
            .parent()
            .map_or_else(|| "–".dim(), ToString::to_string);
        println!(
            "{:<10} {:<10} {}",
            settings.prefix().as_str(),
            parent,
            path.display().to_string().dim()
        );
    }

    if !any {
        println!("{}", "No documents yet. Import one with 'docxreq import'.".dim());
    }
}
