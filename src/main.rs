//! Import tagged requirements from Word documents into a plain-text
//! requirements tree.

use clap::Parser;

mod cli;

fn main() -> anyhow::Result<()> {
    cli::Cli::parse().run()
}
