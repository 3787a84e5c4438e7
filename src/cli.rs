use std::{fs, path::PathBuf};

mod check;
mod import;
mod interactive;
mod terminal;

use check::Check;
use clap::ArgAction;
use docxreq::{Config, Directory, Grammar, Session};
use import::Import;
use interactive::Interactive;
use tracing::instrument;

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The path to the root of the requirements tree
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    /// The tag grammar of the documents (full, lite)
    ///
    /// Overrides the grammar in the tree's configuration.
    #[arg(long, global = true)]
    grammar: Option<Grammar>,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        let context = Context {
            root: self.root,
            grammar: self.grammar,
        };

        self.command
            .unwrap_or(Command::Interactive(Interactive {}))
            .run(&context)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false)
            .with_writer(std::io::stderr);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

/// The global options every command runs with.
#[derive(Debug)]
pub struct Context {
    root: PathBuf,
    grammar: Option<Grammar>,
}

impl Context {
    /// Open an import session on the tree, honouring its configuration.
    fn session(&self) -> anyhow::Result<Session<Directory>> {
        let config = Config::load_or_default(&self.root).map_err(anyhow::Error::msg)?;
        let directory = Directory::open(self.root.clone())?;

        let mut session = Session::with_config(directory, &config);
        if let Some(grammar) = self.grammar {
            session = session.grammar(grammar);
        }
        Ok(session)
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Import a document, creating its requirement documents as needed
    Import(Import),

    /// Import a document into requirement documents which already exist
    Update(Import),

    /// Analyze the requirement tree
    Check(Check),

    /// Initialize a new requirements tree
    Init,

    /// Choose actions from a menu (default)
    Interactive(Interactive),
}

impl Command {
    fn run(self, context: &Context) -> anyhow::Result<()> {
        match self {
            Self::Import(command) => command.run(context, docxreq::Resolution::CreateOrFind)?,
            Self::Update(command) => command.run(context, docxreq::Resolution::FindOnly)?,
            Self::Check(command) => command.run(&context.root)?,
            Self::Init => Init::run(context)?,
            Self::Interactive(command) => command.run(context)?,
        }
        Ok(())
    }
}

struct Init;

impl Init {
    #[instrument]
    fn run(context: &Context) -> anyhow::Result<()> {
        let path = Config::path(&context.root);
        if path.exists() {
            anyhow::bail!(
                "Tree already initialized (found existing {})",
                path.display()
            );
        }

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .map_err(|e| anyhow::anyhow!("Failed to create {}: {e}", dir.display()))?;
        }

        let mut config = Config::default();
        if let Some(grammar) = context.grammar {
            config.grammar = grammar;
        }
        config
            .save(&path)
            .map_err(|e| anyhow::anyhow!("Failed to create config.toml: {e}"))?;

        println!(
            "Initialized requirements tree in {}",
            context.root.display()
        );
        println!("  Created: .req/config.toml");
        println!();
        println!("Next steps:");
        println!("  docxreq import <DOCUMENT.docx>");

        Ok(())
    }
}
