use std::path::PathBuf;

use clap::Parser;
use dialoguer::{Input, Select};
use docxreq::Resolution;
use tracing::instrument;

use super::{
    Context,
    check::{print_documents, print_table},
    import::{import, print_outcome, print_summary},
    terminal::Colorize,
};

#[derive(Debug, Parser)]
#[command(about = "Import documents and analyze the tree from a menu")]
pub struct Interactive {}

#[derive(Debug, Clone, Copy)]
enum Action {
    Add,
    Update,
    Analyze,
    Quit,
}

impl Action {
    const ALL: [Self; 4] = [Self::Add, Self::Update, Self::Analyze, Self::Quit];

    const fn label(self) -> &'static str {
        match self {
            Self::Add => "Add document",
            Self::Update => "Update document",
            Self::Analyze => "Analyze requirement tree",
            Self::Quit => "Quit",
        }
    }
}

impl Interactive {
    /// Keep one session open and run actions until the user quits.
    ///
    /// A failed import is reported and the menu is shown again.
    #[instrument(level = "debug", skip_all)]
    pub fn run(self, context: &Context) -> anyhow::Result<()> {
        let mut session = context.session()?;

        println!("On tree {}", context.root.display());
        print_documents(session.tree());

        let labels: Vec<_> = Action::ALL.iter().map(|action| action.label()).collect();

        loop {
            println!();
            let selection = Select::new()
                .with_prompt("Choose an action")
                .items(&labels)
                .default(0)
                .interact()?;

            let resolution = match Action::ALL[selection] {
                Action::Add => Resolution::CreateOrFind,
                Action::Update => Resolution::FindOnly,
                Action::Analyze => {
                    let issues = session.tree().issues();
                    print_table(session.tree(), &issues);
                    continue;
                }
                Action::Quit => return Ok(()),
            };

            let document: String = Input::new().with_prompt("Document path").interact_text()?;
            let document = PathBuf::from(document.trim());

            session.set_resolution(resolution);
            match import(&mut session, &document, print_outcome) {
                Ok(report) => print_summary(&report),
                Err(e) => eprintln!("{}", format!("{e:#}").error()),
            }
        }
    }
}
