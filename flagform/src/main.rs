use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use flagform::{
    action::{ChangeSet, SummaryHandler},
    data::{AssetDocument, EditorSession},
    run::{ApplyMode, EditRequest, parse_assignment, render_schema, run_edit},
    store::equality::canonical,
};
use log::debug;

#[derive(Parser, Debug)]
#[command(name = "flagform", version, about = "Interpret flag configuration schemas")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the resolved render tree of a schema as JSON.
    Render {
        /// Schema or asset file (.json or .toml).
        schema: PathBuf,
        /// Render every module-less node read-only.
        #[arg(long)]
        read_only: bool,
    },
    /// Edit one module and print its pending changes.
    Edit {
        /// Schema or asset file (.json or .toml).
        schema: PathBuf,
        /// Module to edit.
        #[arg(short, long)]
        module: String,
        /// Value to set, as NODE=VALUE. Repeatable.
        #[arg(short, long = "set", value_name = "NODE=VALUE")]
        sets: Vec<String>,
        /// Dispatch an apply action after editing.
        #[arg(long, value_enum)]
        apply: Option<ApplyMode>,
    },
    /// Print the JSON Schema of the asset format.
    JsonSchema,
}

/// Prints change sets instead of persisting them.
struct PrintSummary;

impl SummaryHandler for PrintSummary {
    fn open_summary(&mut self, changes: ChangeSet) {
        let when = if changes.apply_now { "now" } else { "later" };
        println!(
            "{}",
            format!(
                "Applying {} change(s) to {} ({when})",
                changes.changes.len(),
                changes.module
            )
            .bold()
            .purple()
        );
        match serde_json::to_string_pretty(&changes) {
            Ok(s) => println!("{s}"),
            Err(e) => println!("Failed to serialize change set: {e}"),
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    debug!("{cli:?}");

    match cli.command {
        Command::Render { schema, read_only } => {
            let tree = render_schema(&schema, read_only)?;
            println!("{}", serde_json::to_string_pretty(&tree)?);
        }
        Command::Edit {
            schema,
            module,
            sets,
            apply,
        } => {
            let assignments = sets
                .iter()
                .map(|s| parse_assignment(s))
                .collect::<Result<Vec<_>>>()?;
            let request = EditRequest {
                module,
                assignments,
                apply,
            };

            let mut session = EditorSession::new_with_handler(&schema, PrintSummary)?;
            run_edit(&mut session, &request)?;
            print_pending(&session, &request.module);
        }
        Command::JsonSchema => {
            println!(
                "{}",
                serde_json::to_string_pretty(&AssetDocument::json_schema())?
            );
        }
    }
    Ok(())
}

fn print_pending(session: &EditorSession<PrintSummary>, module: &str) {
    let changes = session.pending_changes(module).cloned().unwrap_or_default();
    println!("{}", format!("Pending changes for {module}").bold());
    if changes.is_empty() {
        println!("  {}", "no pending changes, all values match the original".green());
        return;
    }
    for (name, change) in &changes {
        println!(
            "  {} {} -> {}",
            name.bold(),
            canonical(&change.original_value).red(),
            canonical(&change.current_value).green()
        );
    }
}
