use std::path::Path;

use chrono::Local;
use clap::{Parser, ValueEnum};
use drawlots::HistoryRecord;
use tracing::instrument;
use uuid::Uuid;

use super::terminal::{self, Paint};

#[derive(Debug, Parser)]
pub struct History {
    #[command(subcommand)]
    command: Option<HistoryCommand>,
}

#[derive(Debug, Parser)]
enum HistoryCommand {
    /// List past picks, newest first (default)
    List(ListArgs),

    /// Delete one pick from the history
    Delete(Delete),
}

impl History {
    #[instrument]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        match self.command {
            Some(HistoryCommand::Delete(delete)) => delete.run(root),
            Some(HistoryCommand::List(list)) => list.run(root),
            None => ListArgs::default().run(root),
        }
    }
}

#[derive(Debug, Default, Parser)]
struct ListArgs {
    /// Show at most this many picks
    #[arg(long, short = 'n', value_name = "N")]
    limit: Option<usize>,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum OutputFormat {
    #[default]
    Pretty,
    Json,
}

impl ListArgs {
    fn run(self, root: &Path) -> anyhow::Result<()> {
        let store = super::open_store(root)?;
        let records: Vec<&HistoryRecord> = store
            .history()
            .newest_first()
            .into_iter()
            .take(self.limit.unwrap_or(usize::MAX))
            .collect();

        match self.output {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
            OutputFormat::Pretty => print_records(&records, store.history().len()),
        }
        Ok(())
    }
}

fn print_records(records: &[&HistoryRecord], total: usize) {
    if records.is_empty() {
        println!("{}", "No picks yet. Try 'drawlots pick'.".dim());
        return;
    }

    for record in records {
        let restaurant = record.restaurant();
        let when = record.selected_at().with_timezone(&Local);
        println!(
            "{}  {} {}",
            when.format("%Y-%m-%d %H:%M").to_string().dim(),
            restaurant.name,
            terminal::stars(restaurant.rating),
        );
        println!("{}", format!("  {}", record.id()).dim());
    }

    if records.len() < total {
        println!(
            "\n{}",
            format!("showing {} of {total} pick(s)", records.len()).dim()
        );
    }
}

#[derive(Debug, Parser)]
struct Delete {
    /// The id of the history record to delete
    id: Uuid,

    /// Skip the confirmation prompt
    #[arg(long, short)]
    yes: bool,
}

impl Delete {
    #[instrument]
    fn run(self, root: &Path) -> anyhow::Result<()> {
        let mut store = super::open_store(root)?;

        let Some(record) = store.history().get(self.id) else {
            println!("{}", format!("No history record {}", self.id).dim());
            return Ok(());
        };

        if !self.yes {
            let prompt = format!(
                "Delete the pick of '{}' from {}?",
                record.restaurant().name,
                record.selected_at().with_timezone(&Local).format("%Y-%m-%d %H:%M")
            );
            let confirmed = dialoguer::Confirm::new()
                .with_prompt(prompt)
                .default(false)
                .interact()?;
            if !confirmed {
                println!("Cancelled");
                return Ok(());
            }
        }

        store.delete_history(self.id)?;
        println!("{}", "✅ Deleted 1 history record".success());
        Ok(())
    }
}
