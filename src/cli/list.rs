use std::path::Path;

use clap::{Parser, ValueEnum};
use drawlots::{Restaurant, Tier};
use tracing::instrument;

use super::terminal::{self, Paint};

/// Narrowest terminal that still gets the address column.
const MIN_WIDE_COLUMNS: u16 = 60;

/// Command arguments for `drawlots list`.
#[derive(Debug, Default, Parser)]
#[command(about = "List restaurants in the local mirror")]
pub struct List {
    /// Refresh from the remote first (falls back to the local list)
    #[arg(long)]
    refresh: bool,

    /// Only show restaurants with this many stars
    #[arg(long, value_parser = super::parse_tier)]
    tier: Option<Tier>,

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

impl List {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let mut store = super::open_store(root)?;
        if self.refresh {
            super::refresh_or_warn(&mut store);
        }

        let restaurants: Vec<&Restaurant> = store
            .restaurants()
            .iter()
            .filter(|r| self.tier.is_none_or(|tier| r.rating == tier))
            .collect();

        match self.output {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&restaurants)?),
            OutputFormat::Pretty => print_table(&restaurants),
        }
        Ok(())
    }
}

fn print_table(restaurants: &[&Restaurant]) {
    if restaurants.is_empty() {
        println!("{}", "No restaurants. Try 'drawlots refresh'.".dim());
        return;
    }

    let width = terminal::terminal_width();
    let wide = width.is_none_or(|w| w >= MIN_WIDE_COLUMNS);
    let name_width = restaurants
        .iter()
        .map(|r| terminal::display_width(&r.name))
        .max()
        .unwrap_or(0)
        .min(32);
    let id_width = restaurants
        .iter()
        .map(|r| r.id.to_string().len())
        .max()
        .unwrap_or(1);

    for restaurant in restaurants {
        let name = terminal::pad(&terminal::fit(&restaurant.name, name_width), name_width);
        let mut line = format!(
            "{:>id_width$}  {}  {name}",
            restaurant.id.get(),
            terminal::stars(restaurant.rating),
        );

        if wide && !restaurant.address.is_empty() {
            let used = id_width + 2 + 3 + 2 + name_width + 2;
            let room = width.map_or(usize::MAX, |w| usize::from(w).saturating_sub(used));
            if room > 1 {
                line.push_str("  ");
                line.push_str(&terminal::fit(&restaurant.address, room).dim());
            }
        }

        println!("{line}");
    }

    println!(
        "\n{}",
        format!("{} restaurant(s)", restaurants.len()).dim()
    );
}
