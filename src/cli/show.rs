use std::path::Path;

use clap::Parser;
use drawlots::{Restaurant, RestaurantId};
use tracing::instrument;

use super::terminal::{self, Paint};

#[derive(Debug, Parser)]
#[command(about = "Display detailed information about a restaurant")]
pub struct Show {
    /// The id of the restaurant, as shown by 'drawlots list'
    id: RestaurantId,

    /// Print the restaurant as JSON
    #[arg(long)]
    json: bool,
}

impl Show {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let store = super::open_store(root)?;

        let Some(restaurant) = store.restaurant(self.id) else {
            anyhow::bail!("Restaurant {} not found", self.id);
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(restaurant)?);
        } else {
            output_pretty(restaurant);
        }
        Ok(())
    }
}

fn output_pretty(restaurant: &Restaurant) {
    println!(
        "# {} {}",
        restaurant.name.heading(),
        terminal::stars(restaurant.rating)
    );
    println!();

    println!("{}", "Details".dim());
    println!("  Id:       {}", restaurant.id);
    println!("  Address:  {}", restaurant.address);
    println!("  Phone:    {}", restaurant.phone);
    println!("  Map:      {}", restaurant.maps_url);
    println!("  Added:    {}", restaurant.created_at.format("%Y-%m-%d %H:%M"));

    if !restaurant.opening_hours.is_empty() {
        println!("\n{}", "Opening hours".dim());
        let day_width = restaurant
            .opening_hours
            .iter()
            .map(|h| terminal::display_width(&h.day_of_week))
            .max()
            .unwrap_or(0);
        for hours in &restaurant.opening_hours {
            println!(
                "  {}  {}",
                terminal::pad(&hours.day_of_week, day_width),
                hours.open_info
            );
        }
    }
}
