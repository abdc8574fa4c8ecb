use std::{
    path::{Path, PathBuf},
    time::Duration,
};

mod history;
mod list;
mod show;
mod terminal;

use clap::ArgAction;
use drawlots::{
    Config, Draw, HttpRemote, NewRestaurant, Selector, Store, Tier,
    storage::{AddRestaurantError, RefreshError},
};
use history::History;
use indicatif::{ProgressBar, ProgressStyle};
use list::List;
use show::Show;
use terminal::Paint;
use tracing::instrument;
use url::Url;

const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The data directory holding config.toml, restaurants.json and history.json
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        self.command
            .unwrap_or_else(|| Command::List(List::default()))
            .run(&self.root)
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
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Create the data directory and write a default configuration
    Init(Init),

    /// Fetch the restaurant list from the remote and mirror it locally
    Refresh,

    /// List restaurants in the local mirror (default)
    List(List),

    /// Show one restaurant in detail, including opening hours
    Show(Show),

    /// Add a restaurant by its maps link
    ///
    /// The server fills in name, address, phone and opening hours.
    Add(Add),

    /// Draw a restaurant at random
    ///
    /// One-star restaurants come up 85% of the time, two-star 10% and
    /// three-star 5%. If no restaurant has the drawn rating, any restaurant
    /// may be picked.
    Pick(Pick),

    /// Show or edit the history of picks
    History(History),
}

impl Command {
    fn run(self, root: &Path) -> anyhow::Result<()> {
        match self {
            Self::Init(command) => command.run(root)?,
            Self::Refresh => refresh(root)?,
            Self::List(command) => command.run(root)?,
            Self::Show(command) => command.run(root)?,
            Self::Add(command) => command.run(root)?,
            Self::Pick(command) => command.run(root)?,
            Self::History(command) => command.run(root)?,
        }
        Ok(())
    }
}

/// Load `config.toml` from the data directory, or the defaults if there is
/// none.
fn load_config(root: &Path) -> Config {
    let path = root.join(CONFIG_FILE);
    Config::load(&path).unwrap_or_else(|e| {
        tracing::debug!("Failed to load config: {e}");
        Config::default()
    })
}

/// Open the store in `root`, reporting unusable local documents.
fn open_store(root: &Path) -> anyhow::Result<Store<HttpRemote>> {
    let config = load_config(root);
    let remote = HttpRemote::new(&config)?;
    let (store, warnings) = Store::open(root, remote);

    for warning in warnings.iter().filter(|w| !w.is_missing()) {
        eprintln!("{}", format!("⚠️  {warning}; starting empty").warning());
    }

    Ok(store)
}

/// Refresh with a spinner on stderr while the request is in flight.
fn refresh_with_spinner(store: &mut Store<HttpRemote>) -> Result<usize, RefreshError> {
    let spinner = spinner(format!(
        "Fetching {}",
        store.remote().collection_url()
    ));
    let result = store.refresh_from_remote();
    spinner.finish_and_clear();
    result
}

/// Refresh, but fall back to the local mirror with a warning on failure.
fn refresh_or_warn(store: &mut Store<HttpRemote>) {
    if let Err(e) = refresh_with_spinner(store) {
        eprintln!(
            "{}",
            format!("⚠️  {e}; using {} local restaurant(s)", store.restaurants().len()).warning()
        );
    }
}

fn spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Parse a rating tier from the command line.
fn parse_tier(s: &str) -> Result<Tier, String> {
    s.parse().map_err(|e| format!("{e}"))
}

#[instrument]
fn refresh(root: &Path) -> anyhow::Result<()> {
    let mut store = open_store(root)?;
    let count = refresh_with_spinner(&mut store)?;

    println!(
        "{}",
        format!("✅ Refreshed {count} restaurant(s)").success()
    );
    Ok(())
}

#[derive(Debug, clap::Parser)]
pub struct Init {
    /// Base URL of the restaurant API (the collection is <URL>/restaurants)
    #[arg(long, value_name = "URL")]
    remote_url: Option<Url>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout_secs: Option<u64>,
}

impl Init {
    #[instrument]
    fn run(self, root: &Path) -> anyhow::Result<()> {
        let config_path = root.join(CONFIG_FILE);
        if config_path.exists() {
            anyhow::bail!(
                "Already initialized (found existing {})",
                config_path.display()
            );
        }

        std::fs::create_dir_all(root)
            .map_err(|e| anyhow::anyhow!("Failed to create {}: {e}", root.display()))?;

        let mut config = Config::default();
        if let Some(url) = self.remote_url {
            config.set_remote_url(url);
        }
        if let Some(secs) = self.timeout_secs {
            config.set_timeout_secs(secs);
        }
        config.save(&config_path)?;

        println!("Initialized drawlots in {}", root.display());
        println!("  Created: {CONFIG_FILE}");
        println!("  Remote:  {}", config.remote_url());
        println!();
        println!("Next steps:");
        println!("  drawlots refresh");
        println!("  drawlots add <MAPS_URL> --stars 1");

        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Add {
    /// Link to the restaurant on a map service
    maps_url: String,

    /// Star rating, 1 to 3. One-star restaurants are drawn most often.
    #[arg(long, short, value_parser = parse_tier)]
    stars: Tier,
}

impl Add {
    #[instrument]
    fn run(self, root: &Path) -> anyhow::Result<()> {
        let new = NewRestaurant::new(&self.maps_url, self.stars)?;
        let mut store = open_store(root)?;

        let spinner = spinner(format!("Adding {}", new.maps_url()));
        let result = store.add_restaurant(&new);
        spinner.finish_and_clear();

        match result {
            Ok(count) => {
                println!(
                    "{}",
                    format!("✅ Added {} restaurant ({count} in total)", self.stars.stars())
                        .success()
                );
                Ok(())
            }
            Err(AddRestaurantError::Refresh(e)) => {
                eprintln!(
                    "{}",
                    format!("⚠️  Restaurant added, but the list could not be refreshed: {e}")
                        .warning()
                );
                eprintln!("{}", "Run 'drawlots refresh' to pick it up.".dim());
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, clap::Parser)]
pub struct Pick {
    /// Refresh from the remote before drawing (falls back to the local list)
    #[arg(long)]
    refresh: bool,
}

impl Pick {
    #[instrument]
    fn run(self, root: &Path) -> anyhow::Result<()> {
        let mut store = open_store(root)?;
        if self.refresh {
            refresh_or_warn(&mut store);
        }

        let mut selector = Selector::from_os_rng();
        let selection = match selector.select(&mut store) {
            Ok(Draw::Picked(selection)) => selection,
            Ok(Draw::NoRestaurantsAvailable) => {
                println!("{}", "No restaurants to pick from.".warning());
                println!(
                    "{}",
                    "Add one with 'drawlots add <MAPS_URL> --stars N' or run 'drawlots refresh'."
                        .dim()
                );
                return Ok(());
            }
            Err(unsaved) => {
                eprintln!("{}", format!("⚠️  {unsaved}").warning());
                unsaved.selection
            }
        };

        let restaurant = &selection.restaurant;
        println!(
            "🎲 {} {}",
            restaurant.name.heading(),
            terminal::stars(restaurant.rating)
        );
        if !restaurant.address.is_empty() {
            println!("   {}", restaurant.address);
        }
        if !restaurant.phone.is_empty() {
            println!("   {}", restaurant.phone);
        }
        println!("   {}", restaurant.maps_url.dim());
        println!(
            "{}",
            format!("   history id {}", selection.record_id).dim()
        );

        Ok(())
    }
}
