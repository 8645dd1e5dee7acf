mod db;
mod feed;
mod listings;
mod location;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::location::LocationCommands;

#[derive(Debug, Parser)]
#[command(name = "sandhai-cli")]
#[command(about = "Namma Sandhai local classifieds command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Inspect or change the saved buyer location
    Location {
        #[command(subcommand)]
        command: LocationCommands,
    },
    /// Print the proximity-ranked home feed
    Feed {
        /// Only listings in this category
        #[arg(long)]
        category: Option<String>,
        /// Override the configured search radius
        #[arg(long)]
        radius_km: Option<f64>,
        /// Listings between ad slots; 0 disables ads
        #[arg(long)]
        cadence: Option<usize>,
        #[command(flatten)]
        sensor: SensorArgs,
    },
    /// Look up listings
    Listings {
        #[command(subcommand)]
        command: ListingsCommands,
    },
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

/// Where a fresh coordinate comes from when detection runs.
#[derive(Debug, Clone, Default, PartialEq, Args)]
pub(crate) struct SensorArgs {
    /// Use this latitude instead of the IP locator (requires --lng)
    #[arg(long, requires = "lng", allow_hyphen_values = true)]
    pub lat: Option<f64>,
    /// Use this longitude instead of the IP locator (requires --lat)
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lng: Option<f64>,
    /// Behave as if no location sensor were available
    #[arg(long, conflicts_with_all = ["lat", "lng"])]
    pub no_sensor: bool,
}

#[derive(Debug, Subcommand)]
enum ListingsCommands {
    /// Newest listings first
    List {
        #[arg(long)]
        category: Option<String>,
        #[arg(long, default_value = "20")]
        limit: i64,
    },
    /// Full details of one listing
    Show { id: Uuid },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    Ping,
    Migrate,
    /// Insert demo listings into an empty database
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Location { command }) => {
            let settings = sandhai_core::load_feed_settings()?;
            location::run(&settings, command).await?;
        }
        Some(Commands::Feed {
            category,
            radius_km,
            cadence,
            sensor,
        }) => {
            let config = sandhai_core::load_app_config()?;
            let pool = db::connect(&config).await?;
            let overrides = feed::FeedOverrides {
                category,
                radius_km,
                cadence,
            };
            feed::run_feed(pool, &config.feed, &sensor, overrides).await?;
        }
        Some(Commands::Listings { command }) => {
            let config = sandhai_core::load_app_config()?;
            let pool = db::connect(&config).await?;
            match command {
                ListingsCommands::List { category, limit } => {
                    listings::run_list(pool, category, limit).await?;
                }
                ListingsCommands::Show { id } => listings::run_show(pool, id).await?,
            }
        }
        Some(Commands::Db { command }) => {
            let config = sandhai_core::load_app_config()?;
            let pool = db::connect(&config).await?;
            match command {
                DbCommands::Ping => db::run_ping(&pool).await?,
                DbCommands::Migrate => db::run_migrate(&pool).await?,
                DbCommands::Seed => db::run_seed(&pool).await?,
            }
        }
        None => println!("sandhai-cli: try `--help`"),
    }

    Ok(())
}
