use clap::{Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "propfinder")]
#[command(about = "Hong Kong property-deal search")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve a free-text location query to coordinates.
    Resolve {
        query: String,
        /// Emit the full resolution as JSON, including source diagnostics.
        #[arg(long)]
        json: bool,
    },
    /// Search recorded deals near a location.
    Search {
        /// Free-text location to resolve into a search centre.
        #[arg(conflicts_with_all = ["lat", "lng"])]
        query: Option<String>,
        /// Search centre latitude (requires --lng).
        #[arg(long, requires = "lng")]
        lat: Option<f64>,
        /// Search centre longitude (requires --lat).
        #[arg(long, requires = "lat")]
        lng: Option<f64>,
        /// Search radius in metres.
        #[arg(long, default_value_t = 5000)]
        radius: u32,
        /// Restrict to one deal subtype.
        #[arg(long = "type")]
        deal_type: Option<String>,
        /// Only deals from the last N days.
        #[arg(long)]
        days: Option<u32>,
        /// Emit result rows as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Check database connectivity.
    Health,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = propfinder_core::load_app_config_from_env()?;

    match cli.command {
        Commands::Resolve { query, json } => commands::run_resolve(&config, &query, json).await,
        Commands::Search {
            query,
            lat,
            lng,
            radius,
            deal_type,
            days,
            json,
        } => {
            commands::run_search(
                &config,
                commands::SearchArgs {
                    query,
                    lat,
                    lng,
                    radius,
                    deal_type,
                    days,
                    json,
                },
            )
            .await
        }
        Commands::Health => commands::run_health(&config).await,
    }
}
