mod check;
mod coverage;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "cobertura-cli")]
#[command(about = "Delivery coverage resolution from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Find the zones that cover a point and print them as JSON
    Resolve {
        /// Latitude in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        /// Longitude in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
        /// Street name of the address
        #[arg(long)]
        street: Option<String>,
        /// House number on `street`
        #[arg(long)]
        number: Option<u32>,
        /// Only search this branch's zones
        #[arg(long)]
        branch: Option<i64>,
    },
    /// Print active zones as JSON
    Zones {
        /// Only list this branch's zones
        #[arg(long)]
        branch: Option<i64>,
    },
    /// Validate a zones catalog file and print a per-branch summary
    Check {
        /// Catalog to check (defaults to `COBERTURA_ZONES_PATH`)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cobertura_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    // stdout carries command output.
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Resolve {
            lat,
            lon,
            street,
            number,
            branch,
        }) => {
            let request = coverage::ResolveArgs {
                latitude: lat,
                longitude: lon,
                street,
                number,
                branch,
            };
            coverage::run_resolve(&config, request).await?;
        }
        Some(Commands::Zones { branch }) => coverage::run_zones(&config, branch).await?,
        Some(Commands::Check { path }) => {
            let path = path.unwrap_or_else(|| config.zones_path.clone());
            check::run_check(&config, &path)?;
        }
        None => println!("cobertura-cli: try --help"),
    }

    Ok(())
}
