use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use city_weather::{AppState, CityWeatherConfig, logging, web};

/// City weather service: enrich city names with coordinates and current weather
#[derive(Debug, Parser)]
#[command(name = "city-weather", version, about)]
struct Args {
    /// Path to a TOML config file (defaults to ./config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Port to listen on, overrides the configured port
    #[arg(long)]
    port: Option<u16>,

    /// Enable debug logging
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = CityWeatherConfig::load_from_path(args.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if args.verbose {
        config.logging.level = "debug".to_string();
    }

    logging::init(&config.logging)?;

    let state = AppState::from_config(&config).context("Failed to build service")?;
    web::run(state, &config.server).await
}
