mod app;

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};

use tracing_subscriber::{prelude::*, EnvFilter};

use lounge_core::{config, CsvLedger, EngineEvents, PriceConfig};

/// Ledger file in the working directory, next to where the original
/// application kept its database.
const LEDGER_FILE: &str = "lounge_ledger.csv";

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    let config_path = config::default_config_path();
    let prices = PriceConfig::load(&config_path);
    let ledger = CsvLedger::new(LEDGER_FILE);
    let (events, event_rx) = EngineEvents::channel();

    let mut app = app::LoungeApp::new(prices, config_path, ledger, events, event_rx);
    app.run()
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("could not create log directory {}", log_dir.display()))?;
    let log_path = log_dir.join("lounge.log");

    let env_filter = EnvFilter::from_default_env();

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .compact()
        .with_writer(move || {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .expect("failed to open log file")
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
