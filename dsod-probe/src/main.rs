mod models;
mod probe;

use log::{error, info, LevelFilter};
use models::config::{Config, DEFAULT_CONFIG_PATH};
use models::context::{Context, ContextPointer};
use simplelog::{ColorChoice, TermLogger, TerminalMode};
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> ExitCode {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    let config = match Config::load(&path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Failed to load {}: {}", path.display(), err);
            return ExitCode::FAILURE;
        }
    };

    let level = LevelFilter::from_str(config.log_level()).unwrap_or(LevelFilter::Info);
    if let Err(err) = TermLogger::init(
        level,
        simplelog::Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    ) {
        eprintln!("Failed to initialize logging: {}", err);
    }

    if config.requests().is_empty() {
        error!("No requests configured in {}", path.display());
        return ExitCode::FAILURE;
    }

    let context: ContextPointer = Arc::new(Context::new(config));
    for request in context.config().requests() {
        let report = probe::run_burst(context.client(), request, *context.config().burst()).await;
        info!("{}", report);
    }

    let stats = context.client().stats();
    info!(
        "Guard stats: {} dispatched, {} duplicates rejected, {} still in flight",
        stats.dispatched, stats.duplicates_rejected, stats.in_flight
    );

    ExitCode::SUCCESS
}
