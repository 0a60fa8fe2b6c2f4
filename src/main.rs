use std::path::Path;

use anyhow::{Context, Result};
use clap::{Arg, Command};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tether_arb_signal::mocks::is_mock_mode;
use tether_arb_signal::{Config, Scheduler};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("arb-signal")
        .version(env!("CARGO_PKG_VERSION"))
        .author("xCrack Team <team@xcrack.dev>")
        .about("🦀 USDT/IRT cross-exchange arbitrage signal bot")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("config/default.toml")
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level (trace, debug, info, warn, error)")
                .default_value("info")
        )
        .arg(
            Arg::new("mock")
                .long("mock")
                .help("Simulated venues and log-only notifications (same as API_MODE=mock)")
                .action(clap::ArgAction::SetTrue)
        )
        .get_matches();

    let log_filter = match matches.get_one::<String>("log-level").map(String::as_str) {
        Some(level @ ("trace" | "debug" | "info" | "warn" | "error")) => level,
        _ => "info",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // .env is optional
    if dotenvy::dotenv().is_ok() {
        info!("📄 Loaded .env");
    }

    let config_path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or("config/default.toml");

    let mut config = if Path::new(config_path).exists() {
        info!("📋 Loading configuration: {}", config_path);
        Config::load(config_path)
            .await
            .with_context(|| format!("failed to load {}", config_path))?
    } else {
        warn!("⚠️ {} not found, using built-in defaults", config_path);
        Config::default()
    };

    if matches.get_flag("mock") || is_mock_mode() {
        warn!("🎭 Mock mode: simulated venues, messages only go to the log");
        config.mock_mode = true;
    }

    config.load_environment_variables();

    if let Err(e) = config.validate() {
        error!("❌ Configuration validation failed: {}", e);
        std::process::exit(1);
    }

    info!(
        "✅ Configuration loaded: capital {} toman, gate {}% / {} USDT",
        config.trading.capital, config.trading.min_profit_percent, config.trading.min_trade_amount
    );

    let mut scheduler = Scheduler::from_config(&config)
        .await
        .context("failed to initialize the bot")?;

    tokio::select! {
        _ = scheduler.run() => {}
        result = signal::ctrl_c() => {
            match result {
                Ok(()) => warn!("🛑 Shutdown signal received, exiting"),
                Err(e) => {
                    error!("❌ Signal handling error: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
