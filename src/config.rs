use std::time::Duration;

use anyhow::Result;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::constants::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token, normally supplied through TELEGRAM_TOKEN
    #[serde(default)]
    pub bot_token: String,
    /// Target chat, normally supplied through CHAT_ID
    #[serde(default)]
    pub chat_id: i64,
    pub api_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingConfig {
    pub symbol: String,
    /// Hypothetical toman capital deployed in every evaluation
    pub capital: Decimal,
    pub min_profit_percent: Decimal,
    /// Minimum USDT amount worth signalling
    pub min_trade_amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    pub max_attempts: u32,
    pub timeout_secs: u64,
    pub backoff_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub poll_interval_secs: u64,
    pub error_backoff_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    pub path: String,
    pub seed_balance: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueConfig {
    pub name: String,
    pub enabled: bool,
    pub api_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    pub fee_rate: Decimal,
    pub reference_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub trading: TradingConfig,
    pub fetch: FetchConfig,
    pub scheduler: SchedulerConfig,
    pub wallet: WalletConfig,
    pub venues: Vec<VenueConfig>,
    /// Simulated venues and log-only notifications (set by --mock or API_MODE=mock)
    #[serde(skip)]
    pub mock_mode: bool,
}

impl Config {
    pub async fn load(path: &str) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub async fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    pub fn default() -> Self {
        Self {
            telegram: TelegramConfig {
                bot_token: String::new(),
                chat_id: 0,
                api_url: TELEGRAM_API_URL.to_string(),
            },
            trading: TradingConfig {
                symbol: DEFAULT_SYMBOL.to_string(),
                capital: Decimal::from(DEFAULT_CAPITAL),
                min_profit_percent: DEFAULT_MIN_PROFIT_PERCENT.parse().unwrap_or(Decimal::ONE),
                min_trade_amount: Decimal::from(DEFAULT_MIN_TRADE_AMOUNT),
            },
            fetch: FetchConfig {
                max_attempts: FETCH_MAX_ATTEMPTS,
                timeout_secs: FETCH_TIMEOUT_SECS,
                backoff_secs: FETCH_BACKOFF_SECS,
            },
            scheduler: SchedulerConfig {
                poll_interval_secs: POLL_INTERVAL_SECS,
                error_backoff_secs: ERROR_BACKOFF_SECS,
            },
            wallet: WalletConfig {
                path: DEFAULT_WALLET_PATH.to_string(),
                seed_balance: Decimal::from(DEFAULT_SEED_BALANCE),
            },
            venues: vec![
                VenueConfig {
                    name: NOBITEX.to_string(),
                    enabled: true,
                    api_url: NOBITEX_API_URL.to_string(),
                    api_key: None,
                    fee_rate: NOBITEX_FEE_RATE.parse().unwrap_or_default(),
                    reference_url: NOBITEX_MARKET_URL.to_string(),
                },
                VenueConfig {
                    name: RAMZINEX.to_string(),
                    enabled: true,
                    api_url: RAMZINEX_API_URL.to_string(),
                    api_key: None,
                    fee_rate: RAMZINEX_FEE_RATE.parse().unwrap_or_default(),
                    reference_url: RAMZINEX_MARKET_URL.to_string(),
                },
                VenueConfig {
                    name: TABDEAL.to_string(),
                    enabled: true,
                    api_url: TABDEAL_API_URL.to_string(),
                    api_key: None,
                    fee_rate: TABDEAL_FEE_RATE.parse().unwrap_or_default(),
                    reference_url: TABDEAL_MARKET_URL.to_string(),
                },
            ],
            mock_mode: false,
        }
    }

    pub fn get_venue(&self, name: &str) -> Option<&VenueConfig> {
        self.venues.iter().find(|venue| venue.name == name)
    }

    pub fn get_enabled_venues(&self) -> Vec<&VenueConfig> {
        self.venues.iter().filter(|venue| venue.enabled).collect()
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch.timeout_secs)
    }

    /// Overlay secrets and paths from the process environment
    pub fn load_environment_variables(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("TELEGRAM_TOKEN") {
            self.telegram.bot_token = token;
            info!("🔑 Telegram token loaded from environment");
        }

        if let Some(chat_id) = lookup("CHAT_ID") {
            match chat_id.trim().parse::<i64>() {
                Ok(id) => self.telegram.chat_id = id,
                Err(_) => warn!("⚠️ CHAT_ID is not an integer: {}", chat_id),
            }
        }

        if let Some(path) = lookup("WALLET_PATH") {
            self.wallet.path = path;
        }

        for (venue, key) in [
            (NOBITEX, "NOBITEX_TOKEN"),
            (RAMZINEX, "RAMZINEX_API_KEY"),
            (TABDEAL, "TABDEAL_API_KEY"),
        ] {
            if let Some(secret) = lookup(key) {
                if let Some(venue_cfg) = self.venues.iter_mut().find(|v| v.name == venue) {
                    venue_cfg.api_key = Some(secret);
                    info!("🔑 {} credential loaded from environment", venue);
                }
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.mock_mode {
            if self.telegram.bot_token.is_empty() {
                return Err(anyhow::anyhow!("Telegram bot token must be configured (TELEGRAM_TOKEN)"));
            }
            if self.telegram.chat_id == 0 {
                return Err(anyhow::anyhow!("Telegram chat id must be configured (CHAT_ID)"));
            }
        }

        if self.trading.symbol.is_empty() {
            return Err(anyhow::anyhow!("Trading symbol cannot be empty"));
        }

        if self.trading.capital <= Decimal::ZERO {
            return Err(anyhow::anyhow!("Trading capital must be positive"));
        }

        if self.trading.min_trade_amount < Decimal::ZERO {
            return Err(anyhow::anyhow!("Minimum trade amount cannot be negative"));
        }

        if self.fetch.max_attempts == 0 {
            return Err(anyhow::anyhow!("Fetch attempts must be greater than 0"));
        }

        if self.fetch.timeout_secs == 0 {
            return Err(anyhow::anyhow!("Fetch timeout must be greater than 0"));
        }

        if self.scheduler.poll_interval_secs == 0 || self.scheduler.error_backoff_secs == 0 {
            return Err(anyhow::anyhow!("Scheduler intervals must be greater than 0"));
        }

        if self.wallet.seed_balance < Decimal::ZERO {
            return Err(anyhow::anyhow!("Wallet seed balance cannot be negative"));
        }

        let enabled = self.get_enabled_venues();
        if enabled.len() < 2 {
            return Err(anyhow::anyhow!("At least two venues must be enabled"));
        }

        for venue in enabled {
            if venue.fee_rate < Decimal::ZERO || venue.fee_rate >= Decimal::ONE {
                return Err(anyhow::anyhow!("Fee rate for {} must be in [0, 1)", venue.name));
            }
            if !self.mock_mode && venue.api_key.as_deref().map_or(true, str::is_empty) {
                return Err(anyhow::anyhow!("API credential for {} must be configured", venue.name));
            }
        }

        Ok(())
    }

    #[cfg(test)]
    pub fn load_test_config() -> Self {
        let mut config = Self::default();

        config.telegram.bot_token = "123456:test-token".to_string();
        config.telegram.chat_id = 42;
        for venue in config.venues.iter_mut() {
            venue.api_key = Some(format!("{}-key", venue.name));
        }

        config
    }
}
