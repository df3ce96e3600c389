//! Application configuration loaded from environment variables.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::trading::TimeInForce;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Polymarket Credentials ===
    /// Wallet private key (hex, starts with 0x). Only needed for live trading.
    #[serde(default)]
    pub polymarket_private_key: String,

    // === Wallet Configuration ===
    /// Signature type: 0=EOA, 1=Magic.link, 2=Gnosis Safe.
    #[serde(default = "default_signature_type")]
    pub polymarket_signature_type: u8,

    /// Proxy wallet address (required for Magic.link).
    #[serde(default)]
    pub polymarket_funder: Option<String>,

    // === Market Discovery ===
    /// Slug prefix of the recurring market family.
    #[serde(default = "default_market_prefix")]
    pub market_prefix: String,

    /// Lifetime of one market window in seconds.
    #[serde(default = "default_window_seconds")]
    pub window_seconds: i64,

    /// Page whose markup lists the current windows.
    #[serde(default = "default_listing_url")]
    pub listing_url: String,

    /// Force specific market slug (bypasses auto-discovery).
    #[serde(default)]
    pub polymarket_market_slug: Option<String>,

    /// Consecutive not-found ticks before a distinct warning is raised.
    #[serde(default = "default_not_found_threshold")]
    pub not_found_warn_threshold: u32,

    // === Hedge Orders ===
    /// Seconds between hedge placements.
    #[serde(default = "default_trade_interval")]
    pub trade_interval_seconds: u64,

    /// Limit price for each hedge leg.
    #[serde(default = "default_order_price")]
    pub order_price: Decimal,

    /// Number of shares per hedge leg.
    #[serde(default = "default_order_size")]
    pub order_size: Decimal,

    /// Order type: FOK, FAK, or GTC.
    #[serde(default = "default_order_type")]
    pub order_type: String,

    /// Simulation mode (no real orders).
    #[serde(default = "default_true")]
    pub dry_run: bool,

    // === Holder Report ===
    /// Seconds between holder reports.
    #[serde(default = "default_holders_poll")]
    pub holders_poll_seconds: u64,

    /// Holders requested per outcome.
    #[serde(default = "default_holders_limit")]
    pub holders_limit: u32,

    /// Minimum balance for a holder to be listed.
    #[serde(default = "default_holders_min_balance")]
    pub holders_min_balance: u32,

    /// Profile link template, `{name}` is replaced by the display name.
    #[serde(default = "default_profile_url")]
    pub profile_url_template: String,

    /// Explorer link template, `{wallet}` is replaced by the wallet address.
    #[serde(default = "default_explorer_url")]
    pub explorer_url_template: String,

    // === Endpoints ===
    /// CLOB API base URL.
    #[serde(default = "default_clob_url")]
    pub polymarket_clob_url: String,

    /// Gamma API base URL.
    #[serde(default = "default_gamma_url")]
    pub polymarket_gamma_url: String,

    /// Data API base URL.
    #[serde(default = "default_data_url")]
    pub polymarket_data_url: String,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_ms: u64,

    // === Server Configuration ===
    /// HTTP server port for health/metrics endpoints.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Log output format: "pretty" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Enable verbose logging.
    #[serde(default)]
    pub verbose: bool,
}

fn default_signature_type() -> u8 {
    1
}

fn default_market_prefix() -> String {
    "btc-updown-15m".to_string()
}

fn default_window_seconds() -> i64 {
    900
}

fn default_listing_url() -> String {
    "https://polymarket.com/crypto/15M".to_string()
}

fn default_not_found_threshold() -> u32 {
    3
}

fn default_trade_interval() -> u64 {
    900
}

fn default_order_price() -> Decimal {
    Decimal::new(3, 2) // 0.03
}

fn default_order_size() -> Decimal {
    Decimal::new(33, 0) // 33 shares
}

fn default_order_type() -> String {
    "GTC".to_string()
}

fn default_true() -> bool {
    true
}

fn default_holders_poll() -> u64 {
    10
}

fn default_holders_limit() -> u32 {
    5
}

fn default_holders_min_balance() -> u32 {
    1
}

fn default_profile_url() -> String {
    "https://polymarket.com/@{name}".to_string()
}

fn default_explorer_url() -> String {
    "https://polygonscan.com/address/{wallet}".to_string()
}

fn default_clob_url() -> String {
    "https://clob.polymarket.com".to_string()
}

fn default_gamma_url() -> String {
    "https://gamma-api.polymarket.com".to_string()
}

fn default_data_url() -> String {
    "https://data-api.polymarket.com".to_string()
}

fn default_http_timeout() -> u64 {
    10_000
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Build configuration from explicit key/value pairs (upper-case keys).
    pub fn from_vars<I>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter(vars)
    }

    /// Check settings shared by every command.
    pub fn validate(&self) -> Result<(), String> {
        if self.market_prefix.is_empty() {
            return Err("MARKET_PREFIX must not be empty".to_string());
        }

        if self.window_seconds <= 0 {
            return Err("WINDOW_SECONDS must be positive".to_string());
        }

        if self.trade_interval_seconds == 0 || self.holders_poll_seconds == 0 {
            return Err("TRADE_INTERVAL_SECONDS and HOLDERS_POLL_SECONDS must be positive".to_string());
        }

        if self.not_found_warn_threshold == 0 {
            return Err("NOT_FOUND_WARN_THRESHOLD must be at least 1".to_string());
        }

        Ok(())
    }

    /// Check settings required to place hedge orders.
    pub fn validate_trading(&self) -> Result<(), String> {
        self.validate()?;

        if self.order_price <= Decimal::ZERO || self.order_price >= Decimal::ONE {
            return Err("ORDER_PRICE must be between 0 and 1".to_string());
        }

        if self.order_size <= Decimal::ZERO {
            return Err("ORDER_SIZE must be positive".to_string());
        }

        if self.time_in_force().is_none() {
            return Err(format!("ORDER_TYPE `{}` is not one of FOK, FAK, GTC", self.order_type));
        }

        if self.dry_run {
            return Ok(());
        }

        if self.polymarket_private_key.is_empty() {
            return Err("POLYMARKET_PRIVATE_KEY is required".to_string());
        }

        if !self.polymarket_private_key.starts_with("0x") {
            return Err("POLYMARKET_PRIVATE_KEY must start with 0x".to_string());
        }

        if self.is_magic_link() && self.polymarket_funder.is_none() {
            return Err("POLYMARKET_FUNDER is required for signature type 1".to_string());
        }

        Ok(())
    }

    /// Parsed order type.
    pub fn time_in_force(&self) -> Option<TimeInForce> {
        self.order_type.parse().ok()
    }

    /// Check if using Magic.link (signature_type == 1).
    pub fn is_magic_link(&self) -> bool {
        self.polymarket_signature_type == 1
    }
}
