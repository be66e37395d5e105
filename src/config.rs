//! Configuration
//!
//! `clap` argument groups with environment fallbacks.

use std::time::Duration;

use clap::Args;
use rusty_money::iso::Currency;

use crate::{
    backend::HttpBackendConfig,
    money::{self, AmountError},
};

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "info", global = true)]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(
        long,
        env = "LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Compact,
        global = true
    )]
    pub log_format: LogFormat,
}

/// Storefront connection settings.
#[derive(Debug, Args)]
pub struct BackendConfig {
    /// Storefront API origin
    #[arg(
        long,
        env = "TALLY_API_URL",
        default_value = "http://localhost:8080",
        global = true
    )]
    pub api_url: String,

    /// Per-request timeout in seconds
    #[arg(
        long,
        env = "TALLY_TIMEOUT_SECONDS",
        default_value_t = 10u64,
        global = true
    )]
    pub timeout_seconds: u64,

    /// ISO 4217 code used to display amounts
    #[arg(long, env = "TALLY_CURRENCY", default_value = "IDR", global = true)]
    pub currency: String,
}

impl BackendConfig {
    /// HTTP client settings.
    pub fn http(&self) -> HttpBackendConfig {
        HttpBackendConfig {
            base_url: self.api_url.clone(),
            timeout: Duration::from_secs(self.timeout_seconds),
        }
    }

    /// Resolve the display currency.
    ///
    /// # Errors
    ///
    /// Returns [`AmountError::UnknownCurrency`] for an unrecognised code.
    pub fn currency(&self) -> Result<&'static Currency, AmountError> {
        money::find_currency(&self.currency)
    }
}
