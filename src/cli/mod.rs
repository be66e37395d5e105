use std::io;

use clap::{Parser, Subcommand};
use tally::{
    backend::{BackendError, HttpCartBackend},
    config::{BackendConfig, LoggingConfig},
    fixtures::FixtureError,
    items::LineItemId,
    money::AmountError,
    receipt::ReceiptError,
    store::{CartStore, CartStoreError},
};
use thiserror::Error;

mod cart;
mod quote;

#[derive(Debug, Parser)]
#[command(name = "tally", about = "Cart pricing and coupon client", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) backend: BackendConfig,

    #[command(flatten)]
    pub(crate) logging: LoggingConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show the cart and its totals
    Show(cart::ShowArgs),

    /// Apply a coupon code to the cart
    ApplyCoupon {
        /// Coupon code, sent as typed
        code: String,
    },

    /// Add one unit of a line
    Increment {
        /// Line item id
        id: LineItemId,
    },

    /// Remove one unit of a line; the line goes away at zero
    Decrement {
        /// Line item id
        id: LineItemId,
    },

    /// Remove a line
    Remove {
        /// Line item id
        id: LineItemId,
    },

    /// Price a YAML cart fixture offline
    Quote(quote::QuoteArgs),
}

/// Errors reported by CLI commands.
#[derive(Debug, Error)]
pub(crate) enum CliError {
    #[error("invalid configuration: {0}")]
    Config(#[from] AmountError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Store(#[from] CartStoreError),

    #[error(transparent)]
    Fixture(#[from] FixtureError),

    #[error(transparent)]
    Receipt(#[from] ReceiptError),

    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl Cli {
    /// Load configuration from `.env`, environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if arguments cannot be parsed
    pub(crate) fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    pub(crate) async fn run(self, out: impl io::Write) -> Result<(), CliError> {
        match self.command {
            Commands::Quote(args) => quote::run(args, out).await,
            Commands::Show(args) => cart::show(&remote_store(&self.backend)?, args, out).await,
            Commands::ApplyCoupon { code } => {
                cart::apply_coupon(&remote_store(&self.backend)?, &code, out).await
            }
            Commands::Increment { id } => {
                cart::increment(&remote_store(&self.backend)?, &id, out).await
            }
            Commands::Decrement { id } => {
                cart::decrement(&remote_store(&self.backend)?, &id, out).await
            }
            Commands::Remove { id } => cart::remove(&remote_store(&self.backend)?, &id, out).await,
        }
    }
}

fn remote_store(config: &BackendConfig) -> Result<CartStore<HttpCartBackend>, CliError> {
    Ok(CartStore::new(
        HttpCartBackend::new(config.http())?,
        config.currency()?,
    ))
}
