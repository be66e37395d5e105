use std::{io, path::PathBuf};

use clap::Args;
use tally::{backend::MemoryCartBackend, fixtures::CartFixture, receipt::Receipt, store::CartStore};
use tracing::debug;

use super::CliError;

#[derive(Debug, Args)]
pub(crate) struct QuoteArgs {
    /// YAML cart fixture
    file: PathBuf,

    /// Coupon code to apply, overriding the fixture's `apply`
    #[arg(long)]
    coupon: Option<String>,
}

/// Price a fixture through an in-memory backend.
pub(crate) async fn run(args: QuoteArgs, out: impl io::Write) -> Result<(), CliError> {
    let fixture = CartFixture::from_path(&args.file)?.load()?;
    let currency = fixture.currency;

    debug!(
        file = %args.file.display(),
        items = fixture.cart.len(),
        coupons = fixture.coupons.len(),
        "loaded cart fixture"
    );

    let backend = MemoryCartBackend::new(fixture.cart).with_coupons(fixture.coupons);
    let store = CartStore::new(backend, currency);

    let mut cart = store.load().await?;

    if let Some(code) = args.coupon.or(fixture.apply) {
        cart = store.apply_coupon(&code).await?;
    }

    Receipt::new(&cart, currency)?.write_to(out)?;

    Ok(())
}
