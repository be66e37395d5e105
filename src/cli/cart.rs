use std::io;

use clap::Args;
use tally::{
    backend::CartBackend,
    cart::Cart,
    items::LineItemId,
    listing::{DEFAULT_PER_PAGE, ListQuery},
    receipt::Receipt,
    store::{CartStore, Direction},
};
use tracing::info;

use super::CliError;

#[derive(Debug, Args)]
pub(crate) struct ShowArgs {
    /// Only list lines whose name or id contains this text
    #[arg(long)]
    search: Option<String>,

    /// Page to show, starting at 1
    #[arg(long, default_value_t = 1)]
    page: usize,

    /// Lines per page
    #[arg(long, default_value_t = DEFAULT_PER_PAGE)]
    per_page: usize,
}

pub(crate) async fn show<B: CartBackend>(
    store: &CartStore<B>,
    args: ShowArgs,
    out: impl io::Write,
) -> Result<(), CliError> {
    let cart = store.load().await?;

    let query = ListQuery {
        search: args.search,
        page: args.page,
        per_page: args.per_page,
    };

    Receipt::new(&cart, store.currency())?.write_page(&query, out)?;

    Ok(())
}

pub(crate) async fn apply_coupon<B: CartBackend>(
    store: &CartStore<B>,
    code: &str,
    out: impl io::Write,
) -> Result<(), CliError> {
    let cart = store.apply_coupon(code).await?;

    match &cart.applied_coupon {
        Some(coupon) => info!(code = %coupon.code, "coupon applied"),
        None => info!("backend accepted the code but reports no coupon"),
    }

    write_cart(store, &cart, out)
}

pub(crate) async fn increment<B: CartBackend>(
    store: &CartStore<B>,
    id: &LineItemId,
    out: impl io::Write,
) -> Result<(), CliError> {
    let cart = store.adjust_quantity(id, Direction::Increment).await?;

    write_cart(store, &cart, out)
}

pub(crate) async fn decrement<B: CartBackend>(
    store: &CartStore<B>,
    id: &LineItemId,
    out: impl io::Write,
) -> Result<(), CliError> {
    let cart = store.adjust_quantity(id, Direction::Decrement).await?;

    write_cart(store, &cart, out)
}

pub(crate) async fn remove<B: CartBackend>(
    store: &CartStore<B>,
    id: &LineItemId,
    out: impl io::Write,
) -> Result<(), CliError> {
    let cart = store.remove_item(id).await?;

    write_cart(store, &cart, out)
}

fn write_cart<B: CartBackend>(
    store: &CartStore<B>,
    cart: &Cart,
    out: impl io::Write,
) -> Result<(), CliError> {
    Receipt::new(cart, store.currency())?.write_to(out)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use rust_decimal::Decimal;
    use rusty_money::iso::IDR;
    use tally::{
        backend::{BackendRequest, MemoryCartBackend},
        coupons::Coupon,
        items::LineItem,
        store::CartStoreError,
    };
    use testresult::TestResult;

    use super::*;

    fn store() -> CartStore<MemoryCartBackend> {
        let cart = Cart::with_items([
            LineItem::new(
                "li-1",
                "card-1",
                "Holo Dragon",
                Decimal::new(200_000, 0),
                NonZeroU32::MIN,
            ),
            LineItem::new(
                "li-2",
                "card-2",
                "Foil Knight",
                Decimal::new(50_000, 0),
                NonZeroU32::MIN,
            ),
        ]);

        let backend = MemoryCartBackend::new(cart)
            .with_coupons([Coupon::fixed("HALF", Decimal::new(100_000, 0))]);

        CartStore::new(backend, IDR)
    }

    #[tokio::test]
    async fn show_lists_matching_lines() -> TestResult {
        let store = store();
        let mut out = Vec::new();

        show(
            &store,
            ShowArgs {
                search: Some("dragon".to_string()),
                page: 1,
                per_page: DEFAULT_PER_PAGE,
            },
            &mut out,
        )
        .await?;

        let rendered = String::from_utf8(out)?;

        assert!(rendered.contains("Holo Dragon"));
        assert!(!rendered.contains("Foil Knight"));

        Ok(())
    }

    #[tokio::test]
    async fn apply_coupon_prints_discounted_total() -> TestResult {
        let store = store();
        let mut out = Vec::new();

        apply_coupon(&store, "HALF", &mut out).await?;

        let rendered = String::from_utf8(out)?;
        let totals = store.totals().await?;

        assert!(rendered.contains("Discount (HALF):"));
        assert_eq!(totals.total.to_minor_units(), 15_000_000);

        Ok(())
    }

    #[tokio::test]
    async fn remove_sends_one_action_and_one_fetch() -> TestResult {
        let backend = std::sync::Arc::new(MemoryCartBackend::new(Cart::default()));
        let store = CartStore::new(std::sync::Arc::clone(&backend), IDR);

        remove(&store, &LineItemId::new("gone"), io::sink()).await?;

        assert_eq!(
            backend.requests().await,
            vec![
                BackendRequest::RemoveItem(LineItemId::new("gone")),
                BackendRequest::FetchCart,
            ]
        );

        Ok(())
    }

    #[tokio::test]
    async fn rejected_coupon_is_reported() {
        let store = store();

        let result = apply_coupon(&store, "NOPE", io::sink()).await;

        assert!(
            matches!(result, Err(CliError::Store(CartStoreError::Backend(_)))),
            "got {result:?}"
        );
    }
}
