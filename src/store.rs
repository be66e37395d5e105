//! Cart Store
//!
//! Holds the last known-good cart and drives mutations against the backend.
//! Each mutation is one action request followed by one full refetch; the held
//! snapshot only changes when that refetch succeeds. One mutation may be in
//! flight per store.

use std::{
    fmt::{self, Display, Formatter},
    sync::atomic::{AtomicBool, Ordering},
};

use rusty_money::iso::Currency;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{Span, debug, info, warn};

use crate::{
    backend::{BackendError, CartBackend},
    cart::Cart,
    items::LineItemId,
    pricing::{PriceBreakdown, PricingError, price_cart},
    selection::Selection,
};

/// Quantity adjustment direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// One more unit
    Increment,

    /// One fewer unit; the backend removes the line at zero
    Decrement,
}

/// A mutating cart operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Apply a coupon code
    ApplyCoupon(String),

    /// Change a line's quantity by one
    AdjustQuantity(LineItemId, Direction),

    /// Remove a line
    RemoveItem(LineItemId),
}

impl Mutation {
    /// The line item whose controls are tied to this mutation, if any.
    pub fn line_item(&self) -> Option<&LineItemId> {
        match self {
            Mutation::ApplyCoupon(_) => None,
            Mutation::AdjustQuantity(item, _) | Mutation::RemoveItem(item) => Some(item),
        }
    }
}

impl Display for Mutation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Mutation::ApplyCoupon(_) => f.write_str("apply_coupon"),
            Mutation::AdjustQuantity(item, Direction::Increment) => write!(f, "increment {item}"),
            Mutation::AdjustQuantity(item, Direction::Decrement) => write!(f, "decrement {item}"),
            Mutation::RemoveItem(item) => write!(f, "remove {item}"),
        }
    }
}

/// Store status.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CartStatus {
    /// No request in flight
    #[default]
    Idle,

    /// A mutation (or load) is in flight
    Mutating(Option<Mutation>),

    /// The last operation failed; the previous cart is still held
    Error(String),
}

/// Errors surfaced by [`CartStore`] operations.
#[derive(Debug, Error)]
pub enum CartStoreError {
    /// Another mutation has not finished its refetch yet.
    #[error("another cart update is still in progress")]
    Busy,

    /// The coupon code was empty or whitespace.
    #[error("coupon code cannot be empty")]
    EmptyCouponCode,

    /// The store was detached while the request was in flight.
    #[error("cart view detached; result discarded")]
    Detached,

    /// Backend failure.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[derive(Debug, Default)]
struct StoreState {
    cart: Cart,
    status: CartStatus,
    selection: Selection,
}

/// Client-side cart state machine.
#[derive(Debug)]
pub struct CartStore<B> {
    backend: B,
    currency: &'static Currency,
    state: RwLock<StoreState>,
    in_flight: Mutex<()>,
    detached: AtomicBool,
}

impl<B: CartBackend> CartStore<B> {
    /// Create an empty store; call [`CartStore::load`] to fetch the cart.
    pub fn new(backend: B, currency: &'static Currency) -> Self {
        Self {
            backend,
            currency,
            state: RwLock::new(StoreState::default()),
            in_flight: Mutex::new(()),
            detached: AtomicBool::new(false),
        }
    }

    /// Fetch the cart and replace the held snapshot.
    ///
    /// # Errors
    ///
    /// - [`CartStoreError::Busy`]: a mutation is in flight.
    /// - [`CartStoreError::Backend`]: the fetch failed; the held cart is unchanged.
    /// - [`CartStoreError::Detached`]: the store was detached meanwhile.
    #[tracing::instrument(name = "cart_store.load", skip(self))]
    pub async fn load(&self) -> Result<Cart, CartStoreError> {
        let _in_flight = self
            .in_flight
            .try_lock()
            .map_err(|_busy| CartStoreError::Busy)?;

        self.set_status(CartStatus::Mutating(None)).await;

        let outcome = self.backend.fetch_cart().await;

        self.settle(None, outcome).await
    }

    /// Apply a coupon code. The held coupon is whatever the backend reports
    /// after the refetch.
    ///
    /// # Errors
    ///
    /// - [`CartStoreError::EmptyCouponCode`]: blank code; no request is sent.
    /// - [`CartStoreError::Backend`]: e.g. `Validation` for an invalid or expired code.
    /// - [`CartStoreError::Busy`] / [`CartStoreError::Detached`].
    pub async fn apply_coupon(&self, code: &str) -> Result<Cart, CartStoreError> {
        if code.trim().is_empty() {
            return Err(CartStoreError::EmptyCouponCode);
        }

        self.mutate(Mutation::ApplyCoupon(code.to_string())).await
    }

    /// Ask the backend to change a line's quantity by one, then refetch.
    ///
    /// # Errors
    ///
    /// - [`CartStoreError::Backend`]: `NotFound` for a line the backend no longer
    ///   has, `Validation` for stock limits.
    /// - [`CartStoreError::Busy`] / [`CartStoreError::Detached`].
    pub async fn adjust_quantity(
        &self,
        item: &LineItemId,
        direction: Direction,
    ) -> Result<Cart, CartStoreError> {
        self.mutate(Mutation::AdjustQuantity(item.clone(), direction))
            .await
    }

    /// Remove a line, then refetch. Removing a line that is already gone succeeds.
    ///
    /// # Errors
    ///
    /// - [`CartStoreError::Backend`]: any failure other than `NotFound`.
    /// - [`CartStoreError::Busy`] / [`CartStoreError::Detached`].
    pub async fn remove_item(&self, item: &LineItemId) -> Result<Cart, CartStoreError> {
        self.mutate(Mutation::RemoveItem(item.clone())).await
    }

    /// The last known-good cart.
    pub async fn cart(&self) -> Cart {
        self.state.read().await.cart.clone()
    }

    /// Current status.
    pub async fn status(&self) -> CartStatus {
        self.state.read().await.status.clone()
    }

    /// Whether controls for `item` should be disabled.
    pub async fn is_pending(&self, item: &LineItemId) -> bool {
        matches!(
            &self.state.read().await.status,
            CartStatus::Mutating(Some(mutation)) if mutation.line_item() == Some(item)
        )
    }

    /// Totals derived from the held cart.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if the held cart carries invalid amounts.
    pub async fn totals(&self) -> Result<PriceBreakdown<'static>, PricingError> {
        price_cart(&self.state.read().await.cart, self.currency)
    }

    /// Display currency.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Select every line of the held cart.
    pub async fn select_all(&self) {
        let mut state = self.state.write().await;
        let StoreState { cart, selection, .. } = &mut *state;

        selection.select_all(cart);
    }

    /// Flip the selection of `item`; returns whether it is now selected.
    ///
    /// Ids that are not lines of the held cart are ignored.
    pub async fn toggle_select(&self, item: &LineItemId) -> bool {
        let mut state = self.state.write().await;
        let StoreState { cart, selection, .. } = &mut *state;

        cart.contains(item) && selection.toggle(item)
    }

    /// Deselect everything.
    pub async fn clear_selection(&self) {
        self.state.write().await.selection.clear();
    }

    /// Current selection.
    pub async fn selected(&self) -> Selection {
        self.state.read().await.selection.clone()
    }

    /// Stop applying results to this store. In-flight requests still complete
    /// on the backend.
    pub fn detach(&self) {
        self.detached.store(true, Ordering::Release);
    }

    /// Whether [`CartStore::detach`] has been called.
    pub fn is_detached(&self) -> bool {
        self.detached.load(Ordering::Acquire)
    }

    #[tracing::instrument(
        name = "cart_store.mutate",
        skip(self, mutation),
        fields(mutation = %mutation, items = tracing::field::Empty)
    )]
    async fn mutate(&self, mutation: Mutation) -> Result<Cart, CartStoreError> {
        let _in_flight = self
            .in_flight
            .try_lock()
            .map_err(|_busy| CartStoreError::Busy)?;

        self.set_status(CartStatus::Mutating(Some(mutation.clone())))
            .await;

        let outcome = match self.send(&mutation).await {
            Ok(()) => self.backend.fetch_cart().await,
            Err(error) => Err(error),
        };

        if let Ok(cart) = &outcome {
            Span::current().record("items", cart.len());
        }

        self.settle(Some(&mutation), outcome).await
    }

    async fn send(&self, mutation: &Mutation) -> Result<(), BackendError> {
        match mutation {
            Mutation::ApplyCoupon(code) => self.backend.apply_coupon(code.clone()).await,
            Mutation::AdjustQuantity(item, Direction::Increment) => {
                self.backend.increment_item(item.clone()).await
            }
            Mutation::AdjustQuantity(item, Direction::Decrement) => {
                self.backend.decrement_item(item.clone()).await
            }
            Mutation::RemoveItem(item) => match self.backend.remove_item(item.clone()).await {
                Err(BackendError::NotFound) => {
                    debug!(item = %item, "line item already absent");
                    Ok(())
                }
                other => other,
            },
        }
    }

    async fn set_status(&self, status: CartStatus) {
        if self.is_detached() {
            return;
        }

        self.state.write().await.status = status;
    }

    async fn settle(
        &self,
        mutation: Option<&Mutation>,
        outcome: Result<Cart, BackendError>,
    ) -> Result<Cart, CartStoreError> {
        if self.is_detached() {
            debug!("store detached; discarding result");
            return Err(CartStoreError::Detached);
        }

        let mut state = self.state.write().await;

        match outcome {
            Ok(cart) => {
                let dropped = state.selection.retain_present(&cart);

                state.cart = cart.clone();
                state.status = CartStatus::Idle;

                if let Some(mutation) = mutation {
                    info!(
                        %mutation,
                        items = cart.len(),
                        dropped_selections = dropped,
                        "cart updated"
                    );
                }

                Ok(cart)
            }
            Err(error) => {
                warn!(?mutation, %error, "cart update failed");

                state.status = CartStatus::Error(error.to_string());

                Err(error.into())
            }
        }
    }
}
