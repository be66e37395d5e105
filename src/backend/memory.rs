//! In-memory cart backend.
//!
//! Mirrors the storefront's cart rules (stock limits, decrement-to-removal,
//! exact-match coupon codes) without a network. Used for offline quotes and
//! as the backend double in store tests.

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use tokio::sync::Mutex;

use crate::{
    backend::{BackendError, CartBackend},
    cart::Cart,
    coupons::Coupon,
    items::LineItemId,
};

/// A request as received by [`MemoryCartBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendRequest {
    /// `GET /api/cart`
    FetchCart,

    /// `DELETE /api/cart/item/{id}`
    RemoveItem(LineItemId),

    /// `PATCH /api/cart/item/{id}/add`
    IncrementItem(LineItemId),

    /// `PATCH /api/cart/item/{id}/subtract`
    DecrementItem(LineItemId),

    /// `POST /api/cart/apply-coupon`
    ApplyCoupon(String),
}

#[derive(Debug, Default)]
struct MemoryState {
    cart: Cart,
    coupons: FxHashMap<String, Coupon>,
    stock: FxHashMap<LineItemId, u32>,
    requests: Vec<BackendRequest>,
}

/// Cart backend holding its state in memory.
#[derive(Debug, Default)]
pub struct MemoryCartBackend {
    state: Mutex<MemoryState>,
}

impl MemoryCartBackend {
    /// Create a backend serving `cart`.
    pub fn new(cart: Cart) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                cart,
                ..MemoryState::default()
            }),
        }
    }

    /// Register coupons that `apply_coupon` will accept.
    #[must_use]
    pub fn with_coupons(mut self, coupons: impl IntoIterator<Item = Coupon>) -> Self {
        self.state.get_mut().coupons.extend(
            coupons
                .into_iter()
                .map(|coupon| (coupon.code.clone(), coupon)),
        );
        self
    }

    /// Cap the quantity a line can be incremented to.
    #[must_use]
    pub fn with_stock_limit(mut self, item: impl Into<LineItemId>, limit: u32) -> Self {
        self.state.get_mut().stock.insert(item.into(), limit);
        self
    }

    /// Requests received so far, in arrival order.
    pub async fn requests(&self) -> Vec<BackendRequest> {
        self.state.lock().await.requests.clone()
    }

    /// Current authoritative cart.
    pub async fn snapshot(&self) -> Cart {
        self.state.lock().await.cart.clone()
    }
}

#[async_trait]
impl CartBackend for MemoryCartBackend {
    async fn fetch_cart(&self) -> Result<Cart, BackendError> {
        let mut state = self.state.lock().await;
        state.requests.push(BackendRequest::FetchCart);

        Ok(state.cart.clone())
    }

    async fn remove_item(&self, item: LineItemId) -> Result<(), BackendError> {
        let mut state = self.state.lock().await;
        state.requests.push(BackendRequest::RemoveItem(item.clone()));

        let before = state.cart.items.len();
        state.cart.items.retain(|line| line.id != item);

        if state.cart.items.len() == before {
            return Err(BackendError::NotFound);
        }

        Ok(())
    }

    async fn increment_item(&self, item: LineItemId) -> Result<(), BackendError> {
        let mut state = self.state.lock().await;
        state.requests.push(BackendRequest::IncrementItem(item.clone()));

        let limit = state.stock.get(&item).copied();

        let line = state
            .cart
            .items
            .iter_mut()
            .find(|line| line.id == item)
            .ok_or(BackendError::NotFound)?;

        let next = line
            .quantity
            .checked_add(1)
            .ok_or_else(|| BackendError::Validation("quantity limit reached".to_string()))?;

        if limit.is_some_and(|limit| next.get() > limit) {
            return Err(BackendError::Validation("insufficient stock".to_string()));
        }

        line.quantity = next;

        Ok(())
    }

    async fn decrement_item(&self, item: LineItemId) -> Result<(), BackendError> {
        let mut state = self.state.lock().await;
        state.requests.push(BackendRequest::DecrementItem(item.clone()));

        let position = state
            .cart
            .items
            .iter()
            .position(|line| line.id == item)
            .ok_or(BackendError::NotFound)?;

        let Some(line) = state.cart.items.get_mut(position) else {
            return Err(BackendError::NotFound);
        };

        match line.quantity.get().checked_sub(1).and_then(std::num::NonZeroU32::new) {
            Some(quantity) => line.quantity = quantity,
            None => {
                state.cart.items.remove(position);
            }
        }

        Ok(())
    }

    async fn apply_coupon(&self, code: String) -> Result<(), BackendError> {
        let mut state = self.state.lock().await;
        state.requests.push(BackendRequest::ApplyCoupon(code.clone()));

        let coupon = state
            .coupons
            .get(&code)
            .cloned()
            .ok_or_else(|| BackendError::Validation(format!("invalid coupon code: {code}")))?;

        state.cart.applied_coupon = Some(coupon);

        Ok(())
    }
}
