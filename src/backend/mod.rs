//! Cart Backend
//!
//! The backend owns the cart. Every call here is one HTTP round-trip in
//! production; the store decides when to refetch.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

use crate::{cart::Cart, items::LineItemId};

pub mod http;
pub mod memory;

pub use http::{HttpBackendConfig, HttpCartBackend};
pub use memory::{BackendRequest, MemoryCartBackend};

/// Errors reported by a cart backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The request did not reach the backend, or its response could not be read.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The configured API origin cannot carry cart routes.
    #[error("invalid backend url: {0}")]
    InvalidUrl(String),

    /// The backend rejected the input (invalid coupon, insufficient stock, ...).
    #[error("rejected by backend: {0}")]
    Validation(String),

    /// The line item no longer exists on the backend.
    #[error("line item not found")]
    NotFound,

    /// Any other non-2xx response.
    #[error("unexpected response from backend (status {status}): {body}")]
    Server {
        /// HTTP status code
        status: u16,

        /// Response body, possibly empty
        body: String,
    },
}

/// Operations the cart store needs from the backend.
#[automock]
#[async_trait]
pub trait CartBackend: Send + Sync {
    /// `GET /api/cart`
    async fn fetch_cart(&self) -> Result<Cart, BackendError>;

    /// `DELETE /api/cart/item/{id}`
    async fn remove_item(&self, item: LineItemId) -> Result<(), BackendError>;

    /// `PATCH /api/cart/item/{id}/add`
    async fn increment_item(&self, item: LineItemId) -> Result<(), BackendError>;

    /// `PATCH /api/cart/item/{id}/subtract`
    async fn decrement_item(&self, item: LineItemId) -> Result<(), BackendError>;

    /// `POST /api/cart/apply-coupon`
    async fn apply_coupon(&self, code: String) -> Result<(), BackendError>;
}

#[async_trait]
impl<B: CartBackend + ?Sized> CartBackend for Arc<B> {
    async fn fetch_cart(&self) -> Result<Cart, BackendError> {
        (**self).fetch_cart().await
    }

    async fn remove_item(&self, item: LineItemId) -> Result<(), BackendError> {
        (**self).remove_item(item).await
    }

    async fn increment_item(&self, item: LineItemId) -> Result<(), BackendError> {
        (**self).increment_item(item).await
    }

    async fn decrement_item(&self, item: LineItemId) -> Result<(), BackendError> {
        (**self).decrement_item(item).await
    }

    async fn apply_coupon(&self, code: String) -> Result<(), BackendError> {
        (**self).apply_coupon(code).await
    }
}
