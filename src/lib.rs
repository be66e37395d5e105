//! Tally
//!
//! Tally prices shopping carts and applies coupons for a storefront whose backend
//! owns the cart. Pricing is pure and works in minor units; the cart store sends
//! one action per mutation and adopts whatever the backend reports on refetch.

pub mod access;
pub mod backend;
pub mod cart;
pub mod config;
pub mod coupons;
pub mod discounts;
pub mod fixtures;
pub mod items;
pub mod listing;
pub mod money;
pub mod observability;
pub mod pricing;
pub mod receipt;
pub mod selection;
pub mod store;
