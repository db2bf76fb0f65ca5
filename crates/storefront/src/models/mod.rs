//! API-facing models for the storefront.
//!
//! Core types describe what is stored; the types here describe what handlers
//! return, with references to users and products resolved for display.

pub mod identity;
pub mod newsletter;
pub mod views;

pub use identity::{CurrentUser, IdentityError};
pub use views::{CancelledOrderView, LineView, OrderView, ShippedOrderView};
