//! Vintage Shop Core - Domain types and rules.
//!
//! This crate provides the types shared by every Vintage Shop component:
//! - `storefront` - JSON API for the storefront and admin console
//! - `cli` - Command-line tools for migrations, users and catalog seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure rules - no I/O, no database
//! access, no HTTP. Everything that decides *what* happens to an order or a
//! catalog query lives here so it can be tested without a store.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails and statuses
//! - [`order`] - Orders, line merging, status transitions and archival records
//! - [`catalog`] - Products, product input validation and listing queries
//! - [`search`] - Stopwords and suffix folding for catalog search
//! - [`settings`] - The site settings singleton and its defaults
//! - [`user`] - Users as seen by the order views

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod order;
pub mod search;
pub mod settings;
pub mod types;
pub mod user;

pub use types::*;
