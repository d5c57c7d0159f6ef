//! Bazaar Core - Shared types library.
//!
//! This crate provides the domain types used by the Bazaar storefront:
//! - catalog products, cart lines, wishlist entries and orders as the
//!   external services report them
//! - checkout snapshot and wizard state
//! - pricing arithmetic and input validation
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no session handling. This keeps it lightweight and testable.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, money, domain records, validation and totals

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
