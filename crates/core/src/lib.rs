//! Numa Core - Shared types library.
//!
//! This crate provides the domain types used across the Numa storefront
//! components:
//! - `storefront` - The public-facing storefront service
//! - `cli` - Command-line tools (seeding, management)
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no
//! storage access. Everything here is cheap to construct and safe to use
//! from any component.
//!
//! # Modules
//!
//! - [`types`] - ID newtypes, email addresses, the unified user record,
//!   cart lines, and prices

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
