//! Core types for the Numa storefront.
//!
//! Type-safe wrappers for the domain concepts shared between the
//! storefront service and the CLI.

pub mod cart;
pub mod email;
pub mod id;
pub mod identity;
pub mod price;

pub use cart::{CartLine, cart_count};
pub use email::{Email, EmailError};
pub use id::*;
pub use identity::Identity;
pub use price::{CurrencyCode, Price};
