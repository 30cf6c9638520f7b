//! Cart lines and derived counts.

use serde::{Deserialize, Serialize};

use crate::types::id::ProductId;

/// A single cart line: one product and its quantity.
///
/// A user's cart holds at most one line per product; quantity changes
/// replace the line rather than appending a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// The product in this line.
    pub product_id: ProductId,
    /// Number of units. Always at least 1 in a stored cart; a quantity
    /// of 0 passed to a mutation removes the line.
    pub quantity: u32,
}

impl CartLine {
    /// Create a new cart line.
    #[must_use]
    pub fn new(product_id: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Total item count across a set of cart lines.
///
/// This is the number shown on the header badge: the sum of quantities,
/// not the number of distinct products.
#[must_use]
pub fn cart_count(lines: &[CartLine]) -> u32 {
    lines.iter().map(|line| line.quantity).sum()
}
