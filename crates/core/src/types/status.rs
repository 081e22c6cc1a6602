//! Stock availability levels.

use serde::{Deserialize, Serialize};

/// Stock at or below this count (and above zero) is reported as low.
pub const LOW_STOCK_THRESHOLD: u32 = 5;

/// Availability badge derived from a stock count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockLevel {
    InStock,
    LowStock,
    OutOfStock,
}

impl StockLevel {
    /// Classify a stock count.
    #[must_use]
    pub const fn from_stock(stock: u32) -> Self {
        match stock {
            0 => Self::OutOfStock,
            n if n <= LOW_STOCK_THRESHOLD => Self::LowStock,
            _ => Self::InStock,
        }
    }

    /// Whether at least one unit can be sold.
    #[must_use]
    pub const fn is_available(self) -> bool {
        !matches!(self, Self::OutOfStock)
    }
}

impl std::fmt::Display for StockLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InStock => write!(f, "in stock"),
            Self::LowStock => write!(f, "low stock"),
            Self::OutOfStock => write!(f, "out of stock"),
        }
    }
}
