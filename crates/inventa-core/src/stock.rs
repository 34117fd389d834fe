//! # Stock Thresholds
//!
//! Classifies a product's stock against its min/max thresholds.
//!
//! ```text
//!   stock ≤ 0          0 < stock ≤ min      min < stock ≤ max      stock > max
//! ──────────────┼──────────────────────┼──────────────────────┼──────────────
//!    CRÍTICO    │         BAJO         │        NORMAL        │    EXCESO
//! ```
//!
//! Only CRÍTICO and BAJO products appear in the low-stock listing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a product's stock level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    /// Out of stock. Negative stock (oversold) also lands here.
    Critical,
    /// At or below the minimum threshold.
    Low,
    Normal,
    /// Above the maximum threshold.
    Excess,
}

impl StockStatus {
    /// Classifies `stock` against `[min, max]`.
    ///
    /// ```rust
    /// use inventa_core::StockStatus;
    ///
    /// assert_eq!(StockStatus::classify(0, 10, 100), StockStatus::Critical);
    /// assert_eq!(StockStatus::classify(5, 10, 100), StockStatus::Low);
    /// assert_eq!(StockStatus::classify(10, 10, 100), StockStatus::Low);
    /// assert_eq!(StockStatus::classify(11, 10, 100), StockStatus::Normal);
    /// assert_eq!(StockStatus::classify(101, 10, 100), StockStatus::Excess);
    /// ```
    pub fn classify(stock: i64, min: i64, max: i64) -> Self {
        if stock <= 0 {
            StockStatus::Critical
        } else if stock <= min {
            StockStatus::Low
        } else if stock > max {
            StockStatus::Excess
        } else {
            StockStatus::Normal
        }
    }

    /// True for the statuses included in the low-stock listing.
    pub fn needs_restock(&self) -> bool {
        matches!(self, StockStatus::Critical | StockStatus::Low)
    }

    /// Label printed in the STATUS column.
    pub fn label(&self) -> &'static str {
        match self {
            StockStatus::Critical => "CRÍTICO",
            StockStatus::Low => "BAJO",
            StockStatus::Normal => "NORMAL",
            StockStatus::Excess => "EXCESO",
        }
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_stock_is_critical() {
        assert_eq!(StockStatus::classify(0, 10, 100), StockStatus::Critical);
        assert_eq!(StockStatus::classify(0, 0, 0), StockStatus::Critical);
        assert_eq!(StockStatus::Critical.label(), "CRÍTICO");
    }

    #[test]
    fn test_negative_stock_is_critical() {
        assert_eq!(StockStatus::classify(-3, 10, 100), StockStatus::Critical);
    }

    #[test]
    fn test_low_boundary_inclusive() {
        assert_eq!(StockStatus::classify(1, 10, 100), StockStatus::Low);
        assert_eq!(StockStatus::classify(10, 10, 100), StockStatus::Low);
        assert_eq!(StockStatus::Low.to_string(), "BAJO");
    }

    #[test]
    fn test_normal_and_excess() {
        assert_eq!(StockStatus::classify(100, 10, 100), StockStatus::Normal);
        assert_eq!(StockStatus::classify(101, 10, 100), StockStatus::Excess);
    }

    #[test]
    fn test_needs_restock() {
        assert!(StockStatus::Critical.needs_restock());
        assert!(StockStatus::Low.needs_restock());
        assert!(!StockStatus::Normal.needs_restock());
        assert!(!StockStatus::Excess.needs_restock());
    }
}
