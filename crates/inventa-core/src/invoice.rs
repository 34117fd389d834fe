//! # Invoice Ranges
//!
//! Invoice numbers are handed out from pre-allocated, contiguous ranges.
//!
//! ## Allocation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ranges table                                                           │
//! │                                                                         │
//! │   id  start  end   current                                              │
//! │   1   1000   1999  1999     ◄── exhausted (current == end)              │
//! │   2   2000   2999  2041     ◄── open: next number is 2042               │
//! │                                                                         │
//! │  No open range?                                                         │
//! │   └── following(Some(2999)) → (3000, 3999), first number issued: 3000   │
//! │  No ranges at all?                                                      │
//! │   └── following(None)       → (1000, 1999), first number issued: 1000   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A freshly created range starts with `current == start`, so its first
//! number is `start` itself. Numbers are strictly increasing and never reused.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Width of every range.
pub const INVOICE_RANGE_SIZE: i64 = 1000;

/// First invoice number of an empty database.
pub const FIRST_INVOICE_NUMBER: i64 = 1000;

/// A block of invoice numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InvoiceRange {
    pub id: i64,
    /// Day the numbering resolution was issued.
    pub resolution_date: NaiveDate,
    pub start_number: i64,
    pub end_number: i64,
    /// Last number handed out.
    pub current_number: i64,
}

impl InvoiceRange {
    /// Next number this range can issue, or `None` when exhausted.
    pub fn next_number(&self) -> Option<i64> {
        if self.current_number < self.end_number {
            Some(self.current_number + 1)
        } else {
            None
        }
    }

    /// Numbers still available.
    pub fn remaining(&self) -> i64 {
        (self.end_number - self.current_number).max(0)
    }

    /// Bounds of the range following one that ended at `last_end`.
    pub fn following(last_end: Option<i64>) -> (i64, i64) {
        let start = last_end.map(|end| end + 1).unwrap_or(FIRST_INVOICE_NUMBER);
        (start, start + INVOICE_RANGE_SIZE - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: i64, end: i64, current: i64) -> InvoiceRange {
        InvoiceRange {
            id: 1,
            resolution_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            start_number: start,
            end_number: end,
            current_number: current,
        }
    }

    #[test]
    fn test_next_number() {
        assert_eq!(range(1000, 1999, 1000).next_number(), Some(1001));
        assert_eq!(range(1000, 1999, 1998).next_number(), Some(1999));
        assert_eq!(range(1000, 1999, 1999).next_number(), None);
    }

    #[test]
    fn test_following_first_range() {
        assert_eq!(InvoiceRange::following(None), (1000, 1999));
    }

    #[test]
    fn test_following_is_contiguous() {
        assert_eq!(InvoiceRange::following(Some(1999)), (2000, 2999));
        let (start, end) = InvoiceRange::following(Some(2999));
        assert_eq!(end - start + 1, INVOICE_RANGE_SIZE);
        assert_eq!(start, 3000);
    }

    #[test]
    fn test_remaining() {
        assert_eq!(range(1000, 1999, 1000).remaining(), 999);
        assert_eq!(range(1000, 1999, 1999).remaining(), 0);
    }
}
