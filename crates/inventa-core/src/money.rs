//! # Money Module
//!
//! Provides the `Money` type for unit costs, line subtotals and cash
//! movements, and the `Percentage` type for plan and supplier discounts.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌                                  │
//! │                                                                         │
//! │  A sale total is SUM(cost × quantity) over every line. Summing floats  │
//! │  drifts; summing integer cents does not.                               │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    cost "12.50" ──► Money(1250) ──► stored as INTEGER cost_cents        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use inventa_core::money::{Money, Percentage};
//!
//! let cost = Money::parse("12.50").unwrap();
//! let line = cost.multiply_quantity(3);
//! assert_eq!(line.cents(), 3750);
//!
//! let discount = Percentage::from_percent_input(10.0).unwrap();
//! assert_eq!(discount.apply_to(line).cents(), 3375);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};

use crate::error::{ValidationError, ValidationResult};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in cents.
///
/// ## Where Money is Used
/// ```text
/// SaleDetail.cost_cents ──► SaleDetail::subtotal() ──► Sale::total()
/// PurchaseDetail.cost_cents ──► PurchaseDetail::subtotal() ──► Purchase::total()
/// CashFlow.amount_cents ──► CashFlowRepository::balance_on(day)
/// Employee.base_salary_cents
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// For negative amounts only the major unit should be negative:
    /// `from_major_minor(-5, 50)` is -5.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Parses a user-entered amount such as `"12"`, `"12.5"` or `"1,250.75"`.
    ///
    /// ## Rules
    /// - Digits with an optional `.` and at most two decimals
    /// - `,` is accepted as a thousands separator and ignored
    /// - Negative amounts are rejected (costs and movements are never negative)
    ///
    /// ## Example
    /// ```rust
    /// use inventa_core::money::Money;
    ///
    /// assert_eq!(Money::parse("12.5").unwrap().cents(), 1250);
    /// assert!(Money::parse("-1").is_err());
    /// assert!(Money::parse("1.999").is_err());
    /// ```
    pub fn parse(input: &str) -> ValidationResult<Self> {
        let cleaned: String = input.trim().chars().filter(|c| *c != ',').collect();
        let invalid = |reason: &str| ValidationError::invalid_format("amount", reason);

        if cleaned.is_empty() {
            return Err(ValidationError::required("amount"));
        }
        if cleaned.starts_with('-') {
            return Err(ValidationError::Negative {
                field: "amount".to_string(),
            });
        }

        let (major, minor) = match cleaned.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (cleaned.as_str(), ""),
        };

        if minor.len() > 2 {
            return Err(invalid("at most two decimals"));
        }
        if !major.chars().all(|c| c.is_ascii_digit()) || !minor.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("must be a number"));
        }

        let major: i64 = if major.is_empty() {
            0
        } else {
            major.parse().map_err(|_| invalid("amount too large"))?
        };
        let minor: i64 = match minor.len() {
            0 => 0,
            1 => minor.parse::<i64>().map_err(|_| invalid("must be a number"))? * 10,
            _ => minor.parse().map_err(|_| invalid("must be a number"))?,
        };

        major
            .checked_mul(100)
            .and_then(|c| c.checked_add(minor))
            .map(Money)
            .ok_or_else(|| invalid("amount too large"))
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is greater than zero.
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is less than zero.
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies a unit cost by a quantity, saturating at the `i64` bounds.
    ///
    /// Use [`Money::checked_multiply_quantity`] before storing a line.
    ///
    /// ```rust
    /// use inventa_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(299).multiply_quantity(3).cents(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Multiplies a unit cost by a quantity, `None` on overflow.
    ///
    /// ```rust
    /// use inventa_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(299).checked_multiply_quantity(3), Some(Money::from_cents(897)));
    /// assert_eq!(Money::from_cents(i64::MAX).checked_multiply_quantity(2), None);
    /// ```
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Adds two amounts, `None` on overflow.
    #[inline]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }
}

/// Renders as `$1,234.50`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let digits = self.major().abs().to_string();

        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }

        write!(f, "{}${}.{:02}", sign, grouped, self.minor())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Percentage
// =============================================================================

/// A percentage in basis points (1 bps = 0.01%, 10000 bps = 100%).
///
/// ## Where Percentages Are Used
/// - `PromotionalPlan.discount`: entered as 0-100 at the console, stored
///   as bps, exposed as a fraction (0.15 for 15%)
/// - `Supplier.discount`: never negative
///
/// Stored as an INTEGER column of basis points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
pub struct Percentage(u32);

impl Percentage {
    /// Upper bound for plan discounts: 100%.
    pub const MAX_BPS: u32 = 10_000;

    /// Creates a percentage from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Percentage(bps)
    }

    /// Converts a percent typed at the console (`15` or `12.5`) into bps.
    ///
    /// ## Rules
    /// - Must be between 0 and 100 inclusive
    pub fn from_percent_input(pct: f64) -> ValidationResult<Self> {
        if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
            return Err(ValidationError::OutOfRange {
                field: "discount".to_string(),
                min: 0,
                max: 100,
            });
        }
        Ok(Percentage((pct * 100.0).round() as u32))
    }

    /// Creates a percentage from a fraction (0.15 = 15%).
    pub fn from_fraction(fraction: f64) -> ValidationResult<Self> {
        Self::from_percent_input(fraction * 100.0)
    }

    /// Returns the value in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the value as a percent (15.0 for 15%).
    #[inline]
    pub fn percent(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Returns the value as a fraction (0.15 for 15%).
    #[inline]
    pub fn fraction(&self) -> f64 {
        self.0 as f64 / 10_000.0
    }

    /// Checks if the percentage is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Returns `amount` reduced by this percentage, rounded half up.
    pub fn apply_to(&self, amount: Money) -> Money {
        let off = (amount.cents() as i128 * self.0 as i128 + 5_000) / 10_000;
        Money::from_cents(amount.cents() - off as i64)
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 100 == 0 {
            write!(f, "{}%", self.0 / 100)
        } else {
            write!(f, "{:.2}%", self.percent())
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
