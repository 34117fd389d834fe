//! # Documents
//!
//! Sales, purchases and cash movements.
//!
//! ## Header / Detail Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Sale (invoice 1004)                                                    │
//! │  ├── SaleDetail  P1  × 2  @ $3.00   → $6.00                             │
//! │  ├── SaleDetail  P7  × 1  @ $12.50  → $12.50                            │
//! │  └── total() ─────────────────────────► $18.50  (never stored)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Totals are recomputed from the details on every call. There is no
//! `total` column anywhere in the schema.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::money::Money;

// =============================================================================
// Sale
// =============================================================================

/// A sale header with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    /// Invoice number allocated from the invoice ranges. Zero until saved.
    pub invoice_id: i64,
    pub date: NaiveDate,
    pub customer_person_id: String,
    pub employee_person_id: String,
    #[cfg_attr(feature = "sqlx", sqlx(default))]
    pub customer_name: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(default))]
    pub employee_name: Option<String>,
    /// Loaded by a follow-up query.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub details: Vec<SaleDetail>,
}

impl Sale {
    /// Creates an unsaved sale.
    pub fn new(
        date: NaiveDate,
        customer_person_id: impl Into<String>,
        employee_person_id: impl Into<String>,
    ) -> Self {
        Sale {
            invoice_id: 0,
            date,
            customer_person_id: customer_person_id.into(),
            employee_person_id: employee_person_id.into(),
            customer_name: None,
            employee_name: None,
            details: Vec::new(),
        }
    }

    /// Appends a line.
    pub fn add_line(&mut self, product_id: impl Into<String>, quantity: i64, cost: Money) {
        self.details.push(SaleDetail {
            id: 0,
            invoice_id: self.invoice_id,
            product_id: product_id.into(),
            product_name: None,
            quantity,
            cost_cents: cost.cents(),
        });
    }

    /// Units of `product_id` already on this sale.
    pub fn quantity_of(&self, product_id: &str) -> i64 {
        self.details
            .iter()
            .filter(|d| d.product_id == product_id)
            .map(|d| d.quantity)
            .sum()
    }

    /// Sum of `cost × quantity` over all lines.
    pub fn total(&self) -> Money {
        self.details.iter().map(SaleDetail::subtotal).sum()
    }

    /// Like [`Sale::total`], `None` when the amount does not fit in cents.
    pub fn checked_total(&self) -> Option<Money> {
        self.details
            .iter()
            .try_fold(Money::zero(), |acc, d| acc.checked_add(d.checked_subtotal()?))
    }

    /// Total the sale would have after adding one more line.
    pub fn total_with_line(&self, quantity: i64, cost: Money) -> Option<Money> {
        self.checked_total()?
            .checked_add(cost.checked_multiply_quantity(quantity)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleDetail {
    pub id: i64,
    pub invoice_id: i64,
    pub product_id: String,
    #[cfg_attr(feature = "sqlx", sqlx(default))]
    pub product_name: Option<String>,
    pub quantity: i64,
    /// Unit cost in cents.
    pub cost_cents: i64,
}

impl SaleDetail {
    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_cents(self.cost_cents)
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        self.cost().multiply_quantity(self.quantity)
    }

    pub fn checked_subtotal(&self) -> Option<Money> {
        self.cost().checked_multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Purchase
// =============================================================================

/// A purchase from a supplier with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Purchase {
    pub id: i64,
    pub supplier_person_id: String,
    pub employee_person_id: String,
    pub date: NaiveDate,
    /// Supplier's order reference.
    pub order_number: String,
    #[cfg_attr(feature = "sqlx", sqlx(default))]
    pub supplier_name: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(default))]
    pub employee_name: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub details: Vec<PurchaseDetail>,
}

impl Purchase {
    /// Creates an unsaved purchase.
    pub fn new(
        date: NaiveDate,
        supplier_person_id: impl Into<String>,
        employee_person_id: impl Into<String>,
        order_number: impl Into<String>,
    ) -> Self {
        Purchase {
            id: 0,
            supplier_person_id: supplier_person_id.into(),
            employee_person_id: employee_person_id.into(),
            date,
            order_number: order_number.into(),
            supplier_name: None,
            employee_name: None,
            details: Vec::new(),
        }
    }

    /// Appends a line stamped with the purchase date.
    pub fn add_line(&mut self, product_id: impl Into<String>, quantity: i64, cost: Money) {
        self.details.push(PurchaseDetail {
            id: 0,
            purchase_id: self.id,
            date: self.date,
            product_id: product_id.into(),
            product_name: None,
            quantity,
            cost_cents: cost.cents(),
        });
    }

    /// Sum of `cost × quantity` over all lines.
    pub fn total(&self) -> Money {
        self.details.iter().map(PurchaseDetail::subtotal).sum()
    }

    pub fn checked_total(&self) -> Option<Money> {
        self.details
            .iter()
            .try_fold(Money::zero(), |acc, d| acc.checked_add(d.checked_subtotal()?))
    }

    /// Total the purchase would have after adding one more line.
    pub fn total_with_line(&self, quantity: i64, cost: Money) -> Option<Money> {
        self.checked_total()?
            .checked_add(cost.checked_multiply_quantity(quantity)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PurchaseDetail {
    pub id: i64,
    pub purchase_id: i64,
    pub date: NaiveDate,
    pub product_id: String,
    #[cfg_attr(feature = "sqlx", sqlx(default))]
    pub product_name: Option<String>,
    pub quantity: i64,
    pub cost_cents: i64,
}

impl PurchaseDetail {
    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_cents(self.cost_cents)
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        self.cost().multiply_quantity(self.quantity)
    }

    pub fn checked_subtotal(&self) -> Option<Money> {
        self.cost().checked_multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Cash Flow
// =============================================================================

/// Direction of a cash movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum MovementKind {
    /// Money coming in.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Entrada"))]
    Inflow,
    /// Money going out.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Salida"))]
    Outflow,
}

impl MovementKind {
    pub fn label(&self) -> &'static str {
        match self {
            MovementKind::Inflow => "Entrada",
            MovementKind::Outflow => "Salida",
        }
    }

    /// Sign applied to an amount when computing a balance.
    pub fn sign(&self) -> i64 {
        match self {
            MovementKind::Inflow => 1,
            MovementKind::Outflow => -1,
        }
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Catalog of movement types (Venta, Compra, Nómina...). Seeded by migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MovementType {
    pub id: i64,
    pub name: String,
    pub kind: MovementKind,
}

/// One cash register movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CashFlow {
    pub id: i64,
    pub date: NaiveDate,
    pub movement_type_id: i64,
    pub amount_cents: i64,
    pub concept: String,
    pub person_id: String,
    #[cfg_attr(feature = "sqlx", sqlx(default))]
    pub movement_type_name: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(default))]
    pub movement_kind: Option<MovementKind>,
    #[cfg_attr(feature = "sqlx", sqlx(default))]
    pub person_name: Option<String>,
}

impl CashFlow {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }

    /// Amount with the movement's sign applied. Unknown kinds count as zero.
    pub fn signed_amount(&self) -> Money {
        let sign = self.movement_kind.map(|k| k.sign()).unwrap_or(0);
        Money::from_cents(self.amount_cents.saturating_mul(sign))
    }
}

/// Entradas minus Salidas.
pub fn balance<'a>(movements: impl IntoIterator<Item = &'a CashFlow>) -> Money {
    movements.into_iter().map(CashFlow::signed_amount).sum()
}

// =============================================================================
// Unit Tests
// =============================================================================
