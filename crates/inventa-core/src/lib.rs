//! # inventa-core: Pure Domain Logic for Inventa
//!
//! This crate holds every entity and business rule of the inventory system
//! as plain data and pure functions, with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Inventa Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Console (apps/console)                       │   │
//! │  │    Main menu ──► Products / Sales / Purchases / Cash / Plans   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ inventa-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────────────┐  │   │
//! │  │   │  types   │ │documents │ │   plan   │ │ validation       │  │   │
//! │  │   │ Product  │ │  Sale    │ │ validity │ │ one Result type  │  │   │
//! │  │   │ Person   │ │ Purchase │ │ discounts│ │ for every entity │  │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────────────┘  │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐                      │   │
//! │  │   │  money   │ │  stock   │ │ invoice  │                      │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘                      │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CONSOLE • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  inventa-db (Database Layer)                    │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Catalog, people and reference entities
//! - [`documents`] - Sales, purchases and cash movements with computed totals
//! - [`plan`] - Promotional plans and their validity window
//! - [`stock`] - Stock threshold classification
//! - [`invoice`] - Invoice number range arithmetic
//! - [`money`] - Integer money and basis-point percentages
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use inventa_core::{Money, Sale};
//!
//! let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
//! let mut sale = Sale::new(day, "1001", "2002");
//! sale.add_line("P1", 2, Money::from_cents(350));
//! sale.add_line("P2", 1, Money::from_cents(1200));
//!
//! assert_eq!(sale.total().cents(), 1900);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod documents;
pub mod error;
pub mod invoice;
pub mod money;
pub mod plan;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use documents::{
    CashFlow, MovementKind, MovementType, Purchase, PurchaseDetail, Sale, SaleDetail,
};
pub use error::{CoreError, CoreResult, ValidationError, ValidationResult};
pub use invoice::InvoiceRange;
pub use money::{Money, Percentage};
pub use plan::{PlanProduct, PromotionalPlan};
pub use stock::StockStatus;
pub use types::*;
