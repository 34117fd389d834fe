//! # Domain Types
//!
//! Catalog, people and reference-data entities.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │     Person      │   │    Location     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (business)  │   │  id (document)  │   │  Country        │       │
//! │  │  stock          │   │  name/last_name │   │   └─ Region     │       │
//! │  │  stock_min/max  │   │  city_id ───────┼──►│       └─ City   │       │
//! │  └─────────────────┘   └────────┬────────┘   └─────────────────┘       │
//! │                                 │ person_id                             │
//! │        ┌────────────┬───────────┼───────────┬─────────────┐            │
//! │        ▼            ▼           ▼           ▼             ▼            │
//! │   Customer     Employee     Supplier   PersonTelephone   User          │
//! │                (Eps, Arl)                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Customer, Employee and Supplier are separate tables keyed by person id,
//! not subtypes of Person. Their `person_name` field is a display value
//! filled by a join when listing.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::money::{Money, Percentage};
use crate::stock::StockStatus;

// =============================================================================
// Product
// =============================================================================

/// A stocked product.
///
/// Stock thresholds are informative only. Nothing keeps `stock` inside
/// `[stock_min, stock_max]`; a sale may even drive it negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Business identifier typed by the operator.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Units on hand.
    pub stock: i64,

    /// Restock threshold.
    pub stock_min: i64,

    /// Overstock threshold.
    pub stock_max: i64,

    /// Day the product was registered.
    pub created_at: NaiveDate,

    /// Day the product was last modified.
    pub updated_at: NaiveDate,

    /// Barcode (EAN-13, UPC-A, etc.).
    pub barcode: Option<String>,
}

impl Product {
    /// Classifies current stock against the thresholds.
    pub fn stock_status(&self) -> StockStatus {
        StockStatus::classify(self.stock, self.stock_min, self.stock_max)
    }

    /// Returns the warning shown on the product detail screen, if any.
    ///
    /// ```rust
    /// # use chrono::NaiveDate;
    /// # use inventa_core::Product;
    /// # let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    /// let p = Product {
    ///     id: "P1".into(), name: "Rice".into(),
    ///     stock: 4, stock_min: 10, stock_max: 50,
    ///     created_at: day, updated_at: day, barcode: None,
    /// };
    /// assert_eq!(p.restock_alert().as_deref(), Some("below minimum: 6 units needed"));
    /// ```
    pub fn restock_alert(&self) -> Option<String> {
        if self.stock < self.stock_min {
            Some(format!(
                "below minimum: {} units needed",
                self.stock_min - self.stock
            ))
        } else if self.stock > self.stock_max {
            Some(format!(
                "above maximum: {} excess units",
                self.stock - self.stock_max
            ))
        } else {
            None
        }
    }
}

// =============================================================================
// Reference Data
// =============================================================================

/// Identity document kind (CC, NIT, CE...). Seeded by migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct DocumentType {
    pub id: i64,
    pub name: String,
}

/// Role a person plays (Cliente, Empleado, Proveedor). Seeded by migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PersonType {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Country {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Region {
    pub id: i64,
    pub name: String,
    pub country_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct City {
    pub id: i64,
    pub name: String,
    pub region_id: i64,
}

/// Health provider (Entidad Promotora de Salud).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Eps {
    pub id: i64,
    pub name: String,
}

/// Occupational risk insurer (Administradora de Riesgos Laborales).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Arl {
    pub id: i64,
    pub name: String,
}

// =============================================================================
// People
// =============================================================================

/// Base record for anyone the business deals with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Person {
    /// Document number, used as the key.
    pub id: String,
    pub name: String,
    pub last_name: String,
    pub email: String,
    pub document_type_id: i64,
    pub person_type_id: i64,
    pub city_id: i64,
}

impl Person {
    /// `"name last_name"`.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.last_name).trim().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: i64,
    pub person_id: String,
    pub birth_date: NaiveDate,
    /// Updated by every registered sale for this customer.
    pub last_purchase_date: Option<NaiveDate>,
    #[cfg_attr(feature = "sqlx", sqlx(default))]
    pub person_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Employee {
    pub id: i64,
    pub person_id: String,
    pub join_date: NaiveDate,
    pub base_salary_cents: i64,
    pub eps_id: i64,
    pub arl_id: i64,
    #[cfg_attr(feature = "sqlx", sqlx(default))]
    pub person_name: Option<String>,
}

impl Employee {
    /// Returns the base salary as Money.
    #[inline]
    pub fn base_salary(&self) -> Money {
        Money::from_cents(self.base_salary_cents)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Supplier {
    pub id: i64,
    pub person_id: String,
    /// Negotiated discount.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "discount_bps"))]
    pub discount: Percentage,
    /// Day of month the supplier is paid (1-31).
    pub pay_day: i64,
    #[cfg_attr(feature = "sqlx", sqlx(default))]
    pub person_name: Option<String>,
}

/// Kind of telephone line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum PhoneType {
    /// Fixed line.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Fijo"))]
    Landline,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Movil"))]
    Mobile,
}

impl PhoneType {
    /// Label stored in the database and shown in listings.
    pub fn label(&self) -> &'static str {
        match self {
            PhoneType::Landline => "Fijo",
            PhoneType::Mobile => "Movil",
        }
    }
}

impl fmt::Display for PhoneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Parses a menu option (`1`, `2`) or a label (`Fijo`, `Móvil`, `mobile`...).
impl FromStr for PhoneType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" | "fijo" | "landline" => Ok(PhoneType::Landline),
            "2" | "movil" | "móvil" | "mobile" => Ok(PhoneType::Mobile),
            _ => Err(ValidationError::NotAllowed {
                field: "phone type".to_string(),
                allowed: vec!["1 (Fijo)".to_string(), "2 (Movil)".to_string()],
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PersonTelephone {
    pub id: i64,
    pub number: String,
    pub person_id: String,
    pub phone_type: PhoneType,
}

/// Application login bound to a person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub person_id: String,
    pub username: String,
    pub password: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub last_access: Option<DateTime<Utc>>,
    pub is_active: bool,
}

// =============================================================================
// Unit Tests
// =============================================================================
