//! # Promotional Plans
//!
//! A plan is a named discount over a set of products during a date window.
//!
//! ## Validity
//! ```text
//!              start_date                end_date
//!                  │                         │
//!   ───────────────[═════════════════════════]───────────────►  day
//!     INACTIVO     │        VIGENTE          │     INACTIVO
//! ```
//!
//! Validity is computed on read from the dates. No status column exists.
//! Both boundary days count as valid.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::money::Percentage;

/// A promotional plan with its associated products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PromotionalPlan {
    pub id: i64,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "discount_bps"))]
    pub discount: Percentage,
    /// Loaded by a follow-up query on the link table.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub products: Vec<PlanProduct>,
}

/// A product linked to a plan, with its name for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PlanProduct {
    pub product_id: String,
    #[cfg_attr(feature = "sqlx", sqlx(default))]
    pub product_name: Option<String>,
}

impl PlanProduct {
    pub fn new(product_id: impl Into<String>) -> Self {
        PlanProduct {
            product_id: product_id.into(),
            product_name: None,
        }
    }
}

impl PromotionalPlan {
    /// True when `day` falls within `[start_date, end_date]`.
    ///
    /// ```rust
    /// use chrono::NaiveDate;
    /// use inventa_core::{Percentage, PromotionalPlan};
    ///
    /// let d = |m, day| NaiveDate::from_ymd_opt(2024, m, day).unwrap();
    /// let plan = PromotionalPlan {
    ///     id: 1, name: "Back to school".into(),
    ///     start_date: d(1, 10), end_date: d(1, 20),
    ///     discount: Percentage::from_bps(1000), products: vec![],
    /// };
    /// assert!(plan.is_current_on(d(1, 10)));
    /// assert!(plan.is_current_on(d(1, 20)));
    /// assert!(!plan.is_current_on(d(1, 21)));
    /// ```
    pub fn is_current_on(&self, day: NaiveDate) -> bool {
        self.start_date <= day && day <= self.end_date
    }

    /// [`is_current_on`](Self::is_current_on) for the local calendar day.
    pub fn is_current(&self) -> bool {
        self.is_current_on(Local::now().date_naive())
    }

    /// Status label for listings.
    pub fn status_label_on(&self, day: NaiveDate) -> &'static str {
        if self.is_current_on(day) {
            "VIGENTE"
        } else {
            "INACTIVO"
        }
    }

    pub fn includes(&self, product_id: &str) -> bool {
        self.products.iter().any(|p| p.product_id == product_id)
    }
}

/// Builds the product → discount lookup used while registering a sale.
///
/// Only plans valid on `day` contribute. When a product is in several
/// plans, the largest discount wins.
pub fn plan_discounts(plans: &[PromotionalPlan], day: NaiveDate) -> HashMap<String, Percentage> {
    let mut discounts: HashMap<String, Percentage> = HashMap::new();

    for plan in plans.iter().filter(|p| p.is_current_on(day)) {
        for product in &plan.products {
            let entry = discounts
                .entry(product.product_id.clone())
                .or_insert(plan.discount);
            if plan.discount > *entry {
                *entry = plan.discount;
            }
        }
    }

    discounts
}
