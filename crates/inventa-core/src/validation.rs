//! # Validation Module
//!
//! Input validation for every entity the console can create or edit.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Console input helpers                                        │
//! │  ├── Parse numbers, dates, amounts                                     │
//! │  └── Re-prompt nothing: a bad value aborts the action                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (called from repositories before SQL)            │
//! │  ├── Required fields, ranges, date ordering                            │
//! │  └── Returns ValidationResult, never panics                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Repository + SQLite                                          │
//! │  ├── Person existence checks                                           │
//! │  ├── PRIMARY KEY / UNIQUE constraints                                  │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Functions that compare against "today" take the day as an argument so
//! they stay pure.

use chrono::NaiveDate;

use crate::documents::{CashFlow, Purchase, Sale};
use crate::error::{ValidationError, ValidationResult};
use crate::money::{Money, Percentage};
use crate::plan::PromotionalPlan;
use crate::types::{Customer, Employee, Person, PersonTelephone, Product, Supplier, User};

/// Longest name accepted for catalog and reference records.
pub const MAX_NAME_LEN: usize = 100;

// =============================================================================
// Field Validators
// =============================================================================

/// Checks that a text field is not blank.
pub fn require(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::required(field));
    }
    Ok(())
}

/// Validates a display name (required, at most [`MAX_NAME_LEN`] chars).
///
/// ```rust
/// use inventa_core::validation::validate_name;
///
/// assert!(validate_name("name", "Colombia").is_ok());
/// assert!(validate_name("name", "  ").is_err());
/// ```
pub fn validate_name(field: &str, value: &str) -> ValidationResult<()> {
    require(field, value)?;
    if value.trim().chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }
    Ok(())
}

fn not_after(field: &str, date: NaiveDate, today: NaiveDate) -> ValidationResult<()> {
    if date > today {
        return Err(ValidationError::InFuture {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn positive(field: &str, value: i64) -> ValidationResult<()> {
    if value <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn non_negative(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a plan discount (0-100%).
pub fn validate_discount(discount: Percentage) -> ValidationResult<()> {
    if discount.bps() > Percentage::MAX_BPS {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: 100,
        });
    }
    Ok(())
}

// =============================================================================
// Catalog
// =============================================================================

/// ## Rules
/// - id and name required
/// - thresholds non-negative, min not above max
/// - stock itself may be anything (it can go negative through sales)
pub fn validate_product(product: &Product) -> ValidationResult<()> {
    require("product id", &product.id)?;
    validate_name("product name", &product.name)?;
    non_negative("minimum stock", product.stock_min)?;
    non_negative("maximum stock", product.stock_max)?;

    if product.stock_min > product.stock_max {
        return Err(ValidationError::WrongOrder {
            earlier: "minimum stock".to_string(),
            later: "maximum stock".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// People
// =============================================================================

pub fn validate_person(person: &Person) -> ValidationResult<()> {
    require("person id", &person.id)?;
    validate_name("name", &person.name)?;
    validate_name("last name", &person.last_name)?;

    let email = person.email.trim();
    if !email.is_empty() && !email.contains('@') {
        return Err(ValidationError::invalid_format("email", "must contain '@'"));
    }

    positive("document type", person.document_type_id)?;
    positive("person type", person.person_type_id)?;
    positive("city", person.city_id)?;
    Ok(())
}

/// ## Rules
/// - person id required
/// - birth date and last purchase date not in the future
pub fn validate_customer(customer: &Customer, today: NaiveDate) -> ValidationResult<()> {
    require("person id", &customer.person_id)?;
    not_after("birth date", customer.birth_date, today)?;
    if let Some(purchase) = customer.last_purchase_date {
        not_after("purchase date", purchase, today)?;
    }
    Ok(())
}

/// ## Rules
/// - person id required
/// - salary positive
/// - EPS and ARL selected
pub fn validate_employee(employee: &Employee, today: NaiveDate) -> ValidationResult<()> {
    require("person id", &employee.person_id)?;
    not_after("join date", employee.join_date, today)?;
    positive("base salary", employee.base_salary_cents)?;
    positive("eps", employee.eps_id)?;
    positive("arl", employee.arl_id)?;
    Ok(())
}

/// ## Rules
/// - person id required
/// - discount within 0-100%
/// - pay day between 1 and 31
pub fn validate_supplier(supplier: &Supplier) -> ValidationResult<()> {
    require("person id", &supplier.person_id)?;
    validate_discount(supplier.discount)?;

    if !(1..=31).contains(&supplier.pay_day) {
        return Err(ValidationError::OutOfRange {
            field: "pay day".to_string(),
            min: 1,
            max: 31,
        });
    }
    Ok(())
}

pub fn validate_user(user: &User) -> ValidationResult<()> {
    require("person id", &user.person_id)?;
    require("username", &user.username)?;
    require("password", &user.password)?;
    require("role", &user.role)?;
    Ok(())
}

pub fn validate_phone(phone: &PersonTelephone) -> ValidationResult<()> {
    require("phone number", &phone.number)?;
    require("person id", &phone.person_id)?;

    if !phone
        .number
        .trim()
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'))
    {
        return Err(ValidationError::invalid_format(
            "phone number",
            "digits, spaces, '+', '-' and parentheses only",
        ));
    }
    Ok(())
}

// =============================================================================
// Plans
// =============================================================================

/// ## Rules
/// - name required
/// - end date not before start date
/// - discount 0-100%
pub fn validate_plan(plan: &PromotionalPlan) -> ValidationResult<()> {
    validate_name("plan name", &plan.name)?;

    if plan.end_date < plan.start_date {
        return Err(ValidationError::WrongOrder {
            earlier: "start date".to_string(),
            later: "end date".to_string(),
        });
    }

    validate_discount(plan.discount)
}

// =============================================================================
// Documents
// =============================================================================

/// ## Rules
/// - customer and employee required
/// - date not after `today`
/// - at least one line
/// - every quantity positive, every cost non-negative
/// - total fits in cents
pub fn validate_sale(sale: &Sale, today: NaiveDate) -> ValidationResult<()> {
    require("customer", &sale.customer_person_id)?;
    require("employee", &sale.employee_person_id)?;
    not_after("sale date", sale.date, today)?;

    if sale.details.is_empty() {
        return Err(ValidationError::required("sale details"));
    }
    for detail in &sale.details {
        require("product id", &detail.product_id)?;
        positive("quantity", detail.quantity)?;
        non_negative("cost", detail.cost_cents)?;
    }
    fits("sale total", sale.checked_total())
}

/// Header-only check used when editing an existing sale.
pub fn validate_sale_header(sale: &Sale, today: NaiveDate) -> ValidationResult<()> {
    positive("invoice id", sale.invoice_id)?;
    require("customer", &sale.customer_person_id)?;
    require("employee", &sale.employee_person_id)?;
    not_after("sale date", sale.date, today)
}

pub fn validate_purchase(purchase: &Purchase, today: NaiveDate) -> ValidationResult<()> {
    validate_purchase_header(purchase, today)?;

    if purchase.details.is_empty() {
        return Err(ValidationError::required("purchase details"));
    }
    for detail in &purchase.details {
        require("product id", &detail.product_id)?;
        positive("quantity", detail.quantity)?;
        non_negative("cost", detail.cost_cents)?;
    }
    fits("purchase total", purchase.checked_total())
}

pub fn validate_purchase_header(purchase: &Purchase, today: NaiveDate) -> ValidationResult<()> {
    require("supplier", &purchase.supplier_person_id)?;
    require("employee", &purchase.employee_person_id)?;
    not_after("purchase date", purchase.date, today)
}

fn fits(field: &str, total: Option<Money>) -> ValidationResult<()> {
    match total {
        Some(_) => Ok(()),
        None => Err(ValidationError::TooLarge {
            field: field.to_string(),
        }),
    }
}

pub fn validate_cash_flow(movement: &CashFlow) -> ValidationResult<()> {
    positive("movement type", movement.movement_type_id)?;
    positive("amount", movement.amount_cents)?;
    require("concept", &movement.concept)?;
    require("person id", &movement.person_id)?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
