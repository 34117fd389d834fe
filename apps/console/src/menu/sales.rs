//! # Sales Menu
//!
//! ## Register Flow
//! ```text
//! current plans ──► product → discount map (shown, never applied)
//!      │
//!      ▼
//! customer id, employee id ──► both must exist
//!      │
//!      ▼
//! loop until blank product id:
//!   product exists? stock > 0?
//!   quantity ≤ stock − units already on this sale?
//!   unit price
//!      │
//!      ▼
//! summary + total ──► confirm ──► sales.insert ──► invoice number
//! ```

use std::collections::HashMap;
use std::io::{BufRead, Write};

use inventa_core::plan::plan_discounts;
use inventa_core::{CoreError, Percentage, Sale, ValidationError};
use inventa_db::{Database, Repository};
use tracing::info;

use super::{affected, found, invalid_option, or_dash, report, today};
use crate::console::{format_date, Console};
use crate::error::{AppError, AppResult};
use crate::table::{Column, Table};

const OPTIONS: &[(&str, &str)] = &[
    ("1", "List sales"),
    ("2", "Sale detail"),
    ("3", "Register sale"),
    ("4", "Update sale header"),
    ("5", "Delete sale"),
    ("6", "Invoice ranges"),
    ("0", "Back"),
];

pub async fn run<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
    loop {
        let choice = console.choose("SALES", OPTIONS)?;
        let result = match choice.as_str() {
            "1" => list(console, db).await,
            "2" => detail(console, db).await,
            "3" => register(console, db).await,
            "4" => update_header(console, db).await,
            "5" => delete(console, db).await,
            "6" => invoice_ranges(console, db).await,
            "0" => return Ok(()),
            _ => invalid_option(console),
        };
        report(console, result)?;
    }
}

async fn list<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
    let sales = db.sales().list_all().await?;
    console.header("SALES")?;

    let mut table = Table::new(vec![
        Column::right("INVOICE", 8),
        Column::left("DATE", 10),
        Column::left("CUSTOMER", 20),
        Column::left("EMPLOYEE", 20),
        Column::right("LINES", 5),
        Column::right("TOTAL", 14),
    ]);
    for sale in &sales {
        table.row(vec![
            sale.invoice_id.to_string(),
            format_date(sale.date),
            or_dash(sale.customer_name.as_deref()),
            or_dash(sale.employee_name.as_deref()),
            sale.details.len().to_string(),
            sale.total().to_string(),
        ]);
    }
    console.print_table(&table)
}

/// Lines of a sale. `discounts` adds the informational PROMO column.
fn lines_table(sale: &Sale, discounts: Option<&HashMap<String, Percentage>>) -> Table {
    let mut columns = vec![
        Column::left("PRODUCT", 10),
        Column::left("NAME", 17),
        Column::right("QTY", 5),
        Column::right("PRICE", 12),
        Column::right("SUBTOTAL", 14),
    ];
    if discounts.is_some() {
        columns.push(Column::right("PROMO", 6));
    }

    let mut table = Table::new(columns);
    for line in &sale.details {
        let mut cells = vec![
            line.product_id.clone(),
            or_dash(line.product_name.as_deref()),
            line.quantity.to_string(),
            line.cost().to_string(),
            line.subtotal().to_string(),
        ];
        if let Some(discounts) = discounts {
            cells.push(
                discounts
                    .get(&line.product_id)
                    .map(|pct| pct.to_string())
                    .unwrap_or_default(),
            );
        }
        table.row(cells);
    }
    table
}

async fn detail<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
    let invoice = console.read_i64("Invoice number")?;
    let sale = found(db.sales().get_by_id(&invoice).await?, "Sale", invoice)?;

    console.header(&format!("INVOICE {}", sale.invoice_id))?;
    console.line(format!("Date:      {}", format_date(sale.date)))?;
    console.line(format!(
        "Customer:  {} ({})",
        or_dash(sale.customer_name.as_deref()),
        sale.customer_person_id
    ))?;
    console.line(format!(
        "Employee:  {} ({})",
        or_dash(sale.employee_name.as_deref()),
        sale.employee_person_id
    ))?;
    console.print_table(&lines_table(&sale, None))?;
    console.line(format!("TOTAL: {}", sale.total()))
}

async fn register<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
    console.header("REGISTER SALE")?;

    let next = db.sales().next_invoice_preview().await?;
    console.line(format!("Next invoice number: {}", next))?;

    let date = console.read_date("Sale date", Some(today()))?;
    if date > today() {
        return Err(ValidationError::InFuture {
            field: "sale date".to_string(),
        }
        .into());
    }

    let plans = db.plans().current_on(date).await?;
    let discounts = plan_discounts(&plans, date);
    if !plans.is_empty() {
        console.line(format!(
            "Promotions on {} (for reference, prices are not changed):",
            format_date(date)
        ))?;
        for plan in &plans {
            console.line(format!(
                "  - {} {} until {} ({} products)",
                plan.name,
                plan.discount,
                format_date(plan.end_date),
                plan.products.len()
            ))?;
        }
    }

    let customer = console.read_required("Customer person id")?;
    if !db.people().exists(&customer).await? {
        return Err(AppError::not_found("Customer", &customer));
    }
    let employee = console.read_required("Employee person id")?;
    if !db.people().exists(&employee).await? {
        return Err(AppError::not_found("Employee", &employee));
    }

    let mut sale = Sale::new(date, customer, employee);
    loop {
        let product_id = console.read_text("Product id (blank to finish)")?;
        if product_id.is_empty() {
            break;
        }

        let Some(product) = db.products().get_by_id(&product_id).await? else {
            console.print_error(&AppError::not_found("Product", &product_id))?;
            continue;
        };
        if product.stock <= 0 {
            console.print_warning(format!("{} has no stock", product.name))?;
            continue;
        }

        let available = product.stock - sale.quantity_of(&product.id);
        console.line(format!("{}: {} available", product.name, available))?;
        let quantity = console.read_i64("Quantity")?;
        if quantity <= 0 {
            console.print_warning("Quantity must be positive")?;
            continue;
        }
        if quantity > available {
            let err: AppError = CoreError::InsufficientStock {
                product_id: product.id.clone(),
                available,
                requested: quantity,
            }
            .into();
            console.print_error(&err)?;
            continue;
        }

        let price = console.read_money("Unit price")?;
        if sale.total_with_line(quantity, price).is_none() {
            let err: AppError = ValidationError::TooLarge {
                field: "sale total".to_string(),
            }
            .into();
            console.print_error(&err)?;
            continue;
        }
        if let Some(pct) = discounts.get(&product.id) {
            console.line(format!("Promotion {} applies to {} (informational)", pct, product.name))?;
        }

        sale.add_line(product.id.clone(), quantity, price);
        if let Some(line) = sale.details.last_mut() {
            line.product_name = Some(product.name.clone());
        }
    }

    if sale.details.is_empty() {
        return Err(CoreError::EmptyDocument {
            document: "Sale".to_string(),
        }
        .into());
    }

    console.header("SALE SUMMARY")?;
    let promo_column = (!discounts.is_empty()).then_some(&discounts);
    console.print_table(&lines_table(&sale, promo_column))?;
    console.line(format!("TOTAL: {}", sale.total()))?;

    if !console.confirm("Register this sale?")? {
        return console.line("Cancelled.");
    }

    let invoice = db.sales().insert(&sale).await?;
    info!(invoice, total = %sale.total(), "Sale registered from console");
    console.print_success(format!("Sale registered with invoice number {}", invoice))
}

async fn update_header<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
    let invoice = console.read_i64("Invoice number")?;
    let mut sale = found(db.sales().get_by_id(&invoice).await?, "Sale", invoice)?;

    console.line("Leave a field blank to keep its value. Lines are not edited.")?;
    sale.date = console.read_date("Date", Some(sale.date))?;
    sale.customer_person_id = console.read_optional("Customer person id", &sale.customer_person_id)?;
    sale.employee_person_id = console.read_optional("Employee person id", &sale.employee_person_id)?;

    affected(db.sales().update(&sale).await?, "Sale", invoice)?;
    console.print_success(format!("Sale {} updated", invoice))
}

async fn delete<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
    let invoice = console.read_i64("Invoice number")?;
    let sale = found(db.sales().get_by_id(&invoice).await?, "Sale", invoice)?;

    console.print_warning("Deleting a sale does not return its units to stock.")?;
    if !console.confirm(&format!("Delete sale {} ({})?", invoice, sale.total()))? {
        return console.line("Cancelled.");
    }

    affected(db.sales().delete(&invoice).await?, "Sale", invoice)?;
    console.print_success(format!("Sale {} deleted", invoice))
}

async fn invoice_ranges<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
    let ranges = db.sales().invoice_ranges().await?;
    console.header("INVOICE RANGES")?;

    let mut table = Table::new(vec![
        Column::left("RESOLUTION", 10),
        Column::right("FROM", 8),
        Column::right("TO", 8),
        Column::right("CURRENT", 8),
        Column::right("LEFT", 6),
    ]);
    for range in &ranges {
        table.row(vec![
            format_date(range.resolution_date),
            range.start_number.to_string(),
            range.end_number.to_string(),
            range.current_number.to_string(),
            range.remaining().to_string(),
        ]);
    }
    console.print_table(&table)
}
