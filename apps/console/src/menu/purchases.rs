//! Purchases menu. Registering a purchase restocks every product on it.

use std::io::{BufRead, Write};

use inventa_core::{CoreError, Purchase, ValidationError};
use inventa_db::{Database, Repository};
use tracing::info;

use super::{affected, found, invalid_option, or_dash, report, today};
use crate::console::{format_date, Console};
use crate::error::{AppError, AppResult};
use crate::table::{Column, Table};

const OPTIONS: &[(&str, &str)] = &[
    ("1", "List purchases"),
    ("2", "Purchase detail"),
    ("3", "Register purchase"),
    ("4", "Update purchase header"),
    ("5", "Delete purchase"),
    ("0", "Back"),
];

pub async fn run<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
    loop {
        let choice = console.choose("PURCHASES", OPTIONS)?;
        let result = match choice.as_str() {
            "1" => list(console, db).await,
            "2" => detail(console, db).await,
            "3" => register(console, db).await,
            "4" => update_header(console, db).await,
            "5" => delete(console, db).await,
            "0" => return Ok(()),
            _ => invalid_option(console),
        };
        report(console, result)?;
    }
}

async fn list<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
    let purchases = db.purchases().list_all().await?;
    console.header("PURCHASES")?;

    let mut table = Table::new(vec![
        Column::right("ID", 6),
        Column::left("DATE", 10),
        Column::left("ORDER", 12),
        Column::left("SUPPLIER", 20),
        Column::right("LINES", 5),
        Column::right("TOTAL", 14),
    ]);
    for p in &purchases {
        table.row(vec![
            p.id.to_string(),
            format_date(p.date),
            p.order_number.clone(),
            or_dash(p.supplier_name.as_deref()),
            p.details.len().to_string(),
            p.total().to_string(),
        ]);
    }
    console.print_table(&table)
}

fn lines_table(purchase: &Purchase) -> Table {
    let mut table = Table::new(vec![
        Column::left("PRODUCT", 10),
        Column::left("NAME", 17),
        Column::right("QTY", 5),
        Column::right("COST", 12),
        Column::right("SUBTOTAL", 14),
    ]);
    for line in &purchase.details {
        table.row(vec![
            line.product_id.clone(),
            or_dash(line.product_name.as_deref()),
            line.quantity.to_string(),
            line.cost().to_string(),
            line.subtotal().to_string(),
        ]);
    }
    table
}

async fn detail<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
    let id = console.read_i64("Purchase id")?;
    let purchase = found(db.purchases().get_by_id(&id).await?, "Purchase", id)?;

    console.header(&format!("PURCHASE {}", purchase.id))?;
    console.line(format!("Date:      {}", format_date(purchase.date)))?;
    console.line(format!("Order:     {}", purchase.order_number))?;
    console.line(format!(
        "Supplier:  {} ({})",
        or_dash(purchase.supplier_name.as_deref()),
        purchase.supplier_person_id
    ))?;
    console.line(format!(
        "Employee:  {} ({})",
        or_dash(purchase.employee_name.as_deref()),
        purchase.employee_person_id
    ))?;
    console.print_table(&lines_table(&purchase))?;
    console.line(format!("TOTAL: {}", purchase.total()))
}

async fn register<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
    console.header("REGISTER PURCHASE")?;

    let date = console.read_date("Purchase date", Some(today()))?;
    if date > today() {
        return Err(ValidationError::InFuture {
            field: "purchase date".to_string(),
        }
        .into());
    }
    let supplier = console.read_required("Supplier person id")?;
    if !db.people().exists(&supplier).await? {
        return Err(AppError::not_found("Supplier", &supplier));
    }
    let employee = console.read_required("Employee person id")?;
    if !db.people().exists(&employee).await? {
        return Err(AppError::not_found("Employee", &employee));
    }
    let order_number = console.read_text("Order number")?;

    let mut purchase = Purchase::new(date, supplier, employee, order_number);
    loop {
        let product_id = console.read_text("Product id (blank to finish)")?;
        if product_id.is_empty() {
            break;
        }

        let Some(product) = db.products().get_by_id(&product_id).await? else {
            console.print_error(&AppError::not_found("Product", &product_id))?;
            continue;
        };

        let quantity = console.read_i64("Quantity")?;
        if quantity <= 0 {
            console.print_warning("Quantity must be positive")?;
            continue;
        }
        let cost = console.read_money("Unit cost")?;
        if purchase.total_with_line(quantity, cost).is_none() {
            let err: AppError = ValidationError::TooLarge {
                field: "purchase total".to_string(),
            }
            .into();
            console.print_error(&err)?;
            continue;
        }

        purchase.add_line(product.id.clone(), quantity, cost);
        if let Some(line) = purchase.details.last_mut() {
            line.product_name = Some(product.name.clone());
        }
    }

    if purchase.details.is_empty() {
        return Err(CoreError::EmptyDocument {
            document: "Purchase".to_string(),
        }
        .into());
    }

    console.header("PURCHASE SUMMARY")?;
    console.print_table(&lines_table(&purchase))?;
    console.line(format!("TOTAL: {}", purchase.total()))?;

    if !console.confirm("Register this purchase?")? {
        return console.line("Cancelled.");
    }

    let id = db.purchases().insert(&purchase).await?;
    info!(id, total = %purchase.total(), "Purchase registered from console");
    console.print_success(format!("Purchase {} registered, stock updated", id))
}

async fn update_header<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
    let id = console.read_i64("Purchase id")?;
    let mut purchase = found(db.purchases().get_by_id(&id).await?, "Purchase", id)?;

    console.line("Leave a field blank to keep its value. Lines are not edited.")?;
    purchase.date = console.read_date("Date", Some(purchase.date))?;
    purchase.order_number = console.read_optional("Order number", &purchase.order_number)?;
    purchase.supplier_person_id =
        console.read_optional("Supplier person id", &purchase.supplier_person_id)?;
    purchase.employee_person_id =
        console.read_optional("Employee person id", &purchase.employee_person_id)?;

    affected(db.purchases().update(&purchase).await?, "Purchase", id)?;
    console.print_success(format!("Purchase {} updated", id))
}

async fn delete<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
    let id = console.read_i64("Purchase id")?;
    let purchase = found(db.purchases().get_by_id(&id).await?, "Purchase", id)?;

    console.print_warning("Deleting a purchase does not remove its units from stock.")?;
    if !console.confirm(&format!("Delete purchase {} ({})?", id, purchase.total()))? {
        return console.line("Cancelled.");
    }

    affected(db.purchases().delete(&id).await?, "Purchase", id)?;
    console.print_success(format!("Purchase {} deleted", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::testing::{output_of, scripted};
    use crate::menu::testing::seeded_db;

    #[tokio::test]
    async fn test_register_purchase_restocks() {
        let db = seeded_db().await;
        let mut console = scripted(&[
            "3", "", "S1", "E1", "OC-77", //
            "P2", "10", "1.20", //
            "NOPE", //
            "", "y", "0",
        ]);
        run(&mut console, &db).await.unwrap();

        let out = output_of(&console);
        assert!(out.contains("Error: Product not found: NOPE"));
        assert!(out.contains("TOTAL: $12.00"));
        assert!(out.contains("OK: Purchase 1 registered, stock updated"));

        let p2 = db.products().get_by_id(&"P2".to_string()).await.unwrap().unwrap();
        assert_eq!(p2.stock, 13);
    }

    #[tokio::test]
    async fn test_huge_quantity_is_refused_without_panicking() {
        let db = seeded_db().await;
        let mut console = scripted(&[
            "3", "", "S1", "E1", "OC-1", //
            "P2", "10000000000000000", "10", //
            "P2", "2", "5", //
            "", "y", "0",
        ]);
        run(&mut console, &db).await.unwrap();

        let out = output_of(&console);
        assert!(out.contains("Error: purchase total is too large"));
        assert!(out.contains("TOTAL: $10.00"));

        let p2 = db.products().get_by_id(&"P2".to_string()).await.unwrap().unwrap();
        assert_eq!(p2.stock, 5);
    }

    #[tokio::test]
    async fn test_future_purchase_date_aborts() {
        let db = seeded_db().await;
        let next_month = today() + chrono::Duration::days(31);
        let mut console = scripted(&["3", &format_date(next_month), "0"]);
        run(&mut console, &db).await.unwrap();

        assert!(output_of(&console).contains("Error: purchase date cannot be in the future"));
        assert!(db.purchases().list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_supplier_aborts() {
        let db = seeded_db().await;
        let mut console = scripted(&["3", "", "NOBODY", "0"]);
        run(&mut console, &db).await.unwrap();
        assert!(output_of(&console).contains("Error: Supplier not found: NOBODY"));
    }

    #[tokio::test]
    async fn test_update_order_number() {
        let db = seeded_db().await;
        let mut purchase = Purchase::new(today(), "S1", "E1", "OC-1");
        purchase.add_line("P1", 1, inventa_core::Money::from_cents(100));
        let id = db.purchases().insert(&purchase).await.unwrap();

        let mut console = scripted(&["4", &id.to_string(), "", "OC-9", "", "", "0"]);
        run(&mut console, &db).await.unwrap();

        let stored = db.purchases().get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(stored.order_number, "OC-9");
        assert_eq!(stored.details.len(), 1);
    }
}
