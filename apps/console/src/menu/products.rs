//! Products menu: catalog CRUD, search and the low-stock report.

use std::io::{BufRead, Write};

use inventa_core::{Product, StockStatus};
use inventa_db::{Database, Repository};
use tracing::info;

use super::{affected, found, invalid_option, or_dash, report, today};
use crate::console::{format_date, Console};
use crate::error::{AppError, AppResult};
use crate::table::{Column, Table};

const OPTIONS: &[(&str, &str)] = &[
    ("1", "List products"),
    ("2", "Product detail"),
    ("3", "Search"),
    ("4", "New product"),
    ("5", "Update product"),
    ("6", "Delete product"),
    ("7", "Low stock report"),
    ("0", "Back"),
];

pub async fn run<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
    loop {
        let choice = console.choose("PRODUCTS", OPTIONS)?;
        let result = match choice.as_str() {
            "1" => list(console, db).await,
            "2" => detail(console, db).await,
            "3" => search(console, db).await,
            "4" => create(console, db).await,
            "5" => update(console, db).await,
            "6" => delete(console, db).await,
            "7" => low_stock(console, db).await,
            "0" => return Ok(()),
            _ => invalid_option(console),
        };
        report(console, result)?;
    }
}

fn product_table(products: &[Product]) -> Table {
    let mut table = Table::new(vec![
        Column::left("ID", 10),
        Column::left("NAME", 27),
        Column::right("STOCK", 7),
        Column::right("MIN", 5),
        Column::right("MAX", 5),
        Column::left("STATUS", 8),
    ]);
    for p in products {
        table.row(vec![
            p.id.clone(),
            p.name.clone(),
            p.stock.to_string(),
            p.stock_min.to_string(),
            p.stock_max.to_string(),
            p.stock_status().label().to_string(),
        ]);
    }
    table
}

async fn list<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
    let products = db.products().list_all().await?;
    console.header("PRODUCT LIST")?;
    console.print_table(&product_table(&products))
}

async fn detail<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
    let id = console.read_required("Product id")?;
    let product = found(db.products().get_by_id(&id).await?, "Product", &id)?;

    console.header(&format!("PRODUCT {}", product.id))?;
    console.line(format!("Name:        {}", product.name))?;
    console.line(format!("Barcode:     {}", or_dash(product.barcode.as_deref())))?;
    console.line(format!("Stock:       {}", product.stock))?;
    console.line(format!("Minimum:     {}", product.stock_min))?;
    console.line(format!("Maximum:     {}", product.stock_max))?;
    console.line(format!("Status:      {}", product.stock_status()))?;
    console.line(format!("Created:     {}", format_date(product.created_at)))?;
    console.line(format!("Updated:     {}", format_date(product.updated_at)))?;

    if let Some(alert) = product.restock_alert() {
        console.print_warning(alert)?;
    }
    Ok(())
}

async fn search<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
    let term = console.read_required("Search (id, name or barcode)")?;
    let products = db.products().search(&term).await?;
    console.print_table(&product_table(&products))
}

async fn create<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
    console.header("NEW PRODUCT")?;
    let id = console.read_required("Product id")?;
    if db.products().get_by_id(&id).await?.is_some() {
        return Err(AppError::validation(format!("Product '{}' already exists", id)));
    }

    let name = console.read_required("Name")?;
    let stock = console.read_i64("Initial stock")?;
    let stock_min = console.read_i64("Minimum stock")?;
    let stock_max = console.read_i64("Maximum stock")?;
    let barcode = console.read_text("Barcode (optional)")?;

    let product = Product {
        id,
        name,
        stock,
        stock_min,
        stock_max,
        created_at: today(),
        updated_at: today(),
        barcode: Some(barcode).filter(|b| !b.is_empty()),
    };

    let id = db.products().insert(&product).await?;
    info!(id = %id, "Product created from console");
    console.print_success(format!("Product {} created", id))
}

async fn update<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
    let id = console.read_required("Product id")?;
    let mut product = found(db.products().get_by_id(&id).await?, "Product", &id)?;

    console.line("Leave a field blank to keep its value.")?;
    product.name = console.read_optional("Name", &product.name)?;
    product.stock = console.read_optional_i64("Stock", product.stock)?;
    product.stock_min = console.read_optional_i64("Minimum stock", product.stock_min)?;
    product.stock_max = console.read_optional_i64("Maximum stock", product.stock_max)?;
    let barcode = console.read_optional("Barcode", product.barcode.as_deref().unwrap_or(""))?;
    product.barcode = Some(barcode).filter(|b| !b.is_empty());
    product.updated_at = today();

    affected(db.products().update(&product).await?, "Product", &id)?;
    console.print_success(format!("Product {} updated", id))
}

async fn delete<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
    let id = console.read_required("Product id")?;
    let product = found(db.products().get_by_id(&id).await?, "Product", &id)?;

    if !console.confirm(&format!("Delete product {} ({})?", product.id, product.name))? {
        return console.line("Cancelled.");
    }

    affected(db.products().delete(&id).await?, "Product", &id)?;
    console.print_success(format!("Product {} deleted", id))
}

async fn low_stock<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
    let products = db.products().low_stock().await?;
    console.header("LOW STOCK")?;

    let mut table = Table::new(vec![
        Column::left("ID", 10),
        Column::left("NAME", 27),
        Column::right("STOCK", 7),
        Column::right("MIN", 5),
        Column::right("NEEDED", 7),
        Column::left("STATUS", 8),
    ]);
    for p in &products {
        table.row(vec![
            p.id.clone(),
            p.name.clone(),
            p.stock.to_string(),
            p.stock_min.to_string(),
            (p.stock_min - p.stock).max(0).to_string(),
            p.stock_status().label().to_string(),
        ]);
    }
    console.print_table(&table)
}

/// Warns once at startup when any product is at or below its minimum.
pub async fn startup_alert<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    db: &Database,
) -> AppResult<()> {
    let products = db.products().low_stock().await?;
    if products.is_empty() {
        return Ok(());
    }

    let critical = products
        .iter()
        .filter(|p| p.stock_status() == StockStatus::Critical)
        .count();
    console.print_warning(format!(
        "{} product(s) need restocking, {} critical. See Products > Low stock.",
        products.len(),
        critical
    ))?;
    console.pause()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::testing::{output_of, scripted};
    use crate::menu::testing::seeded_db;

    #[tokio::test]
    async fn test_create_then_list() {
        let db = seeded_db().await;
        let mut console = scripted(&["4", "P9", "Aceite de girasol extra virgen", "12", "2", "40", "", "1", "0"]);
        run(&mut console, &db).await.unwrap();

        let out = output_of(&console);
        assert!(out.contains("OK: Product P9 created"));
        assert!(out.contains("Aceite de girasol extra ..."));

        let stored = db.products().get_by_id(&"P9".to_string()).await.unwrap().unwrap();
        assert_eq!(stored.stock, 12);
        assert!(stored.barcode.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected_before_other_fields() {
        let db = seeded_db().await;
        let mut console = scripted(&["4", "P1", "0"]);
        run(&mut console, &db).await.unwrap();
        assert!(output_of(&console).contains("Error: Product 'P1' already exists"));
    }

    #[tokio::test]
    async fn test_update_blank_keeps_values() {
        let db = seeded_db().await;
        let mut console = scripted(&["5", "P1", "", "", "8", "", "", "0"]);
        run(&mut console, &db).await.unwrap();

        let p = db.products().get_by_id(&"P1".to_string()).await.unwrap().unwrap();
        assert_eq!(p.name, "Arroz");
        assert_eq!(p.stock, 20);
        assert_eq!(p.stock_min, 8);
    }

    #[tokio::test]
    async fn test_detail_shows_restock_alert() {
        let db = seeded_db().await;
        let mut console = scripted(&["2", "P2", "0"]);
        run(&mut console, &db).await.unwrap();

        let out = output_of(&console);
        assert!(out.contains("Status:      BAJO"));
        assert!(out.contains("Warning: below minimum: 2 units needed"));
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation() {
        let db = seeded_db().await;
        let mut console = scripted(&["6", "P1", "n", "6", "P1", "y", "0"]);
        run(&mut console, &db).await.unwrap();

        assert!(output_of(&console).contains("Cancelled."));
        assert!(db.products().get_by_id(&"P1".to_string()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_low_stock_lists_only_products_needing_restock() {
        let db = seeded_db().await;
        let mut console = scripted(&["7", "0"]);
        run(&mut console, &db).await.unwrap();

        let out = output_of(&console);
        assert!(out.contains("Frijol"));
        assert!(!out.contains("Arroz"));
    }

    #[tokio::test]
    async fn test_unknown_product_detail() {
        let db = seeded_db().await;
        let mut console = scripted(&["2", "NOPE", "0"]);
        run(&mut console, &db).await.unwrap();
        assert!(output_of(&console).contains("Error: Product not found: NOPE"));
    }

    #[tokio::test]
    async fn test_startup_alert_counts_low_products() {
        let db = seeded_db().await;
        let mut console = scripted(&[""]);
        startup_alert(&mut console, &db).await.unwrap();

        let out = output_of(&console);
        assert!(out.contains("Warning: 1 product(s) need restocking, 0 critical"));
        assert!(out.contains("Press Enter to continue"));
    }

    #[tokio::test]
    async fn test_startup_alert_silent_when_stock_is_fine() {
        let db = seeded_db().await;
        db.products().update_stock("P2", 10).await.unwrap();

        let mut console = scripted(&[]);
        startup_alert(&mut console, &db).await.unwrap();
        assert!(output_of(&console).is_empty());
    }
}
