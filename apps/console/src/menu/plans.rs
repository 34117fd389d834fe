//! Promotional plans menu.

use std::io::{BufRead, Write};

use inventa_core::{PlanProduct, PromotionalPlan};
use inventa_db::{Database, Repository};

use super::{affected, found, invalid_option, or_dash, report, today};
use crate::console::{format_date, Console};
use crate::error::{AppError, AppResult};
use crate::table::{Column, Table};

const OPTIONS: &[(&str, &str)] = &[
    ("1", "List plans"),
    ("2", "Plan detail"),
    ("3", "Create plan"),
    ("4", "Update plan"),
    ("5", "Delete plan"),
    ("6", "Current plans"),
    ("0", "Back"),
];

pub async fn run<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
    loop {
        let choice = console.choose("PROMOTIONAL PLANS", OPTIONS)?;
        let result = match choice.as_str() {
            "1" => list(console, db).await,
            "2" => detail(console, db).await,
            "3" => create(console, db).await,
            "4" => update(console, db).await,
            "5" => delete(console, db).await,
            "6" => current(console, db).await,
            "0" => return Ok(()),
            _ => invalid_option(console),
        };
        report(console, result)?;
    }
}

fn plan_table(plans: &[PromotionalPlan]) -> Table {
    let day = today();
    let mut table = Table::new(vec![
        Column::right("ID", 4),
        Column::left("NAME", 27),
        Column::left("FROM", 10),
        Column::left("TO", 10),
        Column::right("DISC.", 7),
        Column::right("PRODUCTS", 8),
        Column::left("STATUS", 8),
    ]);
    for plan in plans {
        table.row(vec![
            plan.id.to_string(),
            plan.name.clone(),
            format_date(plan.start_date),
            format_date(plan.end_date),
            plan.discount.to_string(),
            plan.products.len().to_string(),
            plan.status_label_on(day).to_string(),
        ]);
    }
    table
}

async fn list<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
    let plans = db.plans().list_all().await?;
    console.header("PROMOTIONAL PLANS")?;
    console.print_table(&plan_table(&plans))
}

async fn current<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
    let plans = db.plans().current().await?;
    console.header(&format!("PLANS VALID ON {}", format_date(today())))?;
    console.print_table(&plan_table(&plans))
}

async fn detail<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
    let id = console.read_i64("Plan id")?;
    let plan = found(db.plans().get_by_id(&id).await?, "Plan", id)?;

    console.header(&format!("PLAN {}", plan.id))?;
    console.line(format!("Name:      {}", plan.name))?;
    console.line(format!(
        "Valid:     {} - {}",
        format_date(plan.start_date),
        format_date(plan.end_date)
    ))?;
    console.line(format!("Discount:  {}", plan.discount))?;
    console.line(format!("Status:    {}", plan.status_label_on(today())))?;

    let mut table = Table::new(vec![Column::left("PRODUCT", 10), Column::left("NAME", 27)]);
    for product in &plan.products {
        table.row(vec![
            product.product_id.clone(),
            or_dash(product.product_name.as_deref()),
        ]);
    }
    console.print_table(&table)
}

/// Reads product ids until a blank line. Unknown and repeated ids are skipped.
async fn read_products<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    db: &Database,
) -> AppResult<Vec<PlanProduct>> {
    let mut products: Vec<PlanProduct> = Vec::new();
    loop {
        let id = console.read_text("Product id (blank to finish)")?;
        if id.is_empty() {
            return Ok(products);
        }
        if products.iter().any(|p| p.product_id == id) {
            console.print_warning(format!("{} is already in the plan", id))?;
            continue;
        }

        match db.products().get_by_id(&id).await? {
            Some(product) => {
                let mut entry = PlanProduct::new(product.id);
                entry.product_name = Some(product.name);
                products.push(entry);
            }
            None => console.print_error(&AppError::not_found("Product", &id))?,
        }
    }
}

async fn create<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
    console.header("NEW PLAN")?;

    let name = console.read_required("Name")?;
    let start_date = console.read_date("Start date", Some(today()))?;
    let end_date = console.read_date("End date", None)?;
    let discount = console.read_percent("Discount", None)?;
    let products = read_products(console, db).await?;

    let plan = PromotionalPlan {
        id: 0,
        name,
        start_date,
        end_date,
        discount,
        products,
    };

    let id = db.plans().insert(&plan).await?;
    console.print_success(format!(
        "Plan {} created with {} product(s)",
        id,
        plan.products.len()
    ))
}

async fn update<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
    let id = console.read_i64("Plan id")?;
    let mut plan = found(db.plans().get_by_id(&id).await?, "Plan", id)?;

    console.line("Leave a field blank to keep its value.")?;
    plan.name = console.read_optional("Name", &plan.name)?;
    plan.start_date = console.read_date("Start date", Some(plan.start_date))?;
    plan.end_date = console.read_date("End date", Some(plan.end_date))?;
    plan.discount = console.read_percent("Discount", Some(plan.discount))?;

    if console.confirm("Replace the product list?")? {
        plan.products = read_products(console, db).await?;
    }

    affected(db.plans().update(&plan).await?, "Plan", id)?;
    console.print_success(format!("Plan {} updated", id))
}

async fn delete<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
    let id = console.read_i64("Plan id")?;
    let plan = found(db.plans().get_by_id(&id).await?, "Plan", id)?;

    if !console.confirm(&format!("Delete plan {} ({})?", id, plan.name))? {
        return console.line("Cancelled.");
    }

    affected(db.plans().delete(&id).await?, "Plan", id)?;
    console.print_success(format!("Plan {} deleted", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::testing::{output_of, scripted};
    use crate::menu::testing::seeded_db;

    #[tokio::test]
    async fn test_create_plan_skips_unknown_and_repeated_products() {
        let db = seeded_db().await;
        let mut console = scripted(&[
            "3", "Temporada", "01/01/2024", "31/01/2024", "12.5", //
            "P1", "P1", "XX", "P2", "", //
            "1", "0",
        ]);
        run(&mut console, &db).await.unwrap();

        let out = output_of(&console);
        assert!(out.contains("Warning: P1 is already in the plan"));
        assert!(out.contains("Error: Product not found: XX"));
        assert!(out.contains("OK: Plan 1 created with 2 product(s)"));
        assert!(out.contains("INACTIVO"));

        let plan = db.plans().get_by_id(&1).await.unwrap().unwrap();
        assert_eq!(plan.discount.bps(), 1250);
        assert_eq!(plan.products.len(), 2);
    }

    #[tokio::test]
    async fn test_inverted_dates_rejected() {
        let db = seeded_db().await;
        let mut console = scripted(&["3", "Mal", "10/02/2024", "01/02/2024", "10", "", "0"]);
        run(&mut console, &db).await.unwrap();

        assert!(output_of(&console).contains("Error: end date must not be before start date"));
        assert!(db.plans().list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_current_plan_listed_as_vigente() {
        let db = seeded_db().await;
        let mut console = scripted(&["3", "Hoy", "", "31/12/2099", "5", "P1", "", "6", "0"]);
        run(&mut console, &db).await.unwrap();

        let out = output_of(&console);
        assert!(out.contains("PLANS VALID ON"));
        assert!(out.contains("VIGENTE"));
    }

    #[tokio::test]
    async fn test_update_keeps_products_unless_replaced() {
        let db = seeded_db().await;
        let mut console = scripted(&[
            "3", "Mayo", "01/05/2024", "31/05/2024", "10", "P1", "P2", "", //
            "4", "1", "", "", "", "20", "n", //
            "0",
        ]);
        run(&mut console, &db).await.unwrap();

        let plan = db.plans().get_by_id(&1).await.unwrap().unwrap();
        assert_eq!(plan.discount.bps(), 2000);
        assert_eq!(plan.products.len(), 2);
    }
}
