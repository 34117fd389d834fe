//! Cash flow menu: register movements and read day balances.

use std::io::{BufRead, Write};

use inventa_core::{CashFlow, MovementType};
use inventa_db::{Database, Repository};

use super::{affected, found, invalid_option, or_dash, report, today};
use crate::console::{format_date, Console};
use crate::error::{AppError, AppResult};
use crate::table::{Column, Table};

const OPTIONS: &[(&str, &str)] = &[
    ("1", "List movements"),
    ("2", "Movement detail"),
    ("3", "Register movement"),
    ("4", "Movements of a day"),
    ("5", "Day balance"),
    ("6", "Update movement"),
    ("7", "Delete movement"),
    ("0", "Back"),
];

pub async fn run<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
    loop {
        let choice = console.choose("CASH FLOW", OPTIONS)?;
        let result = match choice.as_str() {
            "1" => list(console, db).await,
            "2" => detail(console, db).await,
            "3" => register(console, db).await,
            "4" => day_movements(console, db).await,
            "5" => day_balance(console, db).await,
            "6" => update(console, db).await,
            "7" => delete(console, db).await,
            "0" => return Ok(()),
            _ => invalid_option(console),
        };
        report(console, result)?;
    }
}

fn movement_table(movements: &[CashFlow]) -> Table {
    let mut table = Table::new(vec![
        Column::right("ID", 5),
        Column::left("DATE", 10),
        Column::left("TYPE", 17),
        Column::left("KIND", 7),
        Column::right("AMOUNT", 14),
        Column::left("CONCEPT", 27),
        Column::left("PERSON", 17),
    ]);
    for m in movements {
        table.row(vec![
            m.id.to_string(),
            format_date(m.date),
            or_dash(m.movement_type_name.as_deref()),
            m.movement_kind.map(|k| k.label().to_string()).unwrap_or_default(),
            m.amount().to_string(),
            m.concept.clone(),
            or_dash(m.person_name.as_deref()),
        ]);
    }
    table
}

async fn list<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
    let movements = db.cash_flows().list_all().await?;
    console.header("CASH MOVEMENTS")?;
    console.print_table(&movement_table(&movements))
}

async fn detail<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
    let id = console.read_i64("Movement id")?;
    let m = found(db.cash_flows().get_by_id(&id).await?, "Movement", id)?;

    console.header(&format!("MOVEMENT {}", m.id))?;
    console.line(format!("Date:     {}", format_date(m.date)))?;
    console.line(format!(
        "Type:     {} ({})",
        or_dash(m.movement_type_name.as_deref()),
        m.movement_kind.map(|k| k.label()).unwrap_or("-")
    ))?;
    console.line(format!("Amount:   {}", m.amount()))?;
    console.line(format!("Concept:  {}", m.concept))?;
    console.line(format!("Person:   {} ({})", or_dash(m.person_name.as_deref()), m.person_id))
}

/// Prints the movement type catalog and reads a choice from it.
async fn read_movement_type<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    db: &Database,
    current: Option<i64>,
) -> AppResult<MovementType> {
    let types = db.cash_flows().movement_types().await?;

    let mut table = Table::new(vec![
        Column::right("ID", 4),
        Column::left("TYPE", 20),
        Column::left("KIND", 8),
    ]);
    for t in &types {
        table.row(vec![t.id.to_string(), t.name.clone(), t.kind.label().to_string()]);
    }
    console.print_table(&table)?;

    let id = match current {
        Some(id) => console.read_optional_i64("Movement type", id)?,
        None => console.read_i64("Movement type")?,
    };
    types
        .into_iter()
        .find(|t| t.id == id)
        .ok_or_else(|| AppError::not_found("Movement type", id))
}

async fn register<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
    console.header("REGISTER MOVEMENT")?;

    let movement_type = read_movement_type(console, db, None).await?;
    let date = console.read_date("Date", Some(today()))?;
    let amount = console.read_money("Amount")?;
    let concept = console.read_required("Concept")?;
    let person_id = console.read_required("Person id")?;

    let movement = CashFlow {
        id: 0,
        date,
        movement_type_id: movement_type.id,
        amount_cents: amount.cents(),
        concept,
        person_id,
        movement_type_name: None,
        movement_kind: None,
        person_name: None,
    };

    let id = db.cash_flows().insert(&movement).await?;
    console.print_success(format!(
        "Movement {} registered: {} {}",
        id,
        movement_type.kind.label(),
        amount
    ))
}

async fn day_movements<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
    let date = console.read_date("Day", Some(today()))?;
    let movements = db.cash_flows().list_on(date).await?;

    console.header(&format!("MOVEMENTS OF {}", format_date(date)))?;
    console.print_table(&movement_table(&movements))
}

async fn day_balance<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
    let date = console.read_date("Day", Some(today()))?;
    let balance = db.cash_flows().balance_on(date).await?;
    console.line(format!("Balance of {}: {}", format_date(date), balance))
}

async fn update<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
    let id = console.read_i64("Movement id")?;
    let mut movement = found(db.cash_flows().get_by_id(&id).await?, "Movement", id)?;

    console.line("Leave a field blank to keep its value.")?;
    movement.movement_type_id = read_movement_type(console, db, Some(movement.movement_type_id))
        .await?
        .id;
    movement.date = console.read_date("Date", Some(movement.date))?;
    movement.amount_cents = console.read_optional_money("Amount", movement.amount())?.cents();
    movement.concept = console.read_optional("Concept", &movement.concept)?;
    movement.person_id = console.read_optional("Person id", &movement.person_id)?;

    affected(db.cash_flows().update(&movement).await?, "Movement", id)?;
    console.print_success(format!("Movement {} updated", id))
}

async fn delete<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
    let id = console.read_i64("Movement id")?;
    let movement = found(db.cash_flows().get_by_id(&id).await?, "Movement", id)?;

    if !console.confirm(&format!("Delete movement {} ({})?", id, movement.amount()))? {
        return console.line("Cancelled.");
    }

    affected(db.cash_flows().delete(&id).await?, "Movement", id)?;
    console.print_success(format!("Movement {} deleted", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::testing::{output_of, scripted};
    use crate::menu::testing::seeded_db;

    #[tokio::test]
    async fn test_register_and_balance() {
        let db = seeded_db().await;
        let mut console = scripted(&[
            "3", "1", "01/05/2024", "500", "Venta mostrador", "E1", //
            "3", "4", "01/05/2024", "120.50", "Compra bolsas", "E1", //
            "5", "01/05/2024", //
            "0",
        ]);
        run(&mut console, &db).await.unwrap();

        let out = output_of(&console);
        assert!(out.contains("OK: Movement 1 registered: Entrada $500.00"));
        assert!(out.contains("OK: Movement 2 registered: Salida $120.50"));
        assert!(out.contains("Balance of 01/05/2024: $379.50"));
    }

    #[tokio::test]
    async fn test_unknown_movement_type() {
        let db = seeded_db().await;
        let mut console = scripted(&["3", "99", "0"]);
        run(&mut console, &db).await.unwrap();
        assert!(output_of(&console).contains("Error: Movement type not found: 99"));
    }

    #[tokio::test]
    async fn test_unknown_person_rejected() {
        let db = seeded_db().await;
        let mut console = scripted(&["3", "1", "", "10", "x", "GHOST", "0"]);
        run(&mut console, &db).await.unwrap();
        assert!(output_of(&console).contains("Error: Person not found: GHOST"));
    }
}
