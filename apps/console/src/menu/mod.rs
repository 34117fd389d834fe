//! # Menu Tree
//!
//! Every menu is the same state machine: show options, read a choice,
//! run the action, report its outcome, show the options again.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │  Main                                                               │
//! │   ├── 1 Products            (products.rs)                           │
//! │   ├── 2 Sales               (sales.rs)                              │
//! │   ├── 3 Purchases           (purchases.rs)                          │
//! │   ├── 4 Cash flow           (cash_flow.rs)                          │
//! │   ├── 5 Promotional plans   (plans.rs)                              │
//! │   ├── 6 People & setup      (people.rs, contacts.rs, setup.rs)      │
//! │   └── 0 Exit                                                        │
//! └──────────────────────────────────────────────────────────────────────┘
//!
//!  choice ──► action ──► Ok            ──► loop
//!                   └──► Err(e)        ──► "Error: ..." ──► loop
//!                   └──► InputClosed   ──► unwind to main ──► exit
//! ```

use std::io::{BufRead, Write};

use chrono::{Local, NaiveDate};
use inventa_db::Database;
use tracing::debug;

use crate::console::Console;
use crate::error::{AppError, AppResult};
use crate::table::{Column, Table};

pub mod cash_flow;
pub mod contacts;
pub mod people;
pub mod plans;
pub mod products;
pub mod purchases;
pub mod sales;
pub mod setup;

const MAIN_OPTIONS: &[(&str, &str)] = &[
    ("1", "Products"),
    ("2", "Sales"),
    ("3", "Purchases"),
    ("4", "Cash flow"),
    ("5", "Promotional plans"),
    ("6", "People & setup"),
    ("0", "Exit"),
];

/// Runs the main menu until the user exits or input ends.
pub async fn run<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
    let result = main_loop(console, db).await;
    match result {
        Err(e) if e.is_input_closed() => {
            debug!("Input closed, leaving main menu");
            Ok(())
        }
        other => other,
    }
}

async fn main_loop<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
    loop {
        let choice = console.choose("INVENTA - MAIN MENU", MAIN_OPTIONS)?;
        let result = match choice.as_str() {
            "1" => products::run(console, db).await,
            "2" => sales::run(console, db).await,
            "3" => purchases::run(console, db).await,
            "4" => cash_flow::run(console, db).await,
            "5" => plans::run(console, db).await,
            "6" => people::run(console, db).await,
            "0" => {
                console.line("Goodbye.")?;
                return Ok(());
            }
            _ => invalid_option(console),
        };
        report(console, result)?;
    }
}

// =============================================================================
// Shared Helpers
// =============================================================================

/// Prints a failed action and keeps the loop going. Closed input is
/// passed up so every loop unwinds.
pub(crate) fn report<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    result: AppResult<()>,
) -> AppResult<()> {
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.is_input_closed() => Err(e),
        Err(e) => {
            debug!(code = ?e.code, error = %e, "Menu action failed");
            console.print_error(&e)
        }
    }
}

pub(crate) fn invalid_option<R: BufRead, W: Write>(console: &mut Console<R, W>) -> AppResult<()> {
    console.print_warning("Invalid option, try again.")
}

/// Fails with `NotFound` when a lookup came back empty.
pub(crate) fn found<T>(value: Option<T>, resource: &str, id: impl std::fmt::Display) -> AppResult<T> {
    value.ok_or_else(|| AppError::not_found(resource, id))
}

/// Reports the outcome of an update/delete that matched no row.
pub(crate) fn affected(changed: bool, resource: &str, id: impl std::fmt::Display) -> AppResult<()> {
    if changed {
        Ok(())
    } else {
        Err(AppError::not_found(resource, id))
    }
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub(crate) fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

/// Two-column `ID / NAME` table printed before asking for a reference id.
pub(crate) fn choices_table(rows: impl IntoIterator<Item = (i64, String)>) -> Table {
    let mut table = Table::new(vec![Column::right("ID", 4), Column::left("NAME", 27)]);
    for (id, name) in rows {
        table.row(vec![id.to_string(), name]);
    }
    table
}

// =============================================================================
// CRUD Screens
// =============================================================================

/// One leaf of the People & setup tree: List, Create, Update, Delete and
/// an optional fifth action.
#[allow(async_fn_in_trait)]
pub(crate) trait CrudScreen {
    const TITLE: &'static str;

    /// Label of option 5, when the screen has one.
    const EXTRA: Option<&'static str> = None;

    async fn list<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()>;

    async fn create<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()>;

    async fn update<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()>;

    async fn delete<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()>;

    async fn extra<R: BufRead, W: Write>(console: &mut Console<R, W>, _db: &Database) -> AppResult<()> {
        invalid_option(console)
    }
}

/// Runs the menu loop of a [`CrudScreen`].
pub(crate) async fn crud_menu<S: CrudScreen, R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    db: &Database,
) -> AppResult<()> {
    let mut options = vec![("1", "List"), ("2", "Create"), ("3", "Update"), ("4", "Delete")];
    if let Some(label) = S::EXTRA {
        options.push(("5", label));
    }
    options.push(("0", "Back"));

    loop {
        let choice = console.choose(S::TITLE, &options)?;
        let result = match choice.as_str() {
            "1" => S::list(console, db).await,
            "2" => S::create(console, db).await,
            "3" => S::update(console, db).await,
            "4" => S::delete(console, db).await,
            "5" if S::EXTRA.is_some() => S::extra(console, db).await,
            "0" => return Ok(()),
            _ => invalid_option(console),
        };
        report(console, result)?;
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use inventa_core::{Person, Product};
    use inventa_db::{Database, DbConfig, Repository};

    use super::today;

    /// In-memory database with a customer C1, an employee E1, a supplier S1
    /// and two products: P1 (stock 20) and P2 (stock 3).
    pub async fn seeded_db() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        for (id, name, person_type) in [("C1", "Carla", 1), ("E1", "Elena", 2), ("S1", "Sergio", 3)] {
            db.people()
                .insert(&Person {
                    id: id.to_string(),
                    name: name.to_string(),
                    last_name: "Ruiz".to_string(),
                    email: format!("{}@example.com", id.to_lowercase()),
                    document_type_id: 1,
                    person_type_id: person_type,
                    city_id: 1,
                })
                .await
                .unwrap();
        }

        for (id, name, stock) in [("P1", "Arroz", 20), ("P2", "Frijol", 3)] {
            db.products()
                .insert(&Product {
                    id: id.to_string(),
                    name: name.to_string(),
                    stock,
                    stock_min: 5,
                    stock_max: 100,
                    created_at: today(),
                    updated_at: today(),
                    barcode: None,
                })
                .await
                .unwrap();
        }

        db
    }
}

#[cfg(test)]
mod tests {
    use super::testing::seeded_db;
    use super::*;
    use crate::console::testing::{output_of, scripted};

    #[tokio::test]
    async fn test_exit_option() {
        let db = seeded_db().await;
        let mut console = scripted(&["0"]);
        run(&mut console, &db).await.unwrap();
        assert!(output_of(&console).contains("Goodbye."));
    }

    #[tokio::test]
    async fn test_end_of_input_exits_cleanly() {
        let db = seeded_db().await;
        // Enter products, then stdin ends while inside the submenu.
        let mut console = scripted(&["1"]);
        assert!(run(&mut console, &db).await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_option_shows_menu_again() {
        let db = seeded_db().await;
        let mut console = scripted(&["9", "0"]);
        run(&mut console, &db).await.unwrap();

        let out = output_of(&console);
        assert!(out.contains("Invalid option"));
        assert_eq!(out.matches("INVENTA - MAIN MENU").count(), 2);
    }
}
