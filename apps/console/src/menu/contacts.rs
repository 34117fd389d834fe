//! Phone numbers and user accounts of a person.

use std::io::{BufRead, Write};
use std::str::FromStr;

use chrono::Utc;
use inventa_core::{PersonTelephone, PhoneType, User};
use inventa_db::{Database, Repository};

use super::people::read_person_id;
use super::{affected, found, CrudScreen};
use crate::console::Console;
use crate::error::{AppError, AppResult};
use crate::table::{Column, Table};

fn read_phone_type<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    current: Option<PhoneType>,
) -> AppResult<PhoneType> {
    console.line("  1. Fijo")?;
    console.line("  2. Movil")?;
    let value = match current {
        Some(t) => console.read_optional("Phone type", t.label())?,
        None => console.read_required("Phone type")?,
    };
    Ok(PhoneType::from_str(&value)?)
}

// =============================================================================
// Phones
// =============================================================================

pub(crate) struct Phones;

fn phone_table(phones: &[PersonTelephone]) -> Table {
    let mut table = Table::new(vec![
        Column::right("ID", 5),
        Column::left("NUMBER", 18),
        Column::left("TYPE", 6),
        Column::left("PERSON", 12),
    ]);
    for phone in phones {
        table.row(vec![
            phone.id.to_string(),
            phone.number.clone(),
            phone.phone_type.to_string(),
            phone.person_id.clone(),
        ]);
    }
    table
}

impl CrudScreen for Phones {
    const TITLE: &'static str = "PHONE NUMBERS";
    const EXTRA: Option<&'static str> = Some("List by person");

    async fn list<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
        let phones = db.phones().list_all().await?;
        console.print_table(&phone_table(&phones))
    }

    async fn create<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
        let person_id = read_person_id(console, db, "Person id").await?;
        let number = console.read_required("Number")?;
        let phone_type = read_phone_type(console, None)?;

        let phone = PersonTelephone {
            id: 0,
            number,
            person_id,
            phone_type,
        };
        let id = db.phones().insert(&phone).await?;
        console.print_success(format!("Phone {} added", id))
    }

    async fn update<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
        let id = console.read_i64("Phone id")?;
        let mut phone = found(db.phones().get_by_id(&id).await?, "Phone", id)?;

        console.line("Leave a field blank to keep its value.")?;
        phone.number = console.read_optional("Number", &phone.number)?;
        phone.phone_type = read_phone_type(console, Some(phone.phone_type))?;

        affected(db.phones().update(&phone).await?, "Phone", id)?;
        console.print_success(format!("Phone {} updated", id))
    }

    async fn delete<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
        let id = console.read_i64("Phone id")?;
        let phone = found(db.phones().get_by_id(&id).await?, "Phone", id)?;

        if !console.confirm(&format!("Delete phone {}?", phone.number))? {
            return console.line("Cancelled.");
        }
        affected(db.phones().delete(&id).await?, "Phone", id)?;
        console.print_success(format!("Phone {} deleted", id))
    }

    async fn extra<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
        let person_id = read_person_id(console, db, "Person id").await?;
        let phones = db.phones().list_by_person(&person_id).await?;
        console.print_table(&phone_table(&phones))
    }
}

// =============================================================================
// Users
// =============================================================================

pub(crate) struct Users;

impl CrudScreen for Users {
    const TITLE: &'static str = "USERS";
    const EXTRA: Option<&'static str> = Some("Activate/deactivate");

    /// Inactive accounts are listed only when `show_deleted` is on.
    async fn list<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
        let show_inactive = console.show_deleted();
        let users = db.users().list_all().await?;

        let mut table = Table::new(vec![
            Column::right("ID", 4),
            Column::left("USERNAME", 16),
            Column::left("ROLE", 12),
            Column::left("PERSON", 12),
            Column::left("LAST ACCESS", 16),
            Column::left("ACTIVE", 6),
        ]);
        for user in users.iter().filter(|u| u.is_active || show_inactive) {
            table.row(vec![
                user.id.to_string(),
                user.username.clone(),
                user.role.clone(),
                user.person_id.clone(),
                user.last_access
                    .map(|t| t.format("%d/%m/%Y %H:%M").to_string())
                    .unwrap_or_else(|| "never".to_string()),
                if user.is_active { "yes" } else { "no" }.to_string(),
            ]);
        }
        console.print_table(&table)
    }

    async fn create<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
        let person_id = read_person_id(console, db, "Person id").await?;
        let username = console.read_required("Username")?;
        if db.users().get_by_username(&username).await?.is_some() {
            return Err(AppError::validation(format!(
                "Username '{}' is already taken",
                username
            )));
        }
        let password = console.read_required("Password")?;
        let role = console.read_required("Role")?;

        let user = User {
            id: 0,
            person_id,
            username,
            password,
            role,
            created_at: Utc::now(),
            last_access: None,
            is_active: true,
        };
        let id = db.users().insert(&user).await?;
        console.print_success(format!("User {} created", id))
    }

    async fn update<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
        let id = console.read_i64("User id")?;
        let mut user = found(db.users().get_by_id(&id).await?, "User", id)?;

        console.line("Leave a field blank to keep its value.")?;
        let password = console.read_text("New password")?;
        if !password.is_empty() {
            user.password = password;
        }
        user.role = console.read_optional("Role", &user.role)?;

        affected(db.users().update(&user).await?, "User", id)?;
        console.print_success(format!("User {} updated", id))
    }

    async fn delete<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
        let id = console.read_i64("User id")?;
        let user = found(db.users().get_by_id(&id).await?, "User", id)?;

        if !console.confirm(&format!("Delete user {}?", user.username))? {
            return console.line("Cancelled.");
        }
        affected(db.users().delete(&id).await?, "User", id)?;
        console.print_success(format!("User {} deleted", id))
    }

    async fn extra<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
        let id = console.read_i64("User id")?;
        let user = found(db.users().get_by_id(&id).await?, "User", id)?;

        let active = !user.is_active;
        affected(db.users().set_active(id, active).await?, "User", id)?;
        let state = if active { "activated" } else { "deactivated" };
        console.print_success(format!("User {} {}", user.username, state))
    }
}
