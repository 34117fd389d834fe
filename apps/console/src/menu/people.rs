//! # People & Setup
//!
//! Persons and the roles built on them. A customer, employee or supplier
//! row always points at an existing person.
//!
//! ```text
//! Person "C1" ──┬── Customer  (birth date, last purchase)
//!               ├── Employee  (salary, EPS, ARL)
//!               ├── Supplier  (discount, pay day)
//!               ├── Phones    (contacts.rs)
//!               └── Users     (contacts.rs)
//! ```

use std::io::{BufRead, Write};

use inventa_core::{Customer, Employee, Person, Supplier};
use inventa_db::{Database, Repository};

use super::contacts::{Phones, Users};
use super::setup::{locations_menu, social_security_menu};
use super::{
    affected, choices_table, crud_menu, found, invalid_option, or_dash, report, today, CrudScreen,
};
use crate::console::{format_date, Console};
use crate::error::{AppError, AppResult};
use crate::table::{Column, Table};

const OPTIONS: &[(&str, &str)] = &[
    ("1", "Persons"),
    ("2", "Customers"),
    ("3", "Employees"),
    ("4", "Suppliers"),
    ("5", "Phone numbers"),
    ("6", "Users"),
    ("7", "Locations"),
    ("8", "Social security"),
    ("0", "Back"),
];

pub async fn run<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
    loop {
        let choice = console.choose("PEOPLE & SETUP", OPTIONS)?;
        let result = match choice.as_str() {
            "1" => crud_menu::<Persons, _, _>(console, db).await,
            "2" => crud_menu::<Customers, _, _>(console, db).await,
            "3" => crud_menu::<Employees, _, _>(console, db).await,
            "4" => crud_menu::<Suppliers, _, _>(console, db).await,
            "5" => crud_menu::<Phones, _, _>(console, db).await,
            "6" => crud_menu::<Users, _, _>(console, db).await,
            "7" => locations_menu(console, db).await,
            "8" => social_security_menu(console, db).await,
            "0" => return Ok(()),
            _ => invalid_option(console),
        };
        report(console, result)?;
    }
}

/// Reads a person id and checks it exists.
pub(crate) async fn read_person_id<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    db: &Database,
    label: &str,
) -> AppResult<String> {
    let id = console.read_required(label)?;
    if !db.people().exists(&id).await? {
        return Err(AppError::not_found("Person", &id));
    }
    Ok(id)
}

// =============================================================================
// Persons
// =============================================================================

pub(crate) struct Persons;

fn person_table(people: &[Person]) -> Table {
    let mut table = Table::new(vec![
        Column::left("ID", 12),
        Column::left("NAME", 17),
        Column::left("LAST NAME", 17),
        Column::left("EMAIL", 27),
        Column::right("TYPE", 4),
    ]);
    for p in people {
        table.row(vec![
            p.id.clone(),
            p.name.clone(),
            p.last_name.clone(),
            p.email.clone(),
            p.person_type_id.to_string(),
        ]);
    }
    table
}

/// Prints the catalogs a person points at and reads the three ids.
async fn read_person_refs<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    db: &Database,
    current: Option<&Person>,
) -> AppResult<(i64, i64, i64)> {
    let read = |console: &mut Console<R, W>, label: &str, value: Option<i64>| match value {
        Some(v) => console.read_optional_i64(label, v),
        None => console.read_i64(label),
    };

    let documents = db.document_types().list_all().await?;
    console.print_table(&choices_table(documents.into_iter().map(|d| (d.id, d.name))))?;
    let document_type_id = read(console, "Document type", current.map(|p| p.document_type_id))?;

    let types = db.person_types().list_all().await?;
    console.print_table(&choices_table(types.into_iter().map(|t| (t.id, t.name))))?;
    let person_type_id = read(console, "Person type", current.map(|p| p.person_type_id))?;

    let cities = db.cities().list_all().await?;
    console.print_table(&choices_table(cities.into_iter().map(|c| (c.id, c.name))))?;
    let city_id = read(console, "City", current.map(|p| p.city_id))?;

    Ok((document_type_id, person_type_id, city_id))
}

impl CrudScreen for Persons {
    const TITLE: &'static str = "PERSONS";
    const EXTRA: Option<&'static str> = Some("Search");

    async fn list<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
        let people = db.people().list_all().await?;
        console.print_table(&person_table(&people))
    }

    async fn create<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
        let id = console.read_required("Person id (document number)")?;
        if db.people().exists(&id).await? {
            return Err(AppError::validation(format!("Person '{}' already exists", id)));
        }

        let name = console.read_required("Name")?;
        let last_name = console.read_required("Last name")?;
        let email = console.read_text("Email")?;
        let (document_type_id, person_type_id, city_id) = read_person_refs(console, db, None).await?;

        let person = Person {
            id,
            name,
            last_name,
            email,
            document_type_id,
            person_type_id,
            city_id,
        };
        let id = db.people().insert(&person).await?;
        console.print_success(format!("Person {} created", id))
    }

    async fn update<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
        let id = console.read_required("Person id")?;
        let mut person = found(db.people().get_by_id(&id).await?, "Person", &id)?;

        console.line("Leave a field blank to keep its value.")?;
        person.name = console.read_optional("Name", &person.name)?;
        person.last_name = console.read_optional("Last name", &person.last_name)?;
        person.email = console.read_optional("Email", &person.email)?;
        let (document_type_id, person_type_id, city_id) =
            read_person_refs(console, db, Some(&person)).await?;
        person.document_type_id = document_type_id;
        person.person_type_id = person_type_id;
        person.city_id = city_id;

        affected(db.people().update(&person).await?, "Person", &id)?;
        console.print_success(format!("Person {} updated", id))
    }

    async fn delete<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
        let id = console.read_required("Person id")?;
        let person = found(db.people().get_by_id(&id).await?, "Person", &id)?;

        if !console.confirm(&format!("Delete {} ({})?", person.full_name(), person.id))? {
            return console.line("Cancelled.");
        }
        affected(db.people().delete(&id).await?, "Person", &id)?;
        console.print_success(format!("Person {} deleted", id))
    }

    async fn extra<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
        let term = console.read_required("Search (id, name or last name)")?;
        let people = db.people().search(&term).await?;
        console.print_table(&person_table(&people))
    }
}

// =============================================================================
// Customers
// =============================================================================

pub(crate) struct Customers;

impl CrudScreen for Customers {
    const TITLE: &'static str = "CUSTOMERS";

    async fn list<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
        let customers = db.customers().list_all().await?;

        let mut table = Table::new(vec![
            Column::right("ID", 5),
            Column::left("PERSON", 12),
            Column::left("NAME", 27),
            Column::left("BIRTH", 10),
            Column::left("LAST BUY", 10),
        ]);
        for c in &customers {
            table.row(vec![
                c.id.to_string(),
                c.person_id.clone(),
                or_dash(c.person_name.as_deref()),
                format_date(c.birth_date),
                c.last_purchase_date.map(format_date).unwrap_or_else(|| "-".to_string()),
            ]);
        }
        console.print_table(&table)
    }

    async fn create<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
        let person_id = read_person_id(console, db, "Person id").await?;
        if db.customers().get_by_person(&person_id).await?.is_some() {
            return Err(AppError::validation(format!(
                "Person '{}' is already a customer",
                person_id
            )));
        }
        let birth_date = console.read_date("Birth date", None)?;

        let customer = Customer {
            id: 0,
            person_id,
            birth_date,
            last_purchase_date: None,
            person_name: None,
        };
        let id = db.customers().insert(&customer).await?;
        console.print_success(format!("Customer {} created", id))
    }

    async fn update<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
        let id = console.read_i64("Customer id")?;
        let mut customer = found(db.customers().get_by_id(&id).await?, "Customer", id)?;

        customer.birth_date = console.read_date("Birth date", Some(customer.birth_date))?;
        affected(db.customers().update(&customer).await?, "Customer", id)?;
        console.print_success(format!("Customer {} updated", id))
    }

    async fn delete<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
        let id = console.read_i64("Customer id")?;
        let customer = found(db.customers().get_by_id(&id).await?, "Customer", id)?;

        let name = or_dash(customer.person_name.as_deref());
        if !console.confirm(&format!("Delete customer {} ({})?", id, name))? {
            return console.line("Cancelled.");
        }
        affected(db.customers().delete(&id).await?, "Customer", id)?;
        console.print_success(format!("Customer {} deleted", id))
    }
}

// =============================================================================
// Employees
// =============================================================================

pub(crate) struct Employees;

async fn read_social_security<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    db: &Database,
    current: Option<&Employee>,
) -> AppResult<(i64, i64)> {
    let eps = db.eps().list_all().await?;
    console.print_table(&choices_table(eps.into_iter().map(|e| (e.id, e.name))))?;
    let eps_id = match current {
        Some(e) => console.read_optional_i64("EPS", e.eps_id)?,
        None => console.read_i64("EPS")?,
    };

    let arl = db.arl().list_all().await?;
    console.print_table(&choices_table(arl.into_iter().map(|a| (a.id, a.name))))?;
    let arl_id = match current {
        Some(e) => console.read_optional_i64("ARL", e.arl_id)?,
        None => console.read_i64("ARL")?,
    };

    Ok((eps_id, arl_id))
}

impl CrudScreen for Employees {
    const TITLE: &'static str = "EMPLOYEES";

    async fn list<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
        let employees = db.employees().list_all().await?;

        let mut table = Table::new(vec![
            Column::right("ID", 5),
            Column::left("PERSON", 12),
            Column::left("NAME", 27),
            Column::left("JOINED", 10),
            Column::right("SALARY", 14),
            Column::right("EPS", 4),
            Column::right("ARL", 4),
        ]);
        for e in &employees {
            table.row(vec![
                e.id.to_string(),
                e.person_id.clone(),
                or_dash(e.person_name.as_deref()),
                format_date(e.join_date),
                e.base_salary().to_string(),
                e.eps_id.to_string(),
                e.arl_id.to_string(),
            ]);
        }
        console.print_table(&table)
    }

    async fn create<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
        let person_id = read_person_id(console, db, "Person id").await?;
        let join_date = console.read_date("Join date", Some(today()))?;
        let salary = console.read_money("Base salary")?;
        let (eps_id, arl_id) = read_social_security(console, db, None).await?;

        let employee = Employee {
            id: 0,
            person_id,
            join_date,
            base_salary_cents: salary.cents(),
            eps_id,
            arl_id,
            person_name: None,
        };
        let id = db.employees().insert(&employee).await?;
        console.print_success(format!("Employee {} created", id))
    }

    async fn update<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
        let id = console.read_i64("Employee id")?;
        let mut employee = found(db.employees().get_by_id(&id).await?, "Employee", id)?;

        console.line("Leave a field blank to keep its value.")?;
        employee.join_date = console.read_date("Join date", Some(employee.join_date))?;
        employee.base_salary_cents = console
            .read_optional_money("Base salary", employee.base_salary())?
            .cents();
        let (eps_id, arl_id) = read_social_security(console, db, Some(&employee)).await?;
        employee.eps_id = eps_id;
        employee.arl_id = arl_id;

        affected(db.employees().update(&employee).await?, "Employee", id)?;
        console.print_success(format!("Employee {} updated", id))
    }

    async fn delete<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
        let id = console.read_i64("Employee id")?;
        let employee = found(db.employees().get_by_id(&id).await?, "Employee", id)?;

        let name = or_dash(employee.person_name.as_deref());
        if !console.confirm(&format!("Delete employee {} ({})?", id, name))? {
            return console.line("Cancelled.");
        }
        affected(db.employees().delete(&id).await?, "Employee", id)?;
        console.print_success(format!("Employee {} deleted", id))
    }
}

// =============================================================================
// Suppliers
// =============================================================================

pub(crate) struct Suppliers;

impl CrudScreen for Suppliers {
    const TITLE: &'static str = "SUPPLIERS";

    async fn list<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
        let suppliers = db.suppliers().list_all().await?;

        let mut table = Table::new(vec![
            Column::right("ID", 5),
            Column::left("PERSON", 12),
            Column::left("NAME", 27),
            Column::right("DISCOUNT", 8),
            Column::right("PAY DAY", 7),
        ]);
        for s in &suppliers {
            table.row(vec![
                s.id.to_string(),
                s.person_id.clone(),
                or_dash(s.person_name.as_deref()),
                s.discount.to_string(),
                s.pay_day.to_string(),
            ]);
        }
        console.print_table(&table)
    }

    async fn create<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
        let person_id = read_person_id(console, db, "Person id").await?;
        let discount = console.read_percent("Discount", None)?;
        let pay_day = console.read_i64("Pay day (1-31)")?;

        let supplier = Supplier {
            id: 0,
            person_id,
            discount,
            pay_day,
            person_name: None,
        };
        let id = db.suppliers().insert(&supplier).await?;
        console.print_success(format!("Supplier {} created", id))
    }

    async fn update<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
        let id = console.read_i64("Supplier id")?;
        let mut supplier = found(db.suppliers().get_by_id(&id).await?, "Supplier", id)?;

        console.line("Leave a field blank to keep its value.")?;
        supplier.discount = console.read_percent("Discount", Some(supplier.discount))?;
        supplier.pay_day = console.read_optional_i64("Pay day (1-31)", supplier.pay_day)?;

        affected(db.suppliers().update(&supplier).await?, "Supplier", id)?;
        console.print_success(format!("Supplier {} updated", id))
    }

    async fn delete<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
        let id = console.read_i64("Supplier id")?;
        let supplier = found(db.suppliers().get_by_id(&id).await?, "Supplier", id)?;

        let name = or_dash(supplier.person_name.as_deref());
        if !console.confirm(&format!("Delete supplier {} ({})?", id, name))? {
            return console.line("Cancelled.");
        }
        affected(db.suppliers().delete(&id).await?, "Supplier", id)?;
        console.print_success(format!("Supplier {} deleted", id))
    }
}
