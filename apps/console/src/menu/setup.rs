//! # Setup Catalogs
//!
//! Locations and social security entities referenced by people and
//! employees.
//!
//! ```text
//! Locations ──┬── Countries
//!             ├── Regions   (filter by country)
//!             └── Cities    (filter by region)
//! Social security ──┬── EPS
//!                   └── ARL
//! ```

use std::io::{BufRead, Write};

use inventa_core::{Arl, City, Country, Eps, Region};
use inventa_db::{Database, Repository};

use super::{affected, choices_table, crud_menu, found, invalid_option, report, CrudScreen};
use crate::console::Console;
use crate::error::AppResult;
use crate::table::{Column, Table};

pub(crate) async fn locations_menu<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    db: &Database,
) -> AppResult<()> {
    const OPTIONS: &[(&str, &str)] = &[
        ("1", "Countries"),
        ("2", "Regions"),
        ("3", "Cities"),
        ("0", "Back"),
    ];
    loop {
        let choice = console.choose("LOCATIONS", OPTIONS)?;
        let result = match choice.as_str() {
            "1" => crud_menu::<Countries, _, _>(console, db).await,
            "2" => crud_menu::<Regions, _, _>(console, db).await,
            "3" => crud_menu::<Cities, _, _>(console, db).await,
            "0" => return Ok(()),
            _ => invalid_option(console),
        };
        report(console, result)?;
    }
}

pub(crate) async fn social_security_menu<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    db: &Database,
) -> AppResult<()> {
    const OPTIONS: &[(&str, &str)] = &[("1", "EPS"), ("2", "ARL"), ("0", "Back")];
    loop {
        let choice = console.choose("SOCIAL SECURITY", OPTIONS)?;
        let result = match choice.as_str() {
            "1" => crud_menu::<EpsScreen, _, _>(console, db).await,
            "2" => crud_menu::<ArlScreen, _, _>(console, db).await,
            "0" => return Ok(()),
            _ => invalid_option(console),
        };
        report(console, result)?;
    }
}

/// CRUD screen for an `{ id, name }` catalog.
macro_rules! named_screen {
    ($screen:ident, $ty:ident, $repo:ident, $title:literal, $entity:literal) => {
        pub(crate) struct $screen;

        impl CrudScreen for $screen {
            const TITLE: &'static str = $title;

            async fn list<R: BufRead, W: Write>(
                console: &mut Console<R, W>,
                db: &Database,
            ) -> AppResult<()> {
                let rows = db.$repo().list_all().await?;
                console.print_table(&choices_table(rows.into_iter().map(|r| (r.id, r.name))))
            }

            async fn create<R: BufRead, W: Write>(
                console: &mut Console<R, W>,
                db: &Database,
            ) -> AppResult<()> {
                let name = console.read_required("Name")?;
                let id = db.$repo().insert(&$ty { id: 0, name }).await?;
                console.print_success(format!("{} {} created", $entity, id))
            }

            async fn update<R: BufRead, W: Write>(
                console: &mut Console<R, W>,
                db: &Database,
            ) -> AppResult<()> {
                let id = console.read_i64(concat!($entity, " id"))?;
                let mut row = found(db.$repo().get_by_id(&id).await?, $entity, id)?;
                row.name = console.read_optional("Name", &row.name)?;
                affected(db.$repo().update(&row).await?, $entity, id)?;
                console.print_success(format!("{} {} updated", $entity, id))
            }

            async fn delete<R: BufRead, W: Write>(
                console: &mut Console<R, W>,
                db: &Database,
            ) -> AppResult<()> {
                let id = console.read_i64(concat!($entity, " id"))?;
                let row = found(db.$repo().get_by_id(&id).await?, $entity, id)?;
                if !console.confirm(&format!("Delete {} {}?", $entity, row.name))? {
                    return console.line("Cancelled.");
                }
                affected(db.$repo().delete(&id).await?, $entity, id)?;
                console.print_success(format!("{} {} deleted", $entity, id))
            }
        }
    };
}

named_screen!(Countries, Country, countries, "COUNTRIES", "Country");
named_screen!(EpsScreen, Eps, eps, "EPS", "EPS");
named_screen!(ArlScreen, Arl, arl, "ARL", "ARL");

// =============================================================================
// Regions
// =============================================================================

pub(crate) struct Regions;

fn region_table(regions: &[Region]) -> Table {
    let mut table = Table::new(vec![
        Column::right("ID", 4),
        Column::left("NAME", 27),
        Column::right("COUNTRY", 7),
    ]);
    for r in regions {
        table.row(vec![r.id.to_string(), r.name.clone(), r.country_id.to_string()]);
    }
    table
}

impl CrudScreen for Regions {
    const TITLE: &'static str = "REGIONS";
    const EXTRA: Option<&'static str> = Some("Filter by country");

    async fn list<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
        let regions = db.regions().list_all().await?;
        console.print_table(&region_table(&regions))
    }

    async fn create<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
        let name = console.read_required("Name")?;
        let countries = db.countries().list_all().await?;
        console.print_table(&choices_table(countries.into_iter().map(|c| (c.id, c.name))))?;
        let country_id = console.read_i64("Country")?;

        let id = db
            .regions()
            .insert(&Region {
                id: 0,
                name,
                country_id,
            })
            .await?;
        console.print_success(format!("Region {} created", id))
    }

    async fn update<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
        let id = console.read_i64("Region id")?;
        let mut region = found(db.regions().get_by_id(&id).await?, "Region", id)?;

        region.name = console.read_optional("Name", &region.name)?;
        region.country_id = console.read_optional_i64("Country", region.country_id)?;

        affected(db.regions().update(&region).await?, "Region", id)?;
        console.print_success(format!("Region {} updated", id))
    }

    async fn delete<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
        let id = console.read_i64("Region id")?;
        let region = found(db.regions().get_by_id(&id).await?, "Region", id)?;

        if !console.confirm(&format!("Delete region {}?", region.name))? {
            return console.line("Cancelled.");
        }
        affected(db.regions().delete(&id).await?, "Region", id)?;
        console.print_success(format!("Region {} deleted", id))
    }

    async fn extra<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
        let country_id = console.read_i64("Country id")?;
        let regions = db.regions().list_by_country(country_id).await?;
        console.print_table(&region_table(&regions))
    }
}

// =============================================================================
// Cities
// =============================================================================

pub(crate) struct Cities;

fn city_table(cities: &[City]) -> Table {
    let mut table = Table::new(vec![
        Column::right("ID", 4),
        Column::left("NAME", 27),
        Column::right("REGION", 6),
    ]);
    for c in cities {
        table.row(vec![c.id.to_string(), c.name.clone(), c.region_id.to_string()]);
    }
    table
}

impl CrudScreen for Cities {
    const TITLE: &'static str = "CITIES";
    const EXTRA: Option<&'static str> = Some("Filter by region");

    async fn list<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
        let cities = db.cities().list_all().await?;
        console.print_table(&city_table(&cities))
    }

    async fn create<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
        let name = console.read_required("Name")?;
        let regions = db.regions().list_all().await?;
        console.print_table(&choices_table(regions.into_iter().map(|r| (r.id, r.name))))?;
        let region_id = console.read_i64("Region")?;

        let id = db
            .cities()
            .insert(&City {
                id: 0,
                name,
                region_id,
            })
            .await?;
        console.print_success(format!("City {} created", id))
    }

    async fn update<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
        let id = console.read_i64("City id")?;
        let mut city = found(db.cities().get_by_id(&id).await?, "City", id)?;

        city.name = console.read_optional("Name", &city.name)?;
        city.region_id = console.read_optional_i64("Region", city.region_id)?;

        affected(db.cities().update(&city).await?, "City", id)?;
        console.print_success(format!("City {} updated", id))
    }

    async fn delete<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
        let id = console.read_i64("City id")?;
        let city = found(db.cities().get_by_id(&id).await?, "City", id)?;

        if !console.confirm(&format!("Delete city {}?", city.name))? {
            return console.line("Cancelled.");
        }
        affected(db.cities().delete(&id).await?, "City", id)?;
        console.print_success(format!("City {} deleted", id))
    }

    async fn extra<R: BufRead, W: Write>(console: &mut Console<R, W>, db: &Database) -> AppResult<()> {
        let region_id = console.read_i64("Region id")?;
        let cities = db.cities().list_by_region(region_id).await?;
        console.print_table(&city_table(&cities))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::testing::{output_of, scripted};
    use crate::menu::testing::seeded_db;

    #[tokio::test]
    async fn test_region_and_city_filters() {
        let db = seeded_db().await;
        let mut console = scripted(&[
            "2", "2", "Antioquia", "1", "5", "1", "0", //
            "3", "2", "Envigado", "2", "5", "2", "0", //
            "0",
        ]);
        locations_menu(&mut console, &db).await.unwrap();

        let out = output_of(&console);
        assert!(out.contains("OK: Region 2 created"));
        assert!(out.contains("OK: City 2 created"));
        assert!(out.contains("Envigado"));
        assert_eq!(db.cities().list_by_region(2).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_city_with_unknown_region_rejected() {
        let db = seeded_db().await;
        let mut console = scripted(&["3", "2", "Fantasma", "99", "0", "0"]);
        locations_menu(&mut console, &db).await.unwrap();

        assert!(output_of(&console).contains("Error: Invalid reference"));
        assert_eq!(db.cities().list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_eps_crud() {
        let db = seeded_db().await;
        let mut console = scripted(&[
            "1", "2", "Salud Total", //
            "3", "3", "Salud Total EPS", //
            "1", "0", "0",
        ]);
        social_security_menu(&mut console, &db).await.unwrap();

        let out = output_of(&console);
        assert!(out.contains("OK: EPS 3 created"));
        assert!(out.contains("OK: EPS 3 updated"));
        assert!(out.contains("Salud Total EPS"));
    }

    #[tokio::test]
    async fn test_delete_country_in_use_fails() {
        let db = seeded_db().await;
        let mut console = scripted(&["1", "4", "1", "y", "0", "0"]);
        locations_menu(&mut console, &db).await.unwrap();

        assert!(output_of(&console).contains("Error: Invalid reference"));
        assert!(db.countries().get_by_id(&1).await.unwrap().is_some());
    }
}
