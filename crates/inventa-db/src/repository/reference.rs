//! # Reference Data Repositories
//!
//! Small lookup tables: locations, social security entities, document,
//! person and cash movement types.
//!
//! ```text
//! countries ──< regions ──< cities ──< people.city_id
//! eps, arl ──────────────────────────< employees.eps_id / arl_id
//! document_types, person_types ──────< people
//! movement_types ────────────────────< cash_flows
//! ```

use inventa_core::validation::validate_name;
use inventa_core::{
    Arl, City, CoreError, CoreResult, Country, DocumentType, Eps, MovementType, PersonType, Region,
};

use super::{SqliteQuery, TableMapping, TableRepository};
use crate::error::DbResult;

pub type CountryRepository = TableRepository<Country>;
pub type RegionRepository = TableRepository<Region>;
pub type CityRepository = TableRepository<City>;
pub type EpsRepository = TableRepository<Eps>;
pub type ArlRepository = TableRepository<Arl>;
pub type DocumentTypeRepository = TableRepository<DocumentType>;
pub type PersonTypeRepository = TableRepository<PersonType>;
pub type MovementTypeRepository = TableRepository<MovementType>;

/// Maps an `{ id, name }` lookup type onto its table.
macro_rules! name_table {
    ($ty:ty, $entity:literal, $table:literal) => {
        impl TableMapping for $ty {
            type Id = i64;

            const ENTITY: &'static str = $entity;
            const TABLE: &'static str = $table;
            const SELECT: &'static str = concat!("SELECT id, name FROM ", $table);
            const ORDER_BY: &'static str = "id";
            const COLUMNS: &'static [&'static str] = &["name"];

            fn key(&self) -> i64 {
                self.id
            }

            fn assigned_id(&self, rowid: i64) -> i64 {
                rowid
            }

            fn bind_columns<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
                query.bind(&self.name)
            }

            fn validate(&self) -> CoreResult<()> {
                validate_name("name", &self.name).map_err(CoreError::from)
            }
        }
    };
}

name_table!(Country, "Country", "countries");
name_table!(Eps, "EPS", "eps");
name_table!(Arl, "ARL", "arl");
name_table!(DocumentType, "Document type", "document_types");
name_table!(PersonType, "Person type", "person_types");

// =============================================================================
// Regions and cities
// =============================================================================

impl TableMapping for Region {
    type Id = i64;

    const ENTITY: &'static str = "Region";
    const TABLE: &'static str = "regions";
    const SELECT: &'static str = "SELECT id, name, country_id FROM regions";
    const ORDER_BY: &'static str = "name";
    const COLUMNS: &'static [&'static str] = &["name", "country_id"];

    fn key(&self) -> i64 {
        self.id
    }

    fn assigned_id(&self, rowid: i64) -> i64 {
        rowid
    }

    fn bind_columns<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query.bind(&self.name).bind(self.country_id)
    }

    fn validate(&self) -> CoreResult<()> {
        validate_name("region name", &self.name).map_err(CoreError::from)
    }
}

impl TableRepository<Region> {
    pub async fn list_by_country(&self, country_id: i64) -> DbResult<Vec<Region>> {
        self.find_where("country_id = ?1", country_id).await
    }
}

impl TableMapping for City {
    type Id = i64;

    const ENTITY: &'static str = "City";
    const TABLE: &'static str = "cities";
    const SELECT: &'static str = "SELECT id, name, region_id FROM cities";
    const ORDER_BY: &'static str = "name";
    const COLUMNS: &'static [&'static str] = &["name", "region_id"];

    fn key(&self) -> i64 {
        self.id
    }

    fn assigned_id(&self, rowid: i64) -> i64 {
        rowid
    }

    fn bind_columns<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query.bind(&self.name).bind(self.region_id)
    }

    fn validate(&self) -> CoreResult<()> {
        validate_name("city name", &self.name).map_err(CoreError::from)
    }
}

impl TableRepository<City> {
    pub async fn list_by_region(&self, region_id: i64) -> DbResult<Vec<City>> {
        self.find_where("region_id = ?1", region_id).await
    }
}

// =============================================================================
// Movement types
// =============================================================================

impl TableMapping for MovementType {
    type Id = i64;

    const ENTITY: &'static str = "Movement type";
    const TABLE: &'static str = "movement_types";
    const SELECT: &'static str = "SELECT id, name, kind FROM movement_types";
    const ORDER_BY: &'static str = "id";
    const COLUMNS: &'static [&'static str] = &["name", "kind"];

    fn key(&self) -> i64 {
        self.id
    }

    fn assigned_id(&self, rowid: i64) -> i64 {
        rowid
    }

    fn bind_columns<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query.bind(&self.name).bind(self.kind)
    }

    fn validate(&self) -> CoreResult<()> {
        validate_name("movement type", &self.name).map_err(CoreError::from)
    }
}

#[cfg(test)]
mod tests {
    use inventa_core::MovementKind;

    use super::*;
    use crate::error::DbError;
    use crate::repository::fixtures::database;
    use crate::repository::Repository;

    #[tokio::test]
    async fn test_seeded_reference_data() {
        let db = database().await;

        let types = db.person_types().list_all().await.unwrap();
        let names: Vec<_> = types.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Cliente", "Empleado", "Proveedor"]);

        assert_eq!(db.document_types().list_all().await.unwrap().len(), 5);

        let movements = db.movement_types().list_all().await.unwrap();
        assert_eq!(movements[0].kind, MovementKind::Inflow);
        assert_eq!(movements[3].name, "Compra");
        assert_eq!(movements[3].kind, MovementKind::Outflow);
    }

    #[tokio::test]
    async fn test_location_hierarchy() {
        let db = database().await;

        let country = db
            .countries()
            .insert(&Country { id: 0, name: "Perú".to_string() })
            .await
            .unwrap();
        let region = db
            .regions()
            .insert(&Region { id: 0, name: "Lima".to_string(), country_id: country })
            .await
            .unwrap();
        db.cities()
            .insert(&City { id: 0, name: "Miraflores".to_string(), region_id: region })
            .await
            .unwrap();
        db.cities()
            .insert(&City { id: 0, name: "Barranco".to_string(), region_id: region })
            .await
            .unwrap();

        let regions = db.regions().list_by_country(country).await.unwrap();
        assert_eq!(regions.len(), 1);

        let cities = db.cities().list_by_region(region).await.unwrap();
        let names: Vec<_> = cities.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Barranco", "Miraflores"]);

        // Seeded Colombia/Santander/Bucaramanga is untouched.
        assert_eq!(db.cities().list_by_region(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_region_with_unknown_country() {
        let db = database().await;
        let err = db
            .regions()
            .insert(&Region { id: 0, name: "Nowhere".to_string(), country_id: 77 })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_eps_name_required() {
        let db = database().await;
        let err = db
            .eps()
            .insert(&Eps { id: 0, name: "  ".to_string() })
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_delete_referenced_city_fails() {
        let db = database().await;
        db.people()
            .insert(&crate::repository::fixtures::person("1001", "Ana", 1))
            .await
            .unwrap();
        let err = db.cities().delete(&1).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }
}
