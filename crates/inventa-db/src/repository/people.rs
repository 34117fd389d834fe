//! # People Repositories
//!
//! Persons and the role tables keyed by person id.
//!
//! ```text
//! people (id = document number)
//!   ├── customers       person_id UNIQUE
//!   ├── employees       person_id UNIQUE
//!   ├── suppliers       person_id UNIQUE
//!   ├── phone_numbers   person_id (many)
//!   └── users           person_id (many)
//! ```
//!
//! Every role row is checked against `people` before it is written, so a
//! missing person surfaces as `PersonNotFound` instead of a bare foreign-key
//! failure. Listings join `people` to show the full name.

use chrono::{Local, Utc};
use inventa_core::validation::{
    validate_customer, validate_employee, validate_person, validate_phone, validate_supplier,
    validate_user,
};
use inventa_core::{
    CoreError, CoreResult, Customer, Employee, Person, PersonTelephone, Supplier, User,
};
use tracing::debug;

use super::{contains_pattern, SqliteQuery, TableMapping, TableRepository};
use crate::error::DbResult;

pub type PersonRepository = TableRepository<Person>;
pub type CustomerRepository = TableRepository<Customer>;
pub type EmployeeRepository = TableRepository<Employee>;
pub type SupplierRepository = TableRepository<Supplier>;
pub type PhoneRepository = TableRepository<PersonTelephone>;
pub type UserRepository = TableRepository<User>;

// =============================================================================
// Person
// =============================================================================

impl TableMapping for Person {
    type Id = String;

    const ENTITY: &'static str = "Person";
    const TABLE: &'static str = "people";
    const SELECT: &'static str = "SELECT id, name, last_name, email, document_type_id, \
                                  person_type_id, city_id FROM people";
    const ORDER_BY: &'static str = "last_name, name";
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "last_name",
        "email",
        "document_type_id",
        "person_type_id",
        "city_id",
    ];
    const AUTO_KEY: bool = false;

    fn key(&self) -> String {
        self.id.clone()
    }

    fn assigned_id(&self, _rowid: i64) -> String {
        self.id.clone()
    }

    fn bind_columns<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(&self.name)
            .bind(&self.last_name)
            .bind(&self.email)
            .bind(self.document_type_id)
            .bind(self.person_type_id)
            .bind(self.city_id)
    }

    fn validate(&self) -> CoreResult<()> {
        validate_person(self).map_err(CoreError::from)
    }
}

impl TableRepository<Person> {
    /// Persons whose id, name or last name contains `term`.
    pub async fn search(&self, term: &str) -> DbResult<Vec<Person>> {
        let term = term.trim();
        debug!(term = %term, "Searching people");

        self.find_where(
            "id LIKE ?1 ESCAPE '\\' OR name LIKE ?1 ESCAPE '\\' OR last_name LIKE ?1 ESCAPE '\\'",
            contains_pattern(term),
        )
        .await
    }

    pub async fn exists(&self, id: &str) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM people WHERE id = ?")
            .bind(id)
            .fetch_one(self.pool())
            .await?;
        Ok(count > 0)
    }
}

// =============================================================================
// Customer
// =============================================================================

impl TableMapping for Customer {
    type Id = i64;

    const ENTITY: &'static str = "Customer";
    const TABLE: &'static str = "customers";
    const KEY_EXPR: &'static str = "c.id";
    const SELECT: &'static str = "SELECT c.id, c.person_id, c.birth_date, c.last_purchase_date, \
                                  p.name || ' ' || p.last_name AS person_name \
                                  FROM customers c LEFT JOIN people p ON p.id = c.person_id";
    const ORDER_BY: &'static str = "person_name, c.id";
    const COLUMNS: &'static [&'static str] = &["person_id", "birth_date", "last_purchase_date"];

    fn key(&self) -> i64 {
        self.id
    }

    fn assigned_id(&self, rowid: i64) -> i64 {
        rowid
    }

    fn bind_columns<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(&self.person_id)
            .bind(self.birth_date)
            .bind(self.last_purchase_date)
    }

    fn validate(&self) -> CoreResult<()> {
        validate_customer(self, Local::now().date_naive()).map_err(CoreError::from)
    }

    fn person_refs(&self) -> Vec<&str> {
        vec![self.person_id.as_str()]
    }
}

impl TableRepository<Customer> {
    /// The customer row of a person, if the person is a customer.
    pub async fn get_by_person(&self, person_id: &str) -> DbResult<Option<Customer>> {
        let mut rows = self
            .find_where("c.person_id = ?1", person_id.to_string())
            .await?;
        Ok(rows.pop())
    }
}

// =============================================================================
// Employee
// =============================================================================

impl TableMapping for Employee {
    type Id = i64;

    const ENTITY: &'static str = "Employee";
    const TABLE: &'static str = "employees";
    const KEY_EXPR: &'static str = "e.id";
    const SELECT: &'static str = "SELECT e.id, e.person_id, e.join_date, e.base_salary_cents, \
                                  e.eps_id, e.arl_id, \
                                  p.name || ' ' || p.last_name AS person_name \
                                  FROM employees e LEFT JOIN people p ON p.id = e.person_id";
    const ORDER_BY: &'static str = "person_name, e.id";
    const COLUMNS: &'static [&'static str] =
        &["person_id", "join_date", "base_salary_cents", "eps_id", "arl_id"];

    fn key(&self) -> i64 {
        self.id
    }

    fn assigned_id(&self, rowid: i64) -> i64 {
        rowid
    }

    fn bind_columns<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(&self.person_id)
            .bind(self.join_date)
            .bind(self.base_salary_cents)
            .bind(self.eps_id)
            .bind(self.arl_id)
    }

    fn validate(&self) -> CoreResult<()> {
        validate_employee(self, Local::now().date_naive()).map_err(CoreError::from)
    }

    fn person_refs(&self) -> Vec<&str> {
        vec![self.person_id.as_str()]
    }
}

// =============================================================================
// Supplier
// =============================================================================

impl TableMapping for Supplier {
    type Id = i64;

    const ENTITY: &'static str = "Supplier";
    const TABLE: &'static str = "suppliers";
    const KEY_EXPR: &'static str = "s.id";
    const SELECT: &'static str = "SELECT s.id, s.person_id, s.discount_bps, s.pay_day, \
                                  p.name || ' ' || p.last_name AS person_name \
                                  FROM suppliers s LEFT JOIN people p ON p.id = s.person_id";
    const ORDER_BY: &'static str = "person_name, s.id";
    const COLUMNS: &'static [&'static str] = &["person_id", "discount_bps", "pay_day"];

    fn key(&self) -> i64 {
        self.id
    }

    fn assigned_id(&self, rowid: i64) -> i64 {
        rowid
    }

    fn bind_columns<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(&self.person_id)
            .bind(self.discount)
            .bind(self.pay_day)
    }

    fn validate(&self) -> CoreResult<()> {
        validate_supplier(self).map_err(CoreError::from)
    }

    fn person_refs(&self) -> Vec<&str> {
        vec![self.person_id.as_str()]
    }
}

// =============================================================================
// Phone numbers
// =============================================================================

impl TableMapping for PersonTelephone {
    type Id = i64;

    const ENTITY: &'static str = "Phone number";
    const TABLE: &'static str = "phone_numbers";
    const SELECT: &'static str = "SELECT id, number, person_id, phone_type FROM phone_numbers";
    const ORDER_BY: &'static str = "person_id, id";
    const COLUMNS: &'static [&'static str] = &["number", "person_id", "phone_type"];

    fn key(&self) -> i64 {
        self.id
    }

    fn assigned_id(&self, rowid: i64) -> i64 {
        rowid
    }

    fn bind_columns<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(&self.number)
            .bind(&self.person_id)
            .bind(self.phone_type)
    }

    fn validate(&self) -> CoreResult<()> {
        validate_phone(self).map_err(CoreError::from)
    }

    fn person_refs(&self) -> Vec<&str> {
        vec![self.person_id.as_str()]
    }
}

impl TableRepository<PersonTelephone> {
    pub async fn list_by_person(&self, person_id: &str) -> DbResult<Vec<PersonTelephone>> {
        self.find_where("person_id = ?1", person_id.to_string())
            .await
    }
}

// =============================================================================
// Users
// =============================================================================

impl TableMapping for User {
    type Id = i64;

    const ENTITY: &'static str = "User";
    const TABLE: &'static str = "users";
    const SELECT: &'static str = "SELECT id, person_id, username, password, role, created_at, \
                                  last_access, is_active FROM users";
    const ORDER_BY: &'static str = "username";
    const COLUMNS: &'static [&'static str] = &[
        "person_id",
        "username",
        "password",
        "role",
        "created_at",
        "last_access",
        "is_active",
    ];

    fn key(&self) -> i64 {
        self.id
    }

    fn assigned_id(&self, rowid: i64) -> i64 {
        rowid
    }

    fn bind_columns<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(&self.person_id)
            .bind(&self.username)
            .bind(&self.password)
            .bind(&self.role)
            .bind(self.created_at)
            .bind(self.last_access)
            .bind(self.is_active)
    }

    fn validate(&self) -> CoreResult<()> {
        validate_user(self).map_err(CoreError::from)
    }

    fn person_refs(&self) -> Vec<&str> {
        vec![self.person_id.as_str()]
    }
}

impl TableRepository<User> {
    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let mut rows = self
            .find_where("username = ?1", username.trim().to_string())
            .await?;
        Ok(rows.pop())
    }

    /// Stamps `last_access` with the current time.
    pub async fn record_access(&self, id: i64) -> DbResult<bool> {
        debug!(id, "Recording user access");

        let result = sqlx::query("UPDATE users SET last_access = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_active(&self, id: i64, active: bool) -> DbResult<bool> {
        debug!(id, active, "Setting user active flag");

        let result = sqlx::query("UPDATE users SET is_active = ? WHERE id = ?")
            .bind(active)
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use inventa_core::{Percentage, PhoneType};

    use super::*;
    use crate::error::DbError;
    use crate::repository::fixtures::{database, day, person};
    use crate::repository::Repository;

    #[tokio::test]
    async fn test_person_round_trip_and_search() {
        let db = database().await;
        let ana = person("1001", "Ana", 1);
        db.people().insert(&ana).await.unwrap();
        db.people().insert(&person("1002", "Bruno", 2)).await.unwrap();

        let loaded = db.people().get_by_id(&"1001".to_string()).await.unwrap();
        assert_eq!(loaded, Some(ana));

        let found = db.people().search("brun").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "1002");
        assert!(db.people().search("_").await.unwrap().is_empty());
        assert!(db.people().search("%").await.unwrap().is_empty());

        assert!(db.people().exists("1001").await.unwrap());
        assert!(!db.people().exists("9999").await.unwrap());
    }

    #[tokio::test]
    async fn test_person_unknown_city_is_foreign_key_error() {
        let db = database().await;
        let mut p = person("1001", "Ana", 1);
        p.city_id = 999;

        let err = db.people().insert(&p).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_customer_requires_existing_person() {
        let db = database().await;
        let customer = Customer {
            id: 0,
            person_id: "GHOST".to_string(),
            birth_date: day(1990, 1, 1),
            last_purchase_date: None,
            person_name: None,
        };

        let err = db.customers().insert(&customer).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Validation(CoreError::PersonNotFound(ref id)) if id == "GHOST"
        ));
    }

    #[tokio::test]
    async fn test_customer_listing_joins_person_name() {
        let db = database().await;
        db.people().insert(&person("1001", "Ana", 1)).await.unwrap();

        let customer = Customer {
            id: 0,
            person_id: "1001".to_string(),
            birth_date: day(1990, 1, 1),
            last_purchase_date: None,
            person_name: None,
        };
        let id = db.customers().insert(&customer).await.unwrap();

        let listed = db.customers().list_all().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, id);
        assert_eq!(listed[0].person_name.as_deref(), Some("Ana Test"));

        let by_person = db.customers().get_by_person("1001").await.unwrap().unwrap();
        assert_eq!(by_person.id, id);

        let err = db.customers().insert(&customer).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_customer_birth_date_in_future_rejected() {
        let db = database().await;
        db.people().insert(&person("1001", "Ana", 1)).await.unwrap();

        let customer = Customer {
            id: 0,
            person_id: "1001".to_string(),
            birth_date: Local::now().date_naive() + chrono::Duration::days(2),
            last_purchase_date: None,
            person_name: None,
        };
        assert!(db.customers().insert(&customer).await.unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn test_employee_and_supplier_crud() {
        let db = database().await;
        db.people().insert(&person("E1", "Elena", 2)).await.unwrap();
        db.people().insert(&person("S1", "Sergio", 3)).await.unwrap();

        let mut employee = Employee {
            id: 0,
            person_id: "E1".to_string(),
            join_date: day(2022, 2, 1),
            base_salary_cents: 130_000_000,
            eps_id: 1,
            arl_id: 1,
            person_name: None,
        };
        employee.id = db.employees().insert(&employee).await.unwrap();
        employee.eps_id = 2;
        assert!(db.employees().update(&employee).await.unwrap());
        let loaded = db.employees().get_by_id(&employee.id).await.unwrap().unwrap();
        assert_eq!(loaded.eps_id, 2);
        assert_eq!(loaded.person_name.as_deref(), Some("Elena Test"));

        let supplier = Supplier {
            id: 0,
            person_id: "S1".to_string(),
            discount: Percentage::from_bps(500),
            pay_day: 15,
            person_name: None,
        };
        let id = db.suppliers().insert(&supplier).await.unwrap();
        assert_eq!(
            db.suppliers().get_by_id(&id).await.unwrap().unwrap().discount,
            Percentage::from_bps(500)
        );
        assert!(db.suppliers().delete(&id).await.unwrap());
        assert!(db.suppliers().get_by_id(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_employee_join_date_in_future_rejected() {
        let db = database().await;
        db.people().insert(&person("E1", "Elena", 2)).await.unwrap();

        let mut employee = Employee {
            id: 0,
            person_id: "E1".to_string(),
            join_date: Local::now().date_naive() + chrono::Duration::days(1),
            base_salary_cents: 130_000_000,
            eps_id: 1,
            arl_id: 1,
            person_name: None,
        };
        assert!(db.employees().insert(&employee).await.unwrap_err().is_validation());

        employee.join_date = day(2022, 2, 1);
        employee.id = db.employees().insert(&employee).await.unwrap();
        employee.join_date = Local::now().date_naive() + chrono::Duration::days(7);
        assert!(db.employees().update(&employee).await.unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn test_supplier_pay_day_out_of_range() {
        let db = database().await;
        db.people().insert(&person("S1", "Sergio", 3)).await.unwrap();
        let supplier = Supplier {
            id: 0,
            person_id: "S1".to_string(),
            discount: Percentage::default(),
            pay_day: 40,
            person_name: None,
        };
        assert!(db.suppliers().insert(&supplier).await.unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn test_phones_by_person() {
        let db = database().await;
        db.people().insert(&person("1001", "Ana", 1)).await.unwrap();
        db.people().insert(&person("1002", "Bruno", 1)).await.unwrap();

        for (number, owner, kind) in [
            ("6071234567", "1001", PhoneType::Landline),
            ("3001234567", "1001", PhoneType::Mobile),
            ("3109876543", "1002", PhoneType::Mobile),
        ] {
            let phone = PersonTelephone {
                id: 0,
                number: number.to_string(),
                person_id: owner.to_string(),
                phone_type: kind,
            };
            db.phones().insert(&phone).await.unwrap();
        }

        let phones = db.phones().list_by_person("1001").await.unwrap();
        assert_eq!(phones.len(), 2);
        assert_eq!(phones[0].phone_type, PhoneType::Landline);
        assert_eq!(phones[1].phone_type, PhoneType::Mobile);
    }

    #[tokio::test]
    async fn test_user_access_and_active_flag() {
        let db = database().await;
        db.people().insert(&person("1001", "Ana", 2)).await.unwrap();

        let user = User {
            id: 0,
            person_id: "1001".to_string(),
            username: "ana".to_string(),
            password: "secret".to_string(),
            role: "admin".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap(),
            last_access: None,
            is_active: true,
        };
        let id = db.users().insert(&user).await.unwrap();

        assert!(db.users().record_access(id).await.unwrap());
        assert!(db.users().set_active(id, false).await.unwrap());

        let loaded = db.users().get_by_username("ana").await.unwrap().unwrap();
        assert!(loaded.last_access.is_some());
        assert!(!loaded.is_active);
        assert_eq!(loaded.created_at, user.created_at);

        let err = db.users().insert(&user).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }
}
