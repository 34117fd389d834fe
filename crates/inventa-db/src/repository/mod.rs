//! # Repository Module
//!
//! Database repository implementations for Inventa.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    One Contract, Many Tables                            │
//! │                                                                         │
//! │  Menu action                                                           │
//! │       │                                                                 │
//! │       │  db.products().get_by_id(&"P1".into())                         │
//! │       ▼                                                                 │
//! │  Repository<T>  ← list_all / get_by_id / insert / update / delete      │
//! │       │                                                                 │
//! │       ├── TableRepository<E: TableMapping>                              │
//! │       │     one generic implementation; each entity only describes     │
//! │       │     its table, columns and binds                               │
//! │       │                                                                 │
//! │       └── SaleRepository, PurchaseRepository, CashFlowRepository,      │
//! │           PlanRepository                                               │
//! │             hand-written: header/detail rows, link tables and          │
//! │             multi-statement transactions                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (parameterized statements only)                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product`] - Products, search, stock adjustments, low-stock listing
//! - [`people`] - Persons, customers, employees, suppliers, phones, users
//! - [`reference`] - Locations, EPS/ARL, document/person/movement types
//! - [`sale`] - Sales with invoice allocation
//! - [`purchase`] - Purchases that restock products
//! - [`cash_flow`] - Cash movements and day balance
//! - [`plan`] - Promotional plans and their product links

pub mod cash_flow;
pub mod people;
pub mod plan;
pub mod product;
pub mod purchase;
pub mod reference;
pub mod sale;

use std::fmt;
use std::marker::PhantomData;

use inventa_core::{CoreError, CoreResult};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Encode, Executor, FromRow, Sqlite, SqlitePool, Transaction, Type};
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};

/// A query with SQLite arguments, as passed through [`TableMapping::bind_columns`].
pub type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

// =============================================================================
// Repository Contract
// =============================================================================

/// Uniform CRUD contract shared by every entity.
///
/// `insert` returns the key the row was stored under: the auto-increment
/// rowid, or the natural key for entities whose id is typed by the operator.
/// `update` and `delete` return `false` when no row matched.
#[allow(async_fn_in_trait)]
pub trait Repository<T> {
    type Id;

    async fn list_all(&self) -> DbResult<Vec<T>>;

    async fn get_by_id(&self, id: &Self::Id) -> DbResult<Option<T>>;

    async fn insert(&self, entity: &T) -> DbResult<Self::Id>;

    async fn update(&self, entity: &T) -> DbResult<bool>;

    async fn delete(&self, id: &Self::Id) -> DbResult<bool>;
}

// =============================================================================
// Table Mapping
// =============================================================================

/// Per-entity SQL adapter consumed by [`TableRepository`].
///
/// ## Contract
/// - `SELECT` is a complete `SELECT ... FROM ...` without `WHERE`/`ORDER BY`.
///   It may join other tables to fill display-only fields.
/// - `KEY_EXPR` is the key column as it must be written after `SELECT`'s
///   `FROM` clause (qualified when `SELECT` joins).
/// - `COLUMNS` lists the writable columns, key excluded, in the order
///   `bind_columns` binds them.
/// - When `AUTO_KEY` is false the key is bound first on insert.
pub trait TableMapping: for<'r> FromRow<'r, SqliteRow> + Send + Sync + Unpin {
    type Id: for<'q> Encode<'q, Sqlite> + Type<Sqlite> + Clone + fmt::Display + Send + Sync + 'static;

    /// Name used in log lines and `NotFound` errors.
    const ENTITY: &'static str;
    const TABLE: &'static str;
    const KEY: &'static str = "id";
    const KEY_EXPR: &'static str = "id";
    const SELECT: &'static str;
    const ORDER_BY: &'static str;
    const COLUMNS: &'static [&'static str];
    const AUTO_KEY: bool = true;

    fn key(&self) -> Self::Id;

    /// Key of a freshly inserted row.
    fn assigned_id(&self, rowid: i64) -> Self::Id;

    fn bind_columns<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q>;

    fn validate(&self) -> CoreResult<()> {
        Ok(())
    }

    /// Person ids this row points at. Each must exist before insert/update.
    fn person_refs(&self) -> Vec<&str> {
        Vec::new()
    }
}

// =============================================================================
// Generic Table Repository
// =============================================================================

/// [`Repository`] implementation for every entity that maps to one table.
pub struct TableRepository<E> {
    pool: SqlitePool,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for TableRepository<E> {
    fn clone(&self) -> Self {
        TableRepository {
            pool: self.pool.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: TableMapping> fmt::Debug for TableRepository<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableRepository")
            .field("table", &E::TABLE)
            .finish()
    }
}

impl<E: TableMapping> TableRepository<E> {
    pub fn new(pool: SqlitePool) -> Self {
        TableRepository {
            pool,
            _entity: PhantomData,
        }
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Runs `SELECT ... WHERE <condition>` with a single bound value.
    ///
    /// `condition` may reference the value more than once as `?1`.
    pub(crate) async fn find_where<V>(&self, condition: &str, value: V) -> DbResult<Vec<E>>
    where
        V: for<'q> Encode<'q, Sqlite> + Type<Sqlite> + Send + 'static,
    {
        let sql = format!("{} WHERE {} ORDER BY {}", E::SELECT, condition, E::ORDER_BY);
        let rows = sqlx::query_as::<_, E>(&sql)
            .bind(value)
            .fetch_all(&self.pool)
            .await?;

        debug!(entity = E::ENTITY, count = rows.len(), "Filtered rows loaded");
        Ok(rows)
    }

    async fn check_references(&self, entity: &E) -> DbResult<()> {
        entity.validate()?;
        for person_id in entity.person_refs() {
            ensure_person(&self.pool, person_id).await?;
        }
        Ok(())
    }

    fn insert_sql() -> String {
        let mut columns: Vec<&str> = Vec::with_capacity(E::COLUMNS.len() + 1);
        if !E::AUTO_KEY {
            columns.push(E::KEY);
        }
        columns.extend_from_slice(E::COLUMNS);

        let placeholders = vec!["?"; columns.len()].join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            E::TABLE,
            columns.join(", "),
            placeholders
        )
    }

    fn update_sql() -> String {
        let assignments = E::COLUMNS
            .iter()
            .map(|c| format!("{} = ?", c))
            .collect::<Vec<_>>()
            .join(", ");
        format!("UPDATE {} SET {} WHERE {} = ?", E::TABLE, assignments, E::KEY)
    }
}

impl<E: TableMapping> Repository<E> for TableRepository<E> {
    type Id = E::Id;

    async fn list_all(&self) -> DbResult<Vec<E>> {
        let sql = format!("{} ORDER BY {}", E::SELECT, E::ORDER_BY);
        let rows = sqlx::query_as::<_, E>(&sql).fetch_all(&self.pool).await?;

        debug!(entity = E::ENTITY, count = rows.len(), "Listed rows");
        Ok(rows)
    }

    async fn get_by_id(&self, id: &E::Id) -> DbResult<Option<E>> {
        debug!(entity = E::ENTITY, id = %id, "Getting by id");

        let sql = format!("{} WHERE {} = ?", E::SELECT, E::KEY_EXPR);
        let row = sqlx::query_as::<_, E>(&sql)
            .bind(id.clone())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn insert(&self, entity: &E) -> DbResult<E::Id> {
        self.check_references(entity).await?;

        let sql = Self::insert_sql();
        let mut query = sqlx::query(&sql);
        if !E::AUTO_KEY {
            query = query.bind(entity.key());
        }
        let result = entity.bind_columns(query).execute(&self.pool).await?;

        let id = entity.assigned_id(result.last_insert_rowid());
        debug!(entity = E::ENTITY, id = %id, "Inserted");
        Ok(id)
    }

    async fn update(&self, entity: &E) -> DbResult<bool> {
        self.check_references(entity).await?;

        let sql = Self::update_sql();
        let result = entity
            .bind_columns(sqlx::query(&sql))
            .bind(entity.key())
            .execute(&self.pool)
            .await?;

        let updated = result.rows_affected() > 0;
        debug!(entity = E::ENTITY, id = %entity.key(), updated, "Updated");
        Ok(updated)
    }

    async fn delete(&self, id: &E::Id) -> DbResult<bool> {
        let sql = format!("DELETE FROM {} WHERE {} = ?", E::TABLE, E::KEY);
        let result = sqlx::query(&sql)
            .bind(id.clone())
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        debug!(entity = E::ENTITY, id = %id, deleted, "Deleted");
        Ok(deleted)
    }
}

// =============================================================================
// Shared Helpers
// =============================================================================

/// Fails with [`CoreError::PersonNotFound`] unless `person_id` is a row in `people`.
pub(crate) async fn ensure_person<'e, X>(executor: X, person_id: &str) -> DbResult<()>
where
    X: Executor<'e, Database = Sqlite>,
{
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM people WHERE id = ?")
        .bind(person_id.to_string())
        .fetch_one(executor)
        .await?;

    if count == 0 {
        return Err(CoreError::PersonNotFound(person_id.to_string()).into());
    }
    Ok(())
}

/// `%term%` for a `LIKE ... ESCAPE '\'` match, with `%`, `_` and `\` in
/// `term` taken literally.
pub(crate) fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Commits on success, rolls back and logs on failure. The error is returned unchanged.
pub(crate) async fn finish<T>(
    tx: Transaction<'static, Sqlite>,
    result: DbResult<T>,
    operation: &'static str,
) -> DbResult<T> {
    match result {
        Ok(value) => {
            tx.commit()
                .await
                .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
            Ok(value)
        }
        Err(err) => {
            warn!(operation, error = %err, "Transaction rolled back");
            tx.rollback()
                .await
                .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
            Err(err)
        }
    }
}

/// Opens a transaction on `pool`.
pub(crate) async fn begin(pool: &SqlitePool) -> DbResult<Transaction<'static, Sqlite>> {
    pool.begin()
        .await
        .map_err(|e| DbError::TransactionFailed(e.to_string()))
}

// =============================================================================
// Test Fixtures
// =============================================================================

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::NaiveDate;
    use inventa_core::{Person, Product};

    use super::Repository;
    use crate::pool::{Database, DbConfig};

    pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub async fn database() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub fn person(id: &str, name: &str, person_type_id: i64) -> Person {
        Person {
            id: id.to_string(),
            name: name.to_string(),
            last_name: "Test".to_string(),
            email: format!("{}@example.com", id),
            document_type_id: 1,
            person_type_id,
            city_id: 1,
        }
    }

    pub fn product(id: &str, stock: i64, min: i64, max: i64) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {}", id),
            stock,
            stock_min: min,
            stock_max: max,
            created_at: day(2024, 1, 1),
            updated_at: day(2024, 1, 1),
            barcode: None,
        }
    }

    /// Database with customer `C1`, employee `E1`, supplier `S1` and products `P1`/`P2`.
    pub async fn seeded() -> Database {
        let db = database().await;
        db.people().insert(&person("C1", "Carla", 1)).await.unwrap();
        db.people().insert(&person("E1", "Elena", 2)).await.unwrap();
        db.people().insert(&person("S1", "Sergio", 3)).await.unwrap();
        db.products().insert(&product("P1", 20, 5, 100)).await.unwrap();
        db.products().insert(&product("P2", 8, 2, 50)).await.unwrap();
        db
    }
}
