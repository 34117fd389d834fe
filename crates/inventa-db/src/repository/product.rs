//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - CRUD through the generic [`Repository`](super::Repository) contract
//! - Search by id, name or barcode
//! - Stock adjustments
//! - Low-stock listing
//!
//! ## Low Stock
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  products WHERE stock <= stock_min ORDER BY stock ASC                   │
//! │                                                                         │
//! │   P9   stock -2   min 5   → CRÍTICO   (sales can overdraw stock)        │
//! │   P4   stock  0   min 10  → CRÍTICO                                     │
//! │   P1   stock  5   min 10  → BAJO                                        │
//! │                                                                         │
//! │  Severity comes from StockStatus::classify, not from SQL.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Local;
use inventa_core::validation::validate_product;
use inventa_core::{CoreError, CoreResult, Product};
use tracing::debug;

use super::{contains_pattern, SqliteQuery, TableMapping, TableRepository};
use crate::error::DbResult;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let matches = repo.search("arroz").await?;
/// repo.update_stock("P1", -3).await?;
/// let low = repo.low_stock().await?;
/// ```
pub type ProductRepository = TableRepository<Product>;

impl TableMapping for Product {
    type Id = String;

    const ENTITY: &'static str = "Product";
    const TABLE: &'static str = "products";
    const SELECT: &'static str = "SELECT id, name, stock, stock_min, stock_max, \
                                  created_at, updated_at, barcode FROM products";
    const ORDER_BY: &'static str = "name, id";
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "stock",
        "stock_min",
        "stock_max",
        "created_at",
        "updated_at",
        "barcode",
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
            .bind(self.stock)
            .bind(self.stock_min)
            .bind(self.stock_max)
            .bind(self.created_at)
            .bind(self.updated_at)
            .bind(&self.barcode)
    }

    fn validate(&self) -> CoreResult<()> {
        validate_product(self).map_err(CoreError::from)
    }
}

impl TableRepository<Product> {
    /// Products whose id, name or barcode contains `term`.
    ///
    /// An empty term lists everything.
    pub async fn search(&self, term: &str) -> DbResult<Vec<Product>> {
        let term = term.trim();
        debug!(term = %term, "Searching products");

        self.find_where(
            "id LIKE ?1 ESCAPE '\\' OR name LIKE ?1 ESCAPE '\\' OR barcode LIKE ?1 ESCAPE '\\'",
            contains_pattern(term),
        )
        .await
    }

    /// Adds `delta` (negative to remove) to a product's stock and stamps `updated_at`.
    ///
    /// Stock is not floored at zero. Returns `false` if the product does not exist.
    pub async fn update_stock(&self, id: &str, delta: i64) -> DbResult<bool> {
        debug!(id = %id, delta, "Adjusting stock");

        let result =
            sqlx::query("UPDATE products SET stock = stock + ?, updated_at = ? WHERE id = ?")
                .bind(delta)
                .bind(Local::now().date_naive())
                .bind(id)
                .execute(self.pool())
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Products at or below their minimum, emptiest first.
    pub async fn low_stock(&self) -> DbResult<Vec<Product>> {
        let sql = format!(
            "{} WHERE stock <= stock_min ORDER BY stock ASC, id",
            Product::SELECT
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(self.pool())
            .await?;

        debug!(count = products.len(), "Low stock products loaded");
        Ok(products)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use inventa_core::StockStatus;

    use super::*;
    use crate::error::DbError;
    use crate::repository::fixtures::{database, product};
    use crate::repository::Repository;

    #[tokio::test]
    async fn test_insert_and_get_round_trip() {
        let db = database().await;
        let mut p = product("P1", 5, 10, 100);
        p.barcode = Some("7701234567890".to_string());

        let id = db.products().insert(&p).await.unwrap();
        assert_eq!(id, "P1");

        let loaded = db.products().get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(loaded, p);
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let db = database().await;
        db.products().insert(&product("P1", 5, 1, 10)).await.unwrap();

        let err = db
            .products()
            .insert(&product("P1", 9, 1, 10))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_invalid_thresholds_rejected_before_sql() {
        let db = database().await;
        let err = db
            .products()
            .insert(&product("P1", 5, 50, 10))
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(db.products().list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = database().await;
        let mut p = product("P1", 5, 1, 10);
        db.products().insert(&p).await.unwrap();

        p.name = "Renamed".to_string();
        assert!(db.products().update(&p).await.unwrap());
        assert_eq!(
            db.products().get_by_id(&"P1".to_string()).await.unwrap().unwrap().name,
            "Renamed"
        );

        assert!(db.products().delete(&"P1".to_string()).await.unwrap());
        assert!(db.products().get_by_id(&"P1".to_string()).await.unwrap().is_none());
        assert!(!db.products().delete(&"P1".to_string()).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_missing_returns_false() {
        let db = database().await;
        assert!(!db.products().update(&product("NOPE", 1, 0, 5)).await.unwrap());
    }

    #[tokio::test]
    async fn test_search() {
        let db = database().await;
        let mut rice = product("A-100", 5, 1, 10);
        rice.name = "Arroz 500g".to_string();
        let mut beans = product("B-200", 5, 1, 10);
        beans.name = "Frijol".to_string();
        beans.barcode = Some("999111".to_string());
        db.products().insert(&rice).await.unwrap();
        db.products().insert(&beans).await.unwrap();

        let by_name = db.products().search("arroz").await.unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].id, "A-100");

        let by_barcode = db.products().search("9111").await.unwrap();
        assert_eq!(by_barcode[0].id, "B-200");

        assert_eq!(db.products().search("").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_search_wildcards_match_literally() {
        let db = database().await;
        let mut rice = product("A-100", 5, 1, 10);
        rice.name = "Arroz 500g".to_string();
        let mut promo = product("B_200", 5, 1, 10);
        promo.name = "Frijol 20% extra".to_string();
        db.products().insert(&rice).await.unwrap();
        db.products().insert(&promo).await.unwrap();

        let underscore = db.products().search("_").await.unwrap();
        assert_eq!(underscore.len(), 1);
        assert_eq!(underscore[0].id, "B_200");

        let percent = db.products().search("%").await.unwrap();
        assert_eq!(percent.len(), 1);
        assert_eq!(percent[0].id, "B_200");

        assert!(db.products().search("\\").await.unwrap().is_empty());
    }

    #[test]
    fn test_contains_pattern_escapes() {
        assert_eq!(contains_pattern("arroz"), "%arroz%");
        assert_eq!(contains_pattern("20%_off"), "%20\\%\\_off%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
        assert_eq!(contains_pattern(""), "%%");
    }

    #[tokio::test]
    async fn test_update_stock_can_go_negative() {
        let db = database().await;
        db.products().insert(&product("P1", 2, 1, 10)).await.unwrap();

        assert!(db.products().update_stock("P1", -5).await.unwrap());
        let p = db.products().get_by_id(&"P1".to_string()).await.unwrap().unwrap();
        assert_eq!(p.stock, -3);
        assert_eq!(p.stock_status(), StockStatus::Critical);

        assert!(!db.products().update_stock("MISSING", 1).await.unwrap());
    }

    #[tokio::test]
    async fn test_low_stock_reclassifies() {
        let db = database().await;
        db.products().insert(&product("P1", 5, 10, 100)).await.unwrap();
        db.products().insert(&product("P2", 50, 10, 100)).await.unwrap();

        let low = db.products().low_stock().await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].id, "P1");
        assert_eq!(low[0].stock_status().label(), "BAJO");

        let mut p1 = low[0].clone();
        p1.stock = 0;
        db.products().update(&p1).await.unwrap();

        let low = db.products().low_stock().await.unwrap();
        assert_eq!(low[0].stock_status().label(), "CRÍTICO");
    }

    #[tokio::test]
    async fn test_low_stock_includes_boundary() {
        let db = database().await;
        db.products().insert(&product("P1", 10, 10, 100)).await.unwrap();
        let low = db.products().low_stock().await.unwrap();
        assert_eq!(low.len(), 1);
    }
}
