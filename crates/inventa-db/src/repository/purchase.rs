//! # Purchase Repository
//!
//! Purchases from suppliers. Registering one restocks every product on it.
//!
//! ```text
//! BEGIN
//!   INSERT purchases header                       → purchase id
//!   for each line:
//!     INSERT purchase_details (date = purchase date)
//!     UPDATE products SET stock = stock + quantity
//! COMMIT
//! ```

use chrono::Local;
use inventa_core::validation::{validate_purchase, validate_purchase_header};
use inventa_core::{CoreError, Purchase, PurchaseDetail};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use super::{begin, ensure_person, finish, Repository};
use crate::error::DbResult;

const SELECT_PURCHASE: &str = "SELECT pu.id, pu.supplier_person_id, pu.employee_person_id, pu.date, \
     pu.order_number, \
     s.name || ' ' || s.last_name AS supplier_name, \
     e.name || ' ' || e.last_name AS employee_name \
     FROM purchases pu \
     LEFT JOIN people s ON s.id = pu.supplier_person_id \
     LEFT JOIN people e ON e.id = pu.employee_person_id";

/// Repository for purchases.
#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    /// Creates a new PurchaseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    pub async fn details_for(&self, purchase_id: i64) -> DbResult<Vec<PurchaseDetail>> {
        let details = sqlx::query_as::<_, PurchaseDetail>(
            "SELECT d.id, d.purchase_id, d.date, d.product_id, p.name AS product_name, \
             d.quantity, d.cost_cents \
             FROM purchase_details d LEFT JOIN products p ON p.id = d.product_id \
             WHERE d.purchase_id = ? ORDER BY d.id",
        )
        .bind(purchase_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(details)
    }

    async fn write_purchase(conn: &mut SqliteConnection, purchase: &Purchase) -> DbResult<i64> {
        ensure_person(&mut *conn, &purchase.supplier_person_id).await?;
        ensure_person(&mut *conn, &purchase.employee_person_id).await?;

        let header = sqlx::query(
            "INSERT INTO purchases (supplier_person_id, employee_person_id, date, order_number) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(&purchase.supplier_person_id)
        .bind(&purchase.employee_person_id)
        .bind(purchase.date)
        .bind(&purchase.order_number)
        .execute(&mut *conn)
        .await?;
        let purchase_id = header.last_insert_rowid();

        let today = Local::now().date_naive();
        for detail in &purchase.details {
            sqlx::query(
                "INSERT INTO purchase_details (purchase_id, date, product_id, quantity, cost_cents) \
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(purchase_id)
            .bind(purchase.date)
            .bind(&detail.product_id)
            .bind(detail.quantity)
            .bind(detail.cost_cents)
            .execute(&mut *conn)
            .await?;

            let updated =
                sqlx::query("UPDATE products SET stock = stock + ?, updated_at = ? WHERE id = ?")
                    .bind(detail.quantity)
                    .bind(today)
                    .bind(&detail.product_id)
                    .execute(&mut *conn)
                    .await?;
            if updated.rows_affected() == 0 {
                return Err(CoreError::ProductNotFound(detail.product_id.clone()).into());
            }
        }

        Ok(purchase_id)
    }

    async fn delete_rows(conn: &mut SqliteConnection, purchase_id: i64) -> DbResult<bool> {
        sqlx::query("DELETE FROM purchase_details WHERE purchase_id = ?")
            .bind(purchase_id)
            .execute(&mut *conn)
            .await?;

        let header = sqlx::query("DELETE FROM purchases WHERE id = ?")
            .bind(purchase_id)
            .execute(&mut *conn)
            .await?;
        Ok(header.rows_affected() > 0)
    }
}

impl Repository<Purchase> for PurchaseRepository {
    type Id = i64;

    async fn list_all(&self) -> DbResult<Vec<Purchase>> {
        let sql = format!("{} ORDER BY pu.date DESC, pu.id DESC", SELECT_PURCHASE);
        let mut purchases = sqlx::query_as::<_, Purchase>(&sql)
            .fetch_all(&self.pool)
            .await?;

        for purchase in &mut purchases {
            purchase.details = self.details_for(purchase.id).await?;
        }

        debug!(count = purchases.len(), "Listed purchases");
        Ok(purchases)
    }

    async fn get_by_id(&self, id: &i64) -> DbResult<Option<Purchase>> {
        debug!(id, "Getting purchase");

        let sql = format!("{} WHERE pu.id = ?", SELECT_PURCHASE);
        let purchase = sqlx::query_as::<_, Purchase>(&sql)
            .bind(*id)
            .fetch_optional(&self.pool)
            .await?;

        match purchase {
            Some(mut purchase) => {
                purchase.details = self.details_for(purchase.id).await?;
                Ok(Some(purchase))
            }
            None => Ok(None),
        }
    }

    /// Registers the purchase and restocks its products. Returns the purchase id.
    async fn insert(&self, purchase: &Purchase) -> DbResult<i64> {
        validate_purchase(purchase, Local::now().date_naive())?;
        debug!(
            supplier = %purchase.supplier_person_id,
            lines = purchase.details.len(),
            "Registering purchase"
        );

        let mut tx = begin(&self.pool).await?;
        let result = Self::write_purchase(&mut tx, purchase).await;
        let id = finish(tx, result, "register purchase").await?;

        info!(id, total = %purchase.total(), "Purchase registered");
        Ok(id)
    }

    /// Rewrites the header only.
    async fn update(&self, purchase: &Purchase) -> DbResult<bool> {
        validate_purchase_header(purchase, Local::now().date_naive())?;
        ensure_person(&self.pool, &purchase.supplier_person_id).await?;
        ensure_person(&self.pool, &purchase.employee_person_id).await?;

        let result = sqlx::query(
            "UPDATE purchases SET supplier_person_id = ?, employee_person_id = ?, date = ?, \
             order_number = ? WHERE id = ?",
        )
        .bind(&purchase.supplier_person_id)
        .bind(&purchase.employee_person_id)
        .bind(purchase.date)
        .bind(&purchase.order_number)
        .bind(purchase.id)
        .execute(&self.pool)
        .await?;

        let updated = result.rows_affected() > 0;
        debug!(id = purchase.id, updated, "Updated purchase header");
        Ok(updated)
    }

    /// Removes the lines, then the header. Stock is left as it is.
    async fn delete(&self, id: &i64) -> DbResult<bool> {
        let mut tx = begin(&self.pool).await?;
        let result = Self::delete_rows(&mut tx, *id).await;
        let deleted = finish(tx, result, "delete purchase").await?;

        debug!(id, deleted, "Deleted purchase");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use inventa_core::Money;

    use super::*;
    use crate::error::DbError;
    use crate::repository::fixtures::{day, seeded};

    fn purchase_of(lines: &[(&str, i64, i64)]) -> Purchase {
        let mut purchase = Purchase::new(day(2024, 4, 2), "S1", "E1", "OC-1");
        for (product, qty, cents) in lines {
            purchase.add_line(*product, *qty, Money::from_cents(*cents));
        }
        purchase
    }

    async fn stock_of(db: &crate::Database, id: &str) -> i64 {
        db.products()
            .get_by_id(&id.to_string())
            .await
            .unwrap()
            .unwrap()
            .stock
    }

    #[tokio::test]
    async fn test_future_or_overflowing_purchase_rejected() {
        let db = seeded().await;

        let mut purchase = purchase_of(&[("P1", 10, 150)]);
        purchase.date = Local::now().date_naive() + chrono::Duration::days(1);
        assert!(db.purchases().insert(&purchase).await.unwrap_err().is_validation());

        let purchase = purchase_of(&[("P2", 10, 10_000_000_000_000_000)]);
        assert!(db.purchases().insert(&purchase).await.unwrap_err().is_validation());

        assert_eq!(stock_of(&db, "P1").await, 20);
        assert_eq!(stock_of(&db, "P2").await, 3);
        assert!(db.purchases().list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_purchase_restocks_and_round_trips() {
        let db = seeded().await;
        let purchase = purchase_of(&[("P1", 10, 150), ("P2", 4, 900)]);

        let id = db.purchases().insert(&purchase).await.unwrap();
        assert_eq!(stock_of(&db, "P1").await, 30);
        assert_eq!(stock_of(&db, "P2").await, 12);

        let loaded = db.purchases().get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(loaded.order_number, "OC-1");
        assert_eq!(loaded.supplier_name.as_deref(), Some("Sergio Test"));
        assert_eq!(loaded.total().cents(), 5100);
        assert!(loaded.details.iter().all(|d| d.date == purchase.date));
    }

    #[tokio::test]
    async fn test_unknown_supplier_rejected() {
        let db = seeded().await;
        let mut purchase = purchase_of(&[("P1", 1, 100)]);
        purchase.supplier_person_id = "GHOST".to_string();

        let err = db.purchases().insert(&purchase).await.unwrap_err();
        assert!(matches!(err, DbError::Validation(CoreError::PersonNotFound(_))));
    }

    #[tokio::test]
    async fn test_failed_line_rolls_back_restock() {
        let db = seeded().await;
        let purchase = purchase_of(&[("P1", 10, 150), ("NOPE", 1, 100)]);

        assert!(db.purchases().insert(&purchase).await.is_err());
        assert_eq!(stock_of(&db, "P1").await, 20);
        assert!(db.purchases().list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_header_and_delete() {
        let db = seeded().await;
        let id = db
            .purchases()
            .insert(&purchase_of(&[("P1", 5, 100)]))
            .await
            .unwrap();

        let mut purchase = db.purchases().get_by_id(&id).await.unwrap().unwrap();
        purchase.order_number = "OC-2".to_string();
        assert!(db.purchases().update(&purchase).await.unwrap());
        assert_eq!(
            db.purchases().get_by_id(&id).await.unwrap().unwrap().order_number,
            "OC-2"
        );

        assert!(db.purchases().delete(&id).await.unwrap());
        assert!(db.purchases().get_by_id(&id).await.unwrap().is_none());
        assert!(db.purchases().details_for(id).await.unwrap().is_empty());
        assert_eq!(stock_of(&db, "P1").await, 25);
    }
}
