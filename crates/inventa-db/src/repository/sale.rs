//! # Sale Repository
//!
//! Sales, their lines and invoice numbering.
//!
//! ## Registering a Sale
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │   1. allocate invoice number                                            │
//! │        open range?  → current + 1                                       │
//! │        none open    → new 1000-wide range after MAX(end_number),        │
//! │                       first number = its start                          │
//! │   2. INSERT sales header                                                │
//! │   3. for each line: INSERT sale_details, stock = stock - quantity       │
//! │   4. UPDATE invoice_ranges SET current_number WHERE id = <that range>   │
//! │   5. UPDATE customers SET last_purchase_date (if the person is one)     │
//! │  COMMIT            any error → ROLLBACK, nothing above is kept          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock is decremented without a floor. Callers that care check
//! availability before registering.

use chrono::{Local, NaiveDate};
use inventa_core::validation::{validate_sale, validate_sale_header};
use inventa_core::{CoreError, InvoiceRange, Sale, SaleDetail};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use super::{begin, ensure_person, finish, Repository};
use crate::error::DbResult;

const SELECT_SALE: &str = "SELECT s.invoice_id, s.date, s.customer_person_id, s.employee_person_id, \
     c.name || ' ' || c.last_name AS customer_name, \
     e.name || ' ' || e.last_name AS employee_name \
     FROM sales s \
     LEFT JOIN people c ON c.id = s.customer_person_id \
     LEFT JOIN people e ON e.id = s.employee_person_id";

const SELECT_OPEN_RANGE: &str = "SELECT id, resolution_date, start_number, end_number, current_number \
     FROM invoice_ranges WHERE current_number < end_number ORDER BY id DESC LIMIT 1";

/// Repository for sales.
///
/// ## Usage
/// ```rust,ignore
/// let mut sale = Sale::new(today, "C1", "E1");
/// sale.add_line("P1", 2, Money::from_cents(300));
/// let invoice = db.sales().insert(&sale).await?;
/// ```
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Lines of one sale with product names.
    pub async fn details_for(&self, invoice_id: i64) -> DbResult<Vec<SaleDetail>> {
        let details = sqlx::query_as::<_, SaleDetail>(
            "SELECT d.id, d.invoice_id, d.product_id, p.name AS product_name, d.quantity, d.cost_cents \
             FROM sale_details d LEFT JOIN products p ON p.id = d.product_id \
             WHERE d.invoice_id = ? ORDER BY d.id",
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(details)
    }

    /// The number the next registered sale will get. Nothing is consumed.
    pub async fn next_invoice_preview(&self) -> DbResult<i64> {
        let open = sqlx::query_as::<_, InvoiceRange>(SELECT_OPEN_RANGE)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(number) = open.and_then(|r| r.next_number()) {
            return Ok(number);
        }

        let last_end: Option<i64> = sqlx::query_scalar("SELECT MAX(end_number) FROM invoice_ranges")
            .fetch_one(&self.pool)
            .await?;
        Ok(InvoiceRange::following(last_end).0)
    }

    /// All invoice ranges, oldest first.
    pub async fn invoice_ranges(&self) -> DbResult<Vec<InvoiceRange>> {
        let ranges = sqlx::query_as::<_, InvoiceRange>(
            "SELECT id, resolution_date, start_number, end_number, current_number \
             FROM invoice_ranges ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(ranges)
    }

    /// Picks the next invoice number and returns it with the range that issued it.
    async fn allocate_invoice(conn: &mut SqliteConnection, today: NaiveDate) -> DbResult<(i64, i64)> {
        let open = sqlx::query_as::<_, InvoiceRange>(SELECT_OPEN_RANGE)
            .fetch_optional(&mut *conn)
            .await?;

        if let Some(range) = open {
            if let Some(number) = range.next_number() {
                return Ok((range.id, number));
            }
        }

        let last_end: Option<i64> = sqlx::query_scalar("SELECT MAX(end_number) FROM invoice_ranges")
            .fetch_one(&mut *conn)
            .await?;
        let (start, end) = InvoiceRange::following(last_end);

        let result = sqlx::query(
            "INSERT INTO invoice_ranges (resolution_date, start_number, end_number, current_number) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(today)
        .bind(start)
        .bind(end)
        .bind(start)
        .execute(&mut *conn)
        .await?;

        info!(start, end, "Opened new invoice range");
        Ok((result.last_insert_rowid(), start))
    }

    async fn write_sale(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<i64> {
        ensure_person(&mut *conn, &sale.customer_person_id).await?;
        ensure_person(&mut *conn, &sale.employee_person_id).await?;

        let today = Local::now().date_naive();
        let (range_id, invoice_id) = Self::allocate_invoice(&mut *conn, today).await?;

        sqlx::query(
            "INSERT INTO sales (invoice_id, date, customer_person_id, employee_person_id) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(invoice_id)
        .bind(sale.date)
        .bind(&sale.customer_person_id)
        .bind(&sale.employee_person_id)
        .execute(&mut *conn)
        .await?;

        for detail in &sale.details {
            sqlx::query(
                "INSERT INTO sale_details (invoice_id, product_id, quantity, cost_cents) \
                 VALUES (?, ?, ?, ?)",
            )
            .bind(invoice_id)
            .bind(&detail.product_id)
            .bind(detail.quantity)
            .bind(detail.cost_cents)
            .execute(&mut *conn)
            .await?;

            let updated =
                sqlx::query("UPDATE products SET stock = stock - ?, updated_at = ? WHERE id = ?")
                    .bind(detail.quantity)
                    .bind(today)
                    .bind(&detail.product_id)
                    .execute(&mut *conn)
                    .await?;
            if updated.rows_affected() == 0 {
                return Err(CoreError::ProductNotFound(detail.product_id.clone()).into());
            }
        }

        sqlx::query("UPDATE invoice_ranges SET current_number = ? WHERE id = ?")
            .bind(invoice_id)
            .bind(range_id)
            .execute(&mut *conn)
            .await?;

        sqlx::query("UPDATE customers SET last_purchase_date = ? WHERE person_id = ?")
            .bind(sale.date)
            .bind(&sale.customer_person_id)
            .execute(&mut *conn)
            .await?;

        Ok(invoice_id)
    }

    async fn delete_rows(conn: &mut SqliteConnection, invoice_id: i64) -> DbResult<bool> {
        sqlx::query("DELETE FROM sale_details WHERE invoice_id = ?")
            .bind(invoice_id)
            .execute(&mut *conn)
            .await?;

        let header = sqlx::query("DELETE FROM sales WHERE invoice_id = ?")
            .bind(invoice_id)
            .execute(&mut *conn)
            .await?;
        Ok(header.rows_affected() > 0)
    }
}

impl Repository<Sale> for SaleRepository {
    type Id = i64;

    /// Newest first. Lines are loaded per sale with a follow-up query.
    async fn list_all(&self) -> DbResult<Vec<Sale>> {
        let sql = format!("{} ORDER BY s.date DESC, s.invoice_id DESC", SELECT_SALE);
        let mut sales = sqlx::query_as::<_, Sale>(&sql)
            .fetch_all(&self.pool)
            .await?;

        for sale in &mut sales {
            sale.details = self.details_for(sale.invoice_id).await?;
        }

        debug!(count = sales.len(), "Listed sales");
        Ok(sales)
    }

    async fn get_by_id(&self, invoice_id: &i64) -> DbResult<Option<Sale>> {
        debug!(invoice_id, "Getting sale");

        let sql = format!("{} WHERE s.invoice_id = ?", SELECT_SALE);
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(*invoice_id)
            .fetch_optional(&self.pool)
            .await?;

        match sale {
            Some(mut sale) => {
                sale.details = self.details_for(sale.invoice_id).await?;
                Ok(Some(sale))
            }
            None => Ok(None),
        }
    }

    /// Registers a sale and returns its invoice number.
    ///
    /// The invoice number on `sale` is ignored; a fresh one is allocated.
    async fn insert(&self, sale: &Sale) -> DbResult<i64> {
        validate_sale(sale, Local::now().date_naive())?;
        debug!(
            customer = %sale.customer_person_id,
            lines = sale.details.len(),
            "Registering sale"
        );

        let mut tx = begin(&self.pool).await?;
        let result = Self::write_sale(&mut tx, sale).await;
        let invoice_id = finish(tx, result, "register sale").await?;

        info!(invoice_id, total = %sale.total(), "Sale registered");
        Ok(invoice_id)
    }

    /// Rewrites the header only. Lines and stock are left as they are.
    async fn update(&self, sale: &Sale) -> DbResult<bool> {
        validate_sale_header(sale, Local::now().date_naive())?;
        ensure_person(&self.pool, &sale.customer_person_id).await?;
        ensure_person(&self.pool, &sale.employee_person_id).await?;

        let result = sqlx::query(
            "UPDATE sales SET date = ?, customer_person_id = ?, employee_person_id = ? \
             WHERE invoice_id = ?",
        )
        .bind(sale.date)
        .bind(&sale.customer_person_id)
        .bind(&sale.employee_person_id)
        .bind(sale.invoice_id)
        .execute(&self.pool)
        .await?;

        let updated = result.rows_affected() > 0;
        debug!(invoice_id = sale.invoice_id, updated, "Updated sale header");
        Ok(updated)
    }

    /// Removes the lines, then the header. Stock is not restored.
    async fn delete(&self, invoice_id: &i64) -> DbResult<bool> {
        let invoice_id = *invoice_id;
        let mut tx = begin(&self.pool).await?;
        let result = Self::delete_rows(&mut tx, invoice_id).await;
        let deleted = finish(tx, result, "delete sale").await?;
        debug!(invoice_id, deleted, "Deleted sale");
        Ok(deleted)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use inventa_core::{Customer, Money};

    use super::*;
    use crate::error::DbError;
    use crate::repository::fixtures::{day, seeded};

    fn sale_of(lines: &[(&str, i64, i64)]) -> Sale {
        let mut sale = Sale::new(day(2024, 5, 10), "C1", "E1");
        for (product, qty, cents) in lines {
            sale.add_line(*product, *qty, Money::from_cents(*cents));
        }
        sale
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
    async fn test_first_sale_gets_first_invoice_number() {
        let db = seeded().await;
        assert_eq!(db.sales().next_invoice_preview().await.unwrap(), 1000);

        let id = db.sales().insert(&sale_of(&[("P1", 2, 300)])).await.unwrap();
        assert_eq!(id, 1000);
        assert_eq!(db.sales().next_invoice_preview().await.unwrap(), 1001);
    }

    #[tokio::test]
    async fn test_invoice_numbers_strictly_increase() {
        let db = seeded().await;
        let mut last = 0;
        for _ in 0..5 {
            let id = db.sales().insert(&sale_of(&[("P1", 1, 100)])).await.unwrap();
            assert!(id > last);
            last = id;
        }
        assert_eq!(last, 1004);

        let ranges = db.sales().invoice_ranges().await.unwrap();
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].current_number, 1004);
    }

    #[tokio::test]
    async fn test_exhausted_range_rolls_into_next() {
        let db = seeded().await;
        sqlx::query(
            "INSERT INTO invoice_ranges (resolution_date, start_number, end_number, current_number) \
             VALUES ('2024-01-01', 1000, 1999, 1998)",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let a = db.sales().insert(&sale_of(&[("P1", 1, 100)])).await.unwrap();
        let b = db.sales().insert(&sale_of(&[("P1", 1, 100)])).await.unwrap();
        let c = db.sales().insert(&sale_of(&[("P1", 1, 100)])).await.unwrap();
        assert_eq!((a, b, c), (1999, 2000, 2001));

        let ranges = db.sales().invoice_ranges().await.unwrap();
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[1].start_number, 2000);
        assert_eq!(ranges[1].end_number, 2999);
        assert_eq!(ranges[0].current_number, 1999);
    }

    #[tokio::test]
    async fn test_sale_decrements_stock_and_round_trips() {
        let db = seeded().await;
        let sale = sale_of(&[("P1", 3, 250), ("P2", 1, 1000)]);

        let id = db.sales().insert(&sale).await.unwrap();
        assert_eq!(stock_of(&db, "P1").await, 17);
        assert_eq!(stock_of(&db, "P2").await, 7);

        let loaded = db.sales().get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(loaded.date, sale.date);
        assert_eq!(loaded.customer_name.as_deref(), Some("Carla Test"));
        assert_eq!(loaded.details.len(), 2);
        assert_eq!(loaded.details[0].product_name.as_deref(), Some("Product P1"));
        assert_eq!(loaded.total(), sale.total());
        assert_eq!(loaded.total().cents(), 1750);
    }

    #[tokio::test]
    async fn test_stock_may_go_negative() {
        let db = seeded().await;
        db.sales().insert(&sale_of(&[("P2", 10, 100)])).await.unwrap();
        assert_eq!(stock_of(&db, "P2").await, -2);
    }

    #[tokio::test]
    async fn test_customer_last_purchase_date_tracked() {
        let db = seeded().await;
        let customer = Customer {
            id: 0,
            person_id: "C1".to_string(),
            birth_date: day(1990, 1, 1),
            last_purchase_date: None,
            person_name: None,
        };
        db.customers().insert(&customer).await.unwrap();

        db.sales().insert(&sale_of(&[("P1", 1, 100)])).await.unwrap();

        let customer = db.customers().get_by_person("C1").await.unwrap().unwrap();
        assert_eq!(customer.last_purchase_date, Some(day(2024, 5, 10)));
    }

    #[tokio::test]
    async fn test_future_sale_rejected_and_customer_untouched() {
        let db = seeded().await;
        let customer = Customer {
            id: 0,
            person_id: "C1".to_string(),
            birth_date: day(1990, 1, 1),
            last_purchase_date: None,
            person_name: None,
        };
        db.customers().insert(&customer).await.unwrap();

        let mut sale = sale_of(&[("P1", 1, 100)]);
        sale.date = Local::now().date_naive() + chrono::Duration::days(1);
        assert!(db.sales().insert(&sale).await.unwrap_err().is_validation());

        assert_eq!(stock_of(&db, "P1").await, 20);
        assert_eq!(db.sales().next_invoice_preview().await.unwrap(), 1000);
        let mut customer = db.customers().get_by_person("C1").await.unwrap().unwrap();
        assert_eq!(customer.last_purchase_date, None);
        customer.birth_date = day(1991, 1, 1);
        assert!(db.customers().update(&customer).await.unwrap());
    }

    #[tokio::test]
    async fn test_sale_header_cannot_move_to_future() {
        let db = seeded().await;
        let id = db.sales().insert(&sale_of(&[("P1", 1, 100)])).await.unwrap();

        let mut sale = db.sales().get_by_id(&id).await.unwrap().unwrap();
        sale.date = Local::now().date_naive() + chrono::Duration::days(30);
        assert!(db.sales().update(&sale).await.unwrap_err().is_validation());
        assert_eq!(
            db.sales().get_by_id(&id).await.unwrap().unwrap().date,
            day(2024, 5, 10)
        );
    }

    #[tokio::test]
    async fn test_overflowing_sale_rejected() {
        let db = seeded().await;
        let sale = sale_of(&[("P1", 10, 10_000_000_000_000_000)]);
        assert!(db.sales().insert(&sale).await.unwrap_err().is_validation());
        assert_eq!(stock_of(&db, "P1").await, 20);
    }

    #[tokio::test]
    async fn test_unknown_product_rolls_everything_back() {
        let db = seeded().await;
        let sale = sale_of(&[("P1", 2, 100), ("NOPE", 1, 100)]);

        let err = db.sales().insert(&sale).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));

        assert_eq!(stock_of(&db, "P1").await, 20);
        assert!(db.sales().list_all().await.unwrap().is_empty());
        assert!(db.sales().invoice_ranges().await.unwrap().is_empty());
        assert_eq!(db.sales().next_invoice_preview().await.unwrap(), 1000);
    }

    #[tokio::test]
    async fn test_unknown_customer_rejected() {
        let db = seeded().await;
        let mut sale = sale_of(&[("P1", 1, 100)]);
        sale.customer_person_id = "GHOST".to_string();

        let err = db.sales().insert(&sale).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Validation(CoreError::PersonNotFound(_))
        ));
        assert_eq!(stock_of(&db, "P1").await, 20);
    }

    #[tokio::test]
    async fn test_empty_sale_rejected() {
        let db = seeded().await;
        let err = db.sales().insert(&sale_of(&[])).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_update_header_only() {
        let db = seeded().await;
        let id = db.sales().insert(&sale_of(&[("P1", 2, 100)])).await.unwrap();

        let mut sale = db.sales().get_by_id(&id).await.unwrap().unwrap();
        sale.date = day(2024, 6, 1);
        sale.details.clear();
        assert!(db.sales().update(&sale).await.unwrap());

        let loaded = db.sales().get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(loaded.date, day(2024, 6, 1));
        assert_eq!(loaded.details.len(), 1);
        assert_eq!(stock_of(&db, "P1").await, 18);
    }

    #[tokio::test]
    async fn test_delete_then_get() {
        let db = seeded().await;
        let id = db.sales().insert(&sale_of(&[("P1", 2, 100)])).await.unwrap();

        assert!(db.sales().delete(&id).await.unwrap());
        assert!(db.sales().get_by_id(&id).await.unwrap().is_none());
        assert!(db.sales().details_for(id).await.unwrap().is_empty());
        // Stock is not restored.
        assert_eq!(stock_of(&db, "P1").await, 18);

        assert!(!db.sales().delete(&id).await.unwrap());
        // Deleted numbers are never reissued.
        assert_eq!(db.sales().next_invoice_preview().await.unwrap(), id + 1);
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let db = seeded().await;
        let mut older = sale_of(&[("P1", 1, 100)]);
        older.date = day(2024, 1, 1);
        db.sales().insert(&older).await.unwrap();
        db.sales().insert(&sale_of(&[("P2", 1, 100)])).await.unwrap();

        let sales = db.sales().list_all().await.unwrap();
        assert_eq!(sales.len(), 2);
        assert_eq!(sales[0].date, day(2024, 5, 10));
        assert_eq!(sales[0].details[0].product_id, "P2");
    }
}
