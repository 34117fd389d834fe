//! # Promotional Plan Repository
//!
//! Plans live in `promotional_plans`; the products they cover live in the
//! `plan_products` link table.
//!
//! ## Link Maintenance
//! ```text
//! insert:  INSERT plan                 → INSERT links
//! update:  UPDATE plan → DELETE links  → INSERT links   (replace, never diff)
//! delete:  DELETE links → DELETE plan
//! ```
//!
//! All three run inside one transaction each.

use chrono::{Local, NaiveDate};
use inventa_core::validation::validate_plan;
use inventa_core::{PlanProduct, PromotionalPlan};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use super::{begin, finish, Repository};
use crate::error::DbResult;

const SELECT_PLAN: &str =
    "SELECT id, name, start_date, end_date, discount_bps FROM promotional_plans";

#[derive(Debug, Clone)]
pub struct PlanRepository {
    pool: SqlitePool,
}

impl PlanRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PlanRepository { pool }
    }

    /// Products linked to a plan, with names.
    pub async fn products_for(&self, plan_id: i64) -> DbResult<Vec<PlanProduct>> {
        let products = sqlx::query_as::<_, PlanProduct>(
            "SELECT pp.product_id, p.name AS product_name \
             FROM plan_products pp LEFT JOIN products p ON p.id = pp.product_id \
             WHERE pp.plan_id = ? ORDER BY pp.product_id",
        )
        .bind(plan_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    /// Plans valid on `date`, products loaded.
    pub async fn current_on(&self, date: NaiveDate) -> DbResult<Vec<PromotionalPlan>> {
        let plans = self.list_all().await?;
        Ok(plans.into_iter().filter(|p| p.is_current_on(date)).collect())
    }

    /// Plans valid today.
    pub async fn current(&self) -> DbResult<Vec<PromotionalPlan>> {
        self.current_on(Local::now().date_naive()).await
    }

    async fn write_links(conn: &mut SqliteConnection, plan_id: i64, plan: &PromotionalPlan) -> DbResult<()> {
        for product in &plan.products {
            sqlx::query("INSERT OR IGNORE INTO plan_products (plan_id, product_id) VALUES (?, ?)")
                .bind(plan_id)
                .bind(&product.product_id)
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }

    async fn write_plan(conn: &mut SqliteConnection, plan: &PromotionalPlan) -> DbResult<i64> {
        let result = sqlx::query(
            "INSERT INTO promotional_plans (name, start_date, end_date, discount_bps) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(&plan.name)
        .bind(plan.start_date)
        .bind(plan.end_date)
        .bind(plan.discount)
        .execute(&mut *conn)
        .await?;

        let plan_id = result.last_insert_rowid();
        Self::write_links(conn, plan_id, plan).await?;
        Ok(plan_id)
    }

    async fn rewrite_plan(conn: &mut SqliteConnection, plan: &PromotionalPlan) -> DbResult<bool> {
        let result = sqlx::query(
            "UPDATE promotional_plans SET name = ?, start_date = ?, end_date = ?, discount_bps = ? \
             WHERE id = ?",
        )
        .bind(&plan.name)
        .bind(plan.start_date)
        .bind(plan.end_date)
        .bind(plan.discount)
        .bind(plan.id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        sqlx::query("DELETE FROM plan_products WHERE plan_id = ?")
            .bind(plan.id)
            .execute(&mut *conn)
            .await?;
        Self::write_links(conn, plan.id, plan).await?;
        Ok(true)
    }

    async fn delete_rows(conn: &mut SqliteConnection, plan_id: i64) -> DbResult<bool> {
        sqlx::query("DELETE FROM plan_products WHERE plan_id = ?")
            .bind(plan_id)
            .execute(&mut *conn)
            .await?;

        let result = sqlx::query("DELETE FROM promotional_plans WHERE id = ?")
            .bind(plan_id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

impl Repository<PromotionalPlan> for PlanRepository {
    type Id = i64;

    async fn list_all(&self) -> DbResult<Vec<PromotionalPlan>> {
        let sql = format!("{} ORDER BY start_date DESC, id DESC", SELECT_PLAN);
        let mut plans = sqlx::query_as::<_, PromotionalPlan>(&sql)
            .fetch_all(&self.pool)
            .await?;

        for plan in &mut plans {
            plan.products = self.products_for(plan.id).await?;
        }

        debug!(count = plans.len(), "Listed plans");
        Ok(plans)
    }

    async fn get_by_id(&self, id: &i64) -> DbResult<Option<PromotionalPlan>> {
        let sql = format!("{} WHERE id = ?", SELECT_PLAN);
        let plan = sqlx::query_as::<_, PromotionalPlan>(&sql)
            .bind(*id)
            .fetch_optional(&self.pool)
            .await?;

        match plan {
            Some(mut plan) => {
                plan.products = self.products_for(plan.id).await?;
                Ok(Some(plan))
            }
            None => Ok(None),
        }
    }

    async fn insert(&self, plan: &PromotionalPlan) -> DbResult<i64> {
        validate_plan(plan)?;

        let mut tx = begin(&self.pool).await?;
        let result = Self::write_plan(&mut tx, plan).await;
        let id = finish(tx, result, "create plan").await?;

        info!(id, name = %plan.name, products = plan.products.len(), "Plan created");
        Ok(id)
    }

    /// Rewrites the header and replaces every product link.
    async fn update(&self, plan: &PromotionalPlan) -> DbResult<bool> {
        validate_plan(plan)?;

        let mut tx = begin(&self.pool).await?;
        let result = Self::rewrite_plan(&mut tx, plan).await;
        let updated = finish(tx, result, "update plan").await?;

        debug!(id = plan.id, updated, "Updated plan");
        Ok(updated)
    }

    async fn delete(&self, id: &i64) -> DbResult<bool> {
        let mut tx = begin(&self.pool).await?;
        let result = Self::delete_rows(&mut tx, *id).await;
        let deleted = finish(tx, result, "delete plan").await?;

        debug!(id, deleted, "Deleted plan");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use inventa_core::plan::plan_discounts;
    use inventa_core::Percentage;

    use super::*;
    use crate::error::DbError;
    use crate::repository::fixtures::{day, seeded};

    fn plan(name: &str, start: NaiveDate, end: NaiveDate, bps: u32, products: &[&str]) -> PromotionalPlan {
        PromotionalPlan {
            id: 0,
            name: name.to_string(),
            start_date: start,
            end_date: end,
            discount: Percentage::from_bps(bps),
            products: products.iter().map(|p| PlanProduct::new(*p)).collect(),
        }
    }

    #[tokio::test]
    async fn test_insert_loads_products_with_names() {
        let db = seeded().await;
        let id = db
            .plans()
            .insert(&plan("Mayo", day(2024, 5, 1), day(2024, 5, 31), 1500, &["P1", "P2"]))
            .await
            .unwrap();

        let loaded = db.plans().get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Mayo");
        assert_eq!(loaded.discount, Percentage::from_bps(1500));
        assert_eq!(loaded.products.len(), 2);
        assert_eq!(loaded.products[0].product_name.as_deref(), Some("Product P1"));
    }

    #[tokio::test]
    async fn test_update_replaces_links() {
        let db = seeded().await;
        let id = db
            .plans()
            .insert(&plan("Mayo", day(2024, 5, 1), day(2024, 5, 31), 1500, &["P1", "P2"]))
            .await
            .unwrap();

        let mut p = db.plans().get_by_id(&id).await.unwrap().unwrap();
        p.products = vec![PlanProduct::new("P2")];
        p.discount = Percentage::from_bps(2000);
        assert!(db.plans().update(&p).await.unwrap());

        let loaded = db.plans().get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(loaded.discount.bps(), 2000);
        assert_eq!(loaded.products.len(), 1);
        assert_eq!(loaded.products[0].product_id, "P2");
    }

    #[tokio::test]
    async fn test_update_missing_plan_returns_false() {
        let db = seeded().await;
        let mut p = plan("Ghost", day(2024, 5, 1), day(2024, 5, 31), 0, &["P1"]);
        p.id = 404;
        assert!(!db.plans().update(&p).await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_product_rolls_back_plan() {
        let db = seeded().await;
        let err = db
            .plans()
            .insert(&plan("Bad", day(2024, 5, 1), day(2024, 5, 31), 500, &["P1", "NOPE"]))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
        assert!(db.plans().list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_inverted_dates_rejected() {
        let db = seeded().await;
        let err = db
            .plans()
            .insert(&plan("Bad", day(2024, 6, 1), day(2024, 5, 1), 500, &[]))
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_delete_removes_links_first() {
        let db = seeded().await;
        let id = db
            .plans()
            .insert(&plan("Mayo", day(2024, 5, 1), day(2024, 5, 31), 1500, &["P1"]))
            .await
            .unwrap();

        assert!(db.plans().delete(&id).await.unwrap());
        assert!(db.plans().get_by_id(&id).await.unwrap().is_none());
        assert!(db.plans().products_for(id).await.unwrap().is_empty());
        // The product itself is still there.
        assert!(db.products().get_by_id(&"P1".to_string()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_current_on_and_discount_lookup() {
        let db = seeded().await;
        db.plans()
            .insert(&plan("Mayo", day(2024, 5, 1), day(2024, 5, 31), 1000, &["P1", "P2"]))
            .await
            .unwrap();
        db.plans()
            .insert(&plan("Flash", day(2024, 5, 10), day(2024, 5, 10), 3000, &["P2"]))
            .await
            .unwrap();
        db.plans()
            .insert(&plan("Abril", day(2024, 4, 1), day(2024, 4, 30), 5000, &["P1"]))
            .await
            .unwrap();

        let current = db.plans().current_on(day(2024, 5, 10)).await.unwrap();
        assert_eq!(current.len(), 2);

        let discounts = plan_discounts(&current, day(2024, 5, 10));
        assert_eq!(discounts["P1"], Percentage::from_bps(1000));
        assert_eq!(discounts["P2"], Percentage::from_bps(3000));

        assert_eq!(db.plans().current_on(day(2024, 5, 11)).await.unwrap().len(), 1);
        assert!(db.plans().current_on(day(2024, 6, 1)).await.unwrap().is_empty());
    }
}
