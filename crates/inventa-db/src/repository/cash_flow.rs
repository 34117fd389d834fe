//! # Cash Flow Repository
//!
//! Cash register movements. Each row points at a movement type whose kind
//! (Entrada or Salida) decides the sign used in balances.

use chrono::NaiveDate;
use inventa_core::documents::balance;
use inventa_core::validation::validate_cash_flow;
use inventa_core::{CashFlow, Money, MovementType};
use sqlx::SqlitePool;
use tracing::debug;

use super::{ensure_person, Repository, TableRepository};
use crate::error::DbResult;

const SELECT_CASH_FLOW: &str = "SELECT f.id, f.date, f.movement_type_id, f.amount_cents, \
     f.concept, f.person_id, \
     m.name AS movement_type_name, m.kind AS movement_kind, \
     p.name || ' ' || p.last_name AS person_name \
     FROM cash_flows f \
     LEFT JOIN movement_types m ON m.id = f.movement_type_id \
     LEFT JOIN people p ON p.id = f.person_id";

#[derive(Debug, Clone)]
pub struct CashFlowRepository {
    pool: SqlitePool,
}

impl CashFlowRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CashFlowRepository { pool }
    }

    /// Movements of one day, in registration order.
    pub async fn list_on(&self, date: NaiveDate) -> DbResult<Vec<CashFlow>> {
        let sql = format!("{} WHERE f.date = ? ORDER BY f.id", SELECT_CASH_FLOW);
        let movements = sqlx::query_as::<_, CashFlow>(&sql)
            .bind(date)
            .fetch_all(&self.pool)
            .await?;

        debug!(%date, count = movements.len(), "Loaded day movements");
        Ok(movements)
    }

    /// Inflows minus outflows registered on `date`.
    pub async fn balance_on(&self, date: NaiveDate) -> DbResult<Money> {
        let movements = self.list_on(date).await?;
        Ok(balance(&movements))
    }

    /// The movement type catalog.
    pub async fn movement_types(&self) -> DbResult<Vec<MovementType>> {
        TableRepository::<MovementType>::new(self.pool.clone())
            .list_all()
            .await
    }
}

impl Repository<CashFlow> for CashFlowRepository {
    type Id = i64;

    async fn list_all(&self) -> DbResult<Vec<CashFlow>> {
        let sql = format!("{} ORDER BY f.date DESC, f.id DESC", SELECT_CASH_FLOW);
        let movements = sqlx::query_as::<_, CashFlow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = movements.len(), "Listed cash movements");
        Ok(movements)
    }

    async fn get_by_id(&self, id: &i64) -> DbResult<Option<CashFlow>> {
        let sql = format!("{} WHERE f.id = ?", SELECT_CASH_FLOW);
        let movement = sqlx::query_as::<_, CashFlow>(&sql)
            .bind(*id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(movement)
    }

    async fn insert(&self, movement: &CashFlow) -> DbResult<i64> {
        validate_cash_flow(movement)?;
        ensure_person(&self.pool, &movement.person_id).await?;

        let result = sqlx::query(
            "INSERT INTO cash_flows (date, movement_type_id, amount_cents, concept, person_id) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(movement.date)
        .bind(movement.movement_type_id)
        .bind(movement.amount_cents)
        .bind(&movement.concept)
        .bind(&movement.person_id)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!(id, amount = %movement.amount(), "Inserted cash movement");
        Ok(id)
    }

    async fn update(&self, movement: &CashFlow) -> DbResult<bool> {
        validate_cash_flow(movement)?;
        ensure_person(&self.pool, &movement.person_id).await?;

        let result = sqlx::query(
            "UPDATE cash_flows SET date = ?, movement_type_id = ?, amount_cents = ?, concept = ?, \
             person_id = ? WHERE id = ?",
        )
        .bind(movement.date)
        .bind(movement.movement_type_id)
        .bind(movement.amount_cents)
        .bind(&movement.concept)
        .bind(&movement.person_id)
        .bind(movement.id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: &i64) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM cash_flows WHERE id = ?")
            .bind(*id)
            .execute(&self.pool)
            .await?;

        debug!(id, "Deleted cash movement");
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use inventa_core::MovementKind;

    use super::*;
    use crate::error::DbError;
    use crate::repository::fixtures::{day, seeded};

    fn movement(type_id: i64, cents: i64, date: NaiveDate) -> CashFlow {
        CashFlow {
            id: 0,
            date,
            movement_type_id: type_id,
            amount_cents: cents,
            concept: "test".to_string(),
            person_id: "E1".to_string(),
            movement_type_name: None,
            movement_kind: None,
            person_name: None,
        }
    }

    #[tokio::test]
    async fn test_insert_joins_type_and_person() {
        let db = seeded().await;
        let id = db
            .cash_flows()
            .insert(&movement(1, 50_000, day(2024, 5, 1)))
            .await
            .unwrap();

        let loaded = db.cash_flows().get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(loaded.movement_type_name.as_deref(), Some("Venta"));
        assert_eq!(loaded.movement_kind, Some(MovementKind::Inflow));
        assert_eq!(loaded.person_name.as_deref(), Some("Elena Test"));
    }

    #[tokio::test]
    async fn test_balance_on_day() {
        let db = seeded().await;
        let may1 = day(2024, 5, 1);
        let may2 = day(2024, 5, 2);

        db.cash_flows().insert(&movement(1, 50_000, may1)).await.unwrap();
        db.cash_flows().insert(&movement(3, 2_000, may1)).await.unwrap();
        db.cash_flows().insert(&movement(4, 30_000, may1)).await.unwrap();
        db.cash_flows().insert(&movement(1, 99_999, may2)).await.unwrap();

        assert_eq!(db.cash_flows().balance_on(may1).await.unwrap().cents(), 22_000);
        assert_eq!(db.cash_flows().list_on(may1).await.unwrap().len(), 3);
        assert!(db
            .cash_flows()
            .balance_on(day(2024, 5, 3))
            .await
            .unwrap()
            .is_zero());
    }

    #[tokio::test]
    async fn test_invalid_amount_and_unknown_type() {
        let db = seeded().await;
        let err = db
            .cash_flows()
            .insert(&movement(1, 0, day(2024, 5, 1)))
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let err = db
            .cash_flows()
            .insert(&movement(42, 100, day(2024, 5, 1)))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = seeded().await;
        let id = db
            .cash_flows()
            .insert(&movement(6, 1_000, day(2024, 5, 1)))
            .await
            .unwrap();

        let mut m = db.cash_flows().get_by_id(&id).await.unwrap().unwrap();
        m.amount_cents = 1_500;
        assert!(db.cash_flows().update(&m).await.unwrap());
        assert_eq!(
            db.cash_flows().get_by_id(&id).await.unwrap().unwrap().amount_cents,
            1_500
        );

        assert!(db.cash_flows().delete(&id).await.unwrap());
        assert!(db.cash_flows().get_by_id(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_movement_types() {
        let db = seeded().await;
        let types = db.cash_flows().movement_types().await.unwrap();
        assert_eq!(types.len(), 6);
    }
}
