//! PostgreSQL implementation of [`PlanStore`].

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use plancraft_db::models::{Item, Plan, Resource};
use plancraft_db::queries::items::{self, NewItem};
use plancraft_db::queries::plans::{self, NewPlan};
use plancraft_db::queries::resources::{self, NewResource};

use super::trait_def::{PlanStore, PlanTransaction, StoreError};

/// [`PlanStore`] backed by a sqlx connection pool.
#[derive(Debug, Clone)]
pub struct PgPlanStore {
    pool: PgPool,
}

impl PgPlanStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl PlanStore for PgPlanStore {
    async fn begin(&self) -> Result<Box<dyn PlanTransaction>, StoreError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Backend(Box::new(e)))?;
        Ok(Box::new(PgPlanTransaction { tx }))
    }
}

/// A live database transaction. sqlx rolls back on drop.
struct PgPlanTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl PlanTransaction for PgPlanTransaction {
    async fn insert_plan(&mut self, new: &NewPlan<'_>) -> Result<Plan, StoreError> {
        plans::insert_plan(&mut *self.tx, new)
            .await
            .map_err(StoreError::classify)
    }

    async fn insert_item(&mut self, new: &NewItem<'_>) -> Result<Item, StoreError> {
        items::insert_item(&mut *self.tx, new)
            .await
            .map_err(StoreError::classify)
    }

    async fn insert_resource(&mut self, new: &NewResource<'_>) -> Result<Resource, StoreError> {
        resources::insert_resource(&mut *self.tx, new)
            .await
            .map_err(StoreError::classify)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx
            .commit()
            .await
            .map_err(|e| StoreError::Backend(Box::new(e)))
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| StoreError::Backend(Box::new(e)))
    }
}
