//! The `PlanStore` / `PlanTransaction` traits.
//!
//! Both traits are object-safe so the generator can take `&dyn PlanStore`.

use async_trait::async_trait;
use thiserror::Error;

use plancraft_db::models::{Item, Plan, Resource};
use plancraft_db::queries::items::NewItem;
use plancraft_db::queries::plans::NewPlan;
use plancraft_db::queries::resources::NewResource;

/// Failure reported by a store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness, foreign-key, check, or not-null constraint rejected a row.
    #[error("constraint violation: {message}")]
    Conflict {
        message: String,
        constraint: Option<String>,
    },

    /// Any other backend failure (connection, protocol, decoding).
    #[error("store backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    /// Classify an error returned by a `plancraft_db` query function.
    ///
    /// Constraint violations reported by PostgreSQL become
    /// [`StoreError::Conflict`]; everything else is [`StoreError::Backend`].
    pub fn classify(err: anyhow::Error) -> Self {
        use sqlx::error::ErrorKind;

        if let Some(sqlx::Error::Database(db_err)) = err.downcast_ref::<sqlx::Error>() {
            match db_err.kind() {
                ErrorKind::UniqueViolation
                | ErrorKind::ForeignKeyViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation => {
                    return Self::Conflict {
                        message: db_err.message().to_owned(),
                        constraint: db_err.constraint().map(str::to_owned),
                    };
                }
                _ => {}
            }
        }
        Self::Backend(err.into())
    }
}

/// Opens write transactions.
#[async_trait]
pub trait PlanStore: Send + Sync {
    /// Begin a new unit of work.
    async fn begin(&self) -> Result<Box<dyn PlanTransaction>, StoreError>;
}

/// One all-or-nothing unit of work.
///
/// Dropping a transaction without calling [`PlanTransaction::commit`] must
/// discard its writes.
#[async_trait]
pub trait PlanTransaction: Send {
    async fn insert_plan(&mut self, new: &NewPlan<'_>) -> Result<Plan, StoreError>;

    async fn insert_item(&mut self, new: &NewItem<'_>) -> Result<Item, StoreError>;

    async fn insert_resource(&mut self, new: &NewResource<'_>) -> Result<Resource, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

// Compile-time assertion: both traits must be usable as trait objects.
const _: () = {
    fn _assert_object_safe(_: &dyn PlanStore, _: &dyn PlanTransaction) {}
};
