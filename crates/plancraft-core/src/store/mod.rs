//! Transactional persistence seam for generated plans.
//!
//! [`PlanStore`] opens a [`PlanTransaction`]; the transaction exposes one
//! insert per entity plus `commit`/`rollback`. [`PgPlanStore`] is the
//! PostgreSQL implementation; tests substitute in-memory stores.

pub mod postgres;
pub mod trait_def;

use serde::Serialize;

use plancraft_db::models::{Item, Plan, Resource};

pub use postgres::PgPlanStore;
pub use trait_def::{PlanStore, PlanTransaction, StoreError};

/// A stored plan with its items and their resources, in plan order.
#[derive(Debug, Clone, Serialize)]
pub struct PersistedPlan {
    #[serde(flatten)]
    pub plan: Plan,
    pub items: Vec<PersistedItem>,
}

/// A stored item with its resources.
#[derive(Debug, Clone, Serialize)]
pub struct PersistedItem {
    #[serde(flatten)]
    pub item: Item,
    pub resources: Vec<Resource>,
}
