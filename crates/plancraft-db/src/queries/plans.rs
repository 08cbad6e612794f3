//! Database query functions for the `plans` table.

use anyhow::{Context, Result};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::{Plan, PlanKind};

/// Column values for a new plan row.
#[derive(Debug, Clone)]
pub struct NewPlan<'a> {
    pub owner_id: Uuid,
    pub kind: PlanKind,
    pub goal: &'a str,
    pub title: &'a str,
    pub description: &'a str,
}

/// Insert a new plan row. Returns the plan with server-generated defaults
/// (id, timestamps, completed).
///
/// Takes a connection rather than a pool so callers can run it inside a
/// transaction (`&mut *tx`).
pub async fn insert_plan(conn: &mut PgConnection, new: &NewPlan<'_>) -> Result<Plan> {
    let plan = sqlx::query_as::<_, Plan>(
        "INSERT INTO plans (owner_id, kind, goal, title, description) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING *",
    )
    .bind(new.owner_id)
    .bind(new.kind)
    .bind(new.goal)
    .bind(new.title)
    .bind(new.description)
    .fetch_one(conn)
    .await
    .with_context(|| format!("failed to insert plan {:?}", new.title))?;

    Ok(plan)
}

/// Fetch a plan by ID, scoped to its owner.
pub async fn get_plan(pool: &PgPool, owner_id: Uuid, id: Uuid) -> Result<Option<Plan>> {
    let plan = sqlx::query_as::<_, Plan>("SELECT * FROM plans WHERE id = $1 AND owner_id = $2")
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch plan")?;

    Ok(plan)
}

/// List an owner's plans, newest first.
pub async fn list_plans_for_owner(pool: &PgPool, owner_id: Uuid) -> Result<Vec<Plan>> {
    let plans = sqlx::query_as::<_, Plan>(
        "SELECT * FROM plans WHERE owner_id = $1 ORDER BY created_at DESC",
    )
    .bind(owner_id)
    .fetch_all(pool)
    .await
    .context("failed to list plans")?;

    Ok(plans)
}

/// Delete a plan owned by `owner_id`. Items and resources cascade.
///
/// Returns `false` when no such plan exists for that owner.
pub async fn delete_plan(pool: &PgPool, owner_id: Uuid, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM plans WHERE id = $1 AND owner_id = $2")
        .bind(id)
        .bind(owner_id)
        .execute(pool)
        .await
        .context("failed to delete plan")?;

    Ok(result.rows_affected() > 0)
}

/// Percentage (0..=100) of a plan's items that are completed.
///
/// A plan with no items reports 0.
pub async fn completion_percentage(pool: &PgPool, plan_id: Uuid) -> Result<f64> {
    let (total, done): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COUNT(*) FILTER (WHERE completed) \
         FROM plan_items WHERE plan_id = $1",
    )
    .bind(plan_id)
    .fetch_one(pool)
    .await
    .context("failed to compute plan completion")?;

    if total == 0 {
        return Ok(0.0);
    }
    Ok(done as f64 / total as f64 * 100.0)
}
