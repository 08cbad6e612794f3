//! Database query functions for the `plan_items` table.

use anyhow::{Context, Result};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::Item;

/// Column values for a new item row.
#[derive(Debug, Clone)]
pub struct NewItem<'a> {
    pub plan_id: Uuid,
    pub position: i32,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub estimated_hours: Option<f64>,
}

/// Insert an item row inside the caller's connection or transaction.
pub async fn insert_item(conn: &mut PgConnection, new: &NewItem<'_>) -> Result<Item> {
    let item = sqlx::query_as::<_, Item>(
        "INSERT INTO plan_items (plan_id, position, name, description, estimated_hours) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING *",
    )
    .bind(new.plan_id)
    .bind(new.position)
    .bind(new.name)
    .bind(new.description)
    .bind(new.estimated_hours)
    .fetch_one(conn)
    .await
    .with_context(|| format!("failed to insert item {:?}", new.name))?;

    Ok(item)
}

/// List all items of a plan in plan order.
pub async fn list_items_for_plan(pool: &PgPool, plan_id: Uuid) -> Result<Vec<Item>> {
    let items = sqlx::query_as::<_, Item>(
        "SELECT * FROM plan_items WHERE plan_id = $1 ORDER BY position ASC",
    )
    .bind(plan_id)
    .fetch_all(pool)
    .await
    .context("failed to list items for plan")?;

    Ok(items)
}

/// Flip the `completed` flag of an item whose plan belongs to `owner_id`.
///
/// The parent plan's `completed` flag is recomputed in the same transaction:
/// a plan is complete when it has items and none of them is open.
///
/// Returns the updated item, or `None` if the item does not exist or belongs
/// to another owner.
pub async fn toggle_item_completed(
    pool: &PgPool,
    owner_id: Uuid,
    item_id: Uuid,
) -> Result<Option<Item>> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    let item = sqlx::query_as::<_, Item>(
        "UPDATE plan_items AS i \
         SET completed = NOT i.completed \
         FROM plans AS p \
         WHERE i.id = $1 AND i.plan_id = p.id AND p.owner_id = $2 \
         RETURNING i.*",
    )
    .bind(item_id)
    .bind(owner_id)
    .fetch_optional(&mut *tx)
    .await
    .context("failed to toggle item completion")?;

    let Some(item) = item else {
        return Ok(None);
    };

    sqlx::query(
        "UPDATE plans \
         SET completed = EXISTS (SELECT 1 FROM plan_items WHERE plan_id = $1) \
                     AND NOT EXISTS (SELECT 1 FROM plan_items WHERE plan_id = $1 AND NOT completed), \
             updated_at = now() \
         WHERE id = $1",
    )
    .bind(item.plan_id)
    .execute(&mut *tx)
    .await
    .context("failed to update plan completion")?;

    tx.commit().await.context("failed to commit transaction")?;

    Ok(Some(item))
}
