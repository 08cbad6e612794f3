//! Database query functions for the `item_resources` table.

use anyhow::{Context, Result};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::Resource;

/// Column values for a new resource row.
#[derive(Debug, Clone)]
pub struct NewResource<'a> {
    pub item_id: Uuid,
    pub position: i32,
    pub name: &'a str,
    pub url: Option<&'a str>,
    pub description: Option<&'a str>,
}

/// Insert a resource row inside the caller's connection or transaction.
pub async fn insert_resource(conn: &mut PgConnection, new: &NewResource<'_>) -> Result<Resource> {
    let resource = sqlx::query_as::<_, Resource>(
        "INSERT INTO item_resources (item_id, position, name, url, description) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING *",
    )
    .bind(new.item_id)
    .bind(new.position)
    .bind(new.name)
    .bind(new.url)
    .bind(new.description)
    .fetch_one(conn)
    .await
    .with_context(|| format!("failed to insert resource {:?}", new.name))?;

    Ok(resource)
}

/// List the resources of several items at once, grouped by item and ordered
/// by position within each item.
pub async fn list_resources_for_items(pool: &PgPool, item_ids: &[Uuid]) -> Result<Vec<Resource>> {
    if item_ids.is_empty() {
        return Ok(Vec::new());
    }

    let resources = sqlx::query_as::<_, Resource>(
        "SELECT * FROM item_resources WHERE item_id = ANY($1) ORDER BY item_id, position ASC",
    )
    .bind(item_ids)
    .fetch_all(pool)
    .await
    .context("failed to list resources")?;

    Ok(resources)
}
