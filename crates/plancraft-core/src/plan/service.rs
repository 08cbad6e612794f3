//! Plan service layer.
//!
//! Writes a validated plan (plan row, items, resources) inside a single store
//! transaction and reads persisted plans back with their children.

use std::collections::HashMap;

use anyhow::Result;
use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

use plancraft_db::models::{PlanKind, Resource};
use plancraft_db::queries::items::{self as item_queries, NewItem};
use plancraft_db::queries::plans::{self as plan_queries, NewPlan};
use plancraft_db::queries::resources::{self as resource_queries, NewResource};

use super::request::PlanRequest;
use super::validate::ParsedPlan;
use crate::store::{PersistedItem, PersistedPlan, PlanStore, PlanTransaction, StoreError};

/// Store `plan` for `owner_id` inside one transaction.
///
/// Items get their list index as `position`; resources likewise within their
/// item. If any insert fails the transaction is rolled back and the error is
/// returned, so either everything is stored or nothing is.
///
/// An empty plan description is replaced by the request context, or by
/// `Generated plan for {goal}` when there is none.
pub async fn persist_plan(
    store: &dyn PlanStore,
    owner_id: Uuid,
    kind: PlanKind,
    request: &PlanRequest,
    plan: &ParsedPlan,
) -> Result<PersistedPlan, StoreError> {
    let mut tx = store.begin().await?;

    match insert_all(tx.as_mut(), owner_id, kind, request, plan).await {
        Ok(persisted) => {
            tx.commit().await?;
            debug!(plan_id = %persisted.plan.id, items = persisted.items.len(), "plan committed");
            Ok(persisted)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "rollback failed after insert error");
            }
            Err(err)
        }
    }
}

async fn insert_all(
    tx: &mut dyn PlanTransaction,
    owner_id: Uuid,
    kind: PlanKind,
    request: &PlanRequest,
    plan: &ParsedPlan,
) -> Result<PersistedPlan, StoreError> {
    let fallback;
    let description = if !plan.description.is_empty() {
        plan.description.as_str()
    } else if let Some(context) = request.context() {
        context
    } else {
        fallback = format!("Generated plan for {}", request.goal());
        fallback.as_str()
    };

    let plan_row = tx
        .insert_plan(&NewPlan {
            owner_id,
            kind,
            goal: request.goal(),
            title: &plan.title,
            description,
        })
        .await?;

    let mut items = Vec::with_capacity(plan.items.len());
    for (position, item) in (0_i32..).zip(&plan.items) {
        let item_row = tx
            .insert_item(&NewItem {
                plan_id: plan_row.id,
                position,
                name: &item.name,
                description: item.description.as_deref(),
                estimated_hours: item.estimated_effort,
            })
            .await?;

        let mut resources = Vec::with_capacity(item.resources.len());
        for (res_position, resource) in (0_i32..).zip(&item.resources) {
            let resource_row = tx
                .insert_resource(&NewResource {
                    item_id: item_row.id,
                    position: res_position,
                    name: &resource.name,
                    url: resource.url.as_deref(),
                    description: resource.description.as_deref(),
                })
                .await?;
            resources.push(resource_row);
        }

        items.push(PersistedItem {
            item: item_row,
            resources,
        });
    }

    Ok(PersistedPlan {
        plan: plan_row,
        items,
    })
}

/// Fetch a plan owned by `owner_id` with its items and resources.
///
/// Returns `None` if the plan does not exist or belongs to another owner.
pub async fn load_persisted_plan(
    pool: &PgPool,
    owner_id: Uuid,
    plan_id: Uuid,
) -> Result<Option<PersistedPlan>> {
    let Some(plan) = plan_queries::get_plan(pool, owner_id, plan_id).await? else {
        return Ok(None);
    };

    let items = item_queries::list_items_for_plan(pool, plan.id).await?;
    let item_ids: Vec<Uuid> = items.iter().map(|item| item.id).collect();

    let mut by_item: HashMap<Uuid, Vec<Resource>> = HashMap::new();
    for resource in resource_queries::list_resources_for_items(pool, &item_ids).await? {
        by_item.entry(resource.item_id).or_default().push(resource);
    }

    let items = items
        .into_iter()
        .map(|item| PersistedItem {
            resources: by_item.remove(&item.id).unwrap_or_default(),
            item,
        })
        .collect();

    Ok(Some(PersistedPlan { plan, items }))
}
