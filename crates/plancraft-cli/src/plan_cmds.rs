//! CLI handlers for `plancraft plan` subcommands.
//!
//! Implements:
//! - `plancraft plan show [plan-id]`      -- show one plan or list the owner's plans
//! - `plancraft plan delete <plan-id>`    -- delete a plan with its items
//! - `plancraft plan toggle <item-id>`    -- flip an item's completed flag

use anyhow::{Context, Result, bail};
use sqlx::PgPool;
use uuid::Uuid;

use plancraft_core::plan::{ParsedPlan, load_persisted_plan};
use plancraft_core::store::PersistedPlan;
use plancraft_db::queries::{items as item_queries, plans as plan_queries};

use crate::PlanCommands;
use crate::config::PlancraftConfig;

// -----------------------------------------------------------------------
// Public entry point
// -----------------------------------------------------------------------

/// Dispatch a `PlanCommands` variant to the appropriate handler.
pub async fn run_plan_command(
    command: PlanCommands,
    pool: &PgPool,
    config: &PlancraftConfig,
) -> Result<()> {
    match command {
        PlanCommands::Show {
            plan_id,
            owner,
            json,
        } => {
            let owner_id = config.owner(owner)?;
            match plan_id {
                Some(id) => cmd_show_one(pool, owner_id, &id, json).await,
                None => cmd_show_all(pool, owner_id, json).await,
            }
        }
        PlanCommands::Delete { plan_id, owner } => {
            cmd_delete(pool, config.owner(owner)?, &plan_id).await
        }
        PlanCommands::Toggle { item_id, owner } => {
            cmd_toggle(pool, config.owner(owner)?, &item_id).await
        }
    }
}

fn parse_id(raw: &str, what: &str) -> Result<Uuid> {
    raw.parse()
        .with_context(|| format!("invalid {what} ID: {raw:?}"))
}

// -----------------------------------------------------------------------
// plancraft plan show (list all)
// -----------------------------------------------------------------------

async fn cmd_show_all(pool: &PgPool, owner_id: Uuid, json: bool) -> Result<()> {
    let plans = plan_queries::list_plans_for_owner(pool, owner_id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plans)?);
        return Ok(());
    }

    if plans.is_empty() {
        println!("No plans found. Use `plancraft generate <goal>` to create one.");
        return Ok(());
    }

    let id_w = 36;
    let kind_w = 6;
    let title_w = plans.iter().map(|p| p.title.chars().count()).max().unwrap_or(5).max(5);
    let done_w = 5;

    println!(
        "{:<id_w$}  {:<kind_w$}  {:<title_w$}  {:>done_w$}  CREATED",
        "ID", "KIND", "TITLE", "DONE",
    );

    for plan in &plans {
        let pct = plan_queries::completion_percentage(pool, plan.id).await?;
        let created = plan.created_at.format("%Y-%m-%d %H:%M");
        println!(
            "{:<id_w$}  {:<kind_w$}  {:<title_w$}  {:>done_w$}  {}",
            plan.id,
            plan.kind,
            plan.title,
            format!("{pct:.0}%"),
            created,
        );
    }

    Ok(())
}

// -----------------------------------------------------------------------
// plancraft plan show <plan-id>
// -----------------------------------------------------------------------

async fn cmd_show_one(pool: &PgPool, owner_id: Uuid, plan_id: &str, json: bool) -> Result<()> {
    let plan_id = parse_id(plan_id, "plan")?;

    let Some(persisted) = load_persisted_plan(pool, owner_id, plan_id).await? else {
        bail!("plan {plan_id} not found");
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&persisted)?);
        return Ok(());
    }

    let pct = plan_queries::completion_percentage(pool, plan_id).await?;
    print_persisted_plan(&persisted, pct);
    Ok(())
}

/// Human-readable rendering of a stored plan.
pub fn print_persisted_plan(persisted: &PersistedPlan, completion_pct: f64) {
    let plan = &persisted.plan;
    println!("Plan: {}", plan.title);
    println!("  ID:           {}", plan.id);
    println!("  Kind:         {}", plan.kind);
    println!("  Goal:         {}", plan.goal);
    if !plan.description.is_empty() {
        println!("  Description:  {}", plan.description);
    }
    println!(
        "  Created:      {}",
        plan.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("  Completion:   {completion_pct:.0}%");
    println!("  Items:        {}", persisted.items.len());

    if persisted.items.is_empty() {
        return;
    }

    println!();
    for entry in &persisted.items {
        let item = &entry.item;
        let mark = if item.completed { "x" } else { " " };
        println!("  [{mark}] {}. {}", item.position + 1, item.name);
        println!("      ID:        {}", item.id);
        if let Some(desc) = &item.description {
            println!("      {desc}");
        }
        if let Some(hours) = item.estimated_hours {
            println!("      Effort:    {hours}h");
        }
        for resource in &entry.resources {
            match &resource.url {
                Some(url) => println!("      - {} <{url}>", resource.name),
                None => println!("      - {}", resource.name),
            }
        }
    }
}

/// Human-readable rendering of a plan that was not stored (dry run).
pub fn print_parsed_plan(plan: &ParsedPlan) {
    println!("Plan: {}", plan.title);
    if !plan.description.is_empty() {
        println!("  {}", plan.description);
    }
    println!();
    for (idx, item) in plan.items.iter().enumerate() {
        println!("  {}. {}", idx + 1, item.name);
        if let Some(desc) = &item.description {
            println!("     {desc}");
        }
        if let Some(hours) = item.estimated_effort {
            println!("     Effort: {hours}h");
        }
        for resource in &item.resources {
            match &resource.url {
                Some(url) => println!("     - {} <{url}>", resource.name),
                None => println!("     - {}", resource.name),
            }
        }
    }
}

// -----------------------------------------------------------------------
// plancraft plan delete <plan-id>
// -----------------------------------------------------------------------

async fn cmd_delete(pool: &PgPool, owner_id: Uuid, plan_id: &str) -> Result<()> {
    let plan_id = parse_id(plan_id, "plan")?;

    if !plan_queries::delete_plan(pool, owner_id, plan_id).await? {
        bail!("plan {plan_id} not found");
    }

    println!("Plan {plan_id} deleted.");
    Ok(())
}

// -----------------------------------------------------------------------
// plancraft plan toggle <item-id>
// -----------------------------------------------------------------------

async fn cmd_toggle(pool: &PgPool, owner_id: Uuid, item_id: &str) -> Result<()> {
    let item_id = parse_id(item_id, "item")?;

    let Some(item) = item_queries::toggle_item_completed(pool, owner_id, item_id).await? else {
        bail!("item {item_id} not found");
    };

    let pct = plan_queries::completion_percentage(pool, item.plan_id).await?;
    let state = if item.completed { "completed" } else { "not completed" };
    println!("Item {:?} marked {state}. Plan is {pct:.0}% complete.", item.name);
    Ok(())
}
