//! `plancraft generate <goal>`: ask the generation service for a plan and
//! store it.

use anyhow::Result;
use tracing::info;
use uuid::Uuid;

use plancraft_core::plan::{PlanGenerator, PlanRequest, PlanRequestError};
use plancraft_core::store::PgPlanStore;
use plancraft_core::{GenerationError, GenerationErrorKind};
use plancraft_db::models::PlanKind;
use plancraft_db::pool;
use plancraft_db::queries::plans as plan_queries;

use crate::config::PlancraftConfig;
use crate::plan_cmds::{print_parsed_plan, print_persisted_plan};

/// Parsed `generate` arguments.
#[derive(Debug)]
pub struct GenerateArgs {
    pub goal: String,
    pub kind: PlanKind,
    pub count: Option<u32>,
    pub context: Option<String>,
    pub owner: Option<Uuid>,
    pub dry_run: bool,
    pub json: bool,
}

pub async fn run_generate(args: GenerateArgs, config: &PlancraftConfig) -> Result<()> {
    if args.kind == PlanKind::Tasks && args.count.is_some() {
        eprintln!("note: --count only applies to skills plans; task plans are open-ended");
    }

    let request = PlanRequest::new(args.goal, args.count, args.context)?;
    let generator = PlanGenerator::from_config(&config.llm_config, args.kind)
        .map_err(GenerationError::from)?;
    info!(
        provider = %config.llm_config.provider,
        model = generator.model_id(),
        kind = %args.kind,
        "generating plan"
    );

    if args.dry_run {
        let plan = generator.generate(&request).await?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&plan)?);
        } else {
            print_parsed_plan(&plan);
        }
        return Ok(());
    }

    let owner_id = config.owner(args.owner)?;
    let db_pool = pool::create_pool(&config.db_config).await?;
    let store = PgPlanStore::new(db_pool.clone());

    let result = match generator.generate_and_persist(&store, owner_id, &request).await {
        Ok(persisted) if args.json => serde_json::to_string_pretty(&persisted)
            .map(|json| println!("{json}"))
            .map_err(anyhow::Error::from),
        Ok(persisted) => plan_queries::completion_percentage(&db_pool, persisted.plan.id)
            .await
            .map(|pct| {
                println!("Plan created.");
                println!();
                print_persisted_plan(&persisted, pct);
            }),
        Err(err) => Err(err.into()),
    };
    db_pool.close().await;
    result
}

/// Process exit code for a failed `generate`.
///
/// Anything that is neither a request nor a generation error exits with 1.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    if err.downcast_ref::<PlanRequestError>().is_some() {
        return 2;
    }
    match err.downcast_ref::<GenerationError>().map(GenerationError::kind) {
        Some(GenerationErrorKind::NoPlan) => 3,
        Some(GenerationErrorKind::MalformedResponse | GenerationErrorKind::SchemaViolation) => 4,
        Some(GenerationErrorKind::ServiceUnavailable) => 5,
        Some(GenerationErrorKind::PersistenceConflict) => 6,
        Some(GenerationErrorKind::Persistence) | None => 1,
    }
}

/// One-line message shown to the user for a failed `generate`.
pub fn user_message(err: &anyhow::Error) -> String {
    let Some(gen_err) = err.downcast_ref::<GenerationError>() else {
        return format!("{err:#}");
    };
    match gen_err {
        GenerationError::NoPlan => {
            "Could not generate a plan for this input. Try rephrasing your goal.".to_string()
        }
        GenerationError::MalformedResponse(_) | GenerationError::SchemaViolation { .. } => {
            format!("The AI response could not be understood ({gen_err}). Please try again.")
        }
        GenerationError::ServiceUnavailable(source) => {
            format!("The generation service is unavailable: {source}. Try again later.")
        }
        GenerationError::PersistenceConflict { message, .. } => {
            format!("A plan with this title or a duplicate item already exists: {message}")
        }
        GenerationError::Persistence(source) => format!("Failed to store the plan: {source}"),
    }
}
