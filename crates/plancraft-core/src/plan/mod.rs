//! Plan generation: request validation, prompt construction, reply
//! extraction, schema validation, orchestration, and persistence.

pub mod extract;
pub mod generator;
pub mod prompt;
pub mod request;
pub mod service;
pub mod validate;

use plancraft_db::models::PlanKind;

pub use extract::{REFUSAL_SENTINEL, extract_candidate};
pub use generator::{GenerationStage, PlanGenerator};
pub use prompt::{build_prompt, system_instruction};
pub use request::{PlanRequest, PlanRequestError};
pub use service::{load_persisted_plan, persist_plan};
pub use validate::{ItemResource, ParsedPlan, PlanItem, validate_plan};

/// Top-level JSON key holding the item list for each plan kind.
pub fn items_key(kind: PlanKind) -> &'static str {
    match kind {
        PlanKind::Skills => "skills",
        PlanKind::Tasks => "tasks",
    }
}
