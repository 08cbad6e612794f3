//! Core of plancraft: turns a free-text goal into a validated plan through a
//! hosted text-generation service and stores it atomically.
//!
//! ```text
//! PlanRequest --build_prompt--> prompt --TextGenerator--> raw reply
//!     --extract_candidate--> JSON text --validate_plan--> ParsedPlan
//!     --persist_plan (one transaction)--> PersistedPlan
//! ```

pub mod error;
pub mod llm;
pub mod plan;
pub mod store;

pub use error::{GenerationError, GenerationErrorKind};
