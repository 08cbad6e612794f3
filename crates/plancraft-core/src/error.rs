//! Outcome taxonomy for plan generation.
//!
//! Every way a generation attempt can end without a stored plan is a distinct
//! [`GenerationError`] variant. Callers branch on [`GenerationError::kind`]
//! rather than on message text.

use std::fmt;

use thiserror::Error;

use crate::llm::LlmError;
use crate::store::StoreError;

/// Why a generation attempt produced no (stored) plan.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The service declined (sentinel reply) or replied with nothing.
    #[error("could not generate a plan for this input")]
    NoPlan,

    /// The extracted reply is not valid JSON.
    #[error("AI response could not be understood: {0}")]
    MalformedResponse(#[source] serde_json::Error),

    /// The reply is valid JSON but lacks the required plan structure.
    #[error("AI response could not be understood: {reason}")]
    SchemaViolation { reason: String },

    /// The generation service could not be reached or failed.
    #[error("generation service unavailable: {0}")]
    ServiceUnavailable(#[source] LlmError),

    /// Writing the plan violated a database constraint; nothing was kept.
    #[error("plan conflicts with existing data: {message}")]
    PersistenceConflict {
        message: String,
        constraint: Option<String>,
    },

    /// Writing the plan failed for a reason other than a constraint.
    #[error("failed to store plan: {0}")]
    Persistence(#[source] StoreError),
}

impl GenerationError {
    pub(crate) fn schema(reason: impl Into<String>) -> Self {
        Self::SchemaViolation {
            reason: reason.into(),
        }
    }

    /// The discriminant of this outcome.
    pub fn kind(&self) -> GenerationErrorKind {
        match self {
            Self::NoPlan => GenerationErrorKind::NoPlan,
            Self::MalformedResponse(_) => GenerationErrorKind::MalformedResponse,
            Self::SchemaViolation { .. } => GenerationErrorKind::SchemaViolation,
            Self::ServiceUnavailable(_) => GenerationErrorKind::ServiceUnavailable,
            Self::PersistenceConflict { .. } => GenerationErrorKind::PersistenceConflict,
            Self::Persistence(_) => GenerationErrorKind::Persistence,
        }
    }

    /// True for "try a different input" outcomes.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self.kind(),
            GenerationErrorKind::NoPlan
                | GenerationErrorKind::MalformedResponse
                | GenerationErrorKind::SchemaViolation
        )
    }

    /// True for infrastructure failures worth retrying later.
    pub fn is_retryable(&self) -> bool {
        self.kind() == GenerationErrorKind::ServiceUnavailable
    }
}

impl From<LlmError> for GenerationError {
    fn from(err: LlmError) -> Self {
        Self::ServiceUnavailable(err)
    }
}

impl From<serde_json::Error> for GenerationError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedResponse(err)
    }
}

impl From<StoreError> for GenerationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict {
                message,
                constraint,
            } => Self::PersistenceConflict {
                message,
                constraint,
            },
            other => Self::Persistence(other),
        }
    }
}

/// Fieldless mirror of [`GenerationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenerationErrorKind {
    NoPlan,
    MalformedResponse,
    SchemaViolation,
    ServiceUnavailable,
    PersistenceConflict,
    Persistence,
}

impl fmt::Display for GenerationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NoPlan => "no_plan",
            Self::MalformedResponse => "malformed_response",
            Self::SchemaViolation => "schema_violation",
            Self::ServiceUnavailable => "service_unavailable",
            Self::PersistenceConflict => "persistence_conflict",
            Self::Persistence => "persistence",
        };
        f.write_str(s)
    }
}
