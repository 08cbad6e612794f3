//! Generation orchestrator.
//!
//! One call walks the stages
//!
//! ```text
//! Built -> Sent -> Refused | Malformed | Invalid | Parsed
//!                                                  Parsed -> Persisted | RolledBack
//! ```
//!
//! and logs every transition. The service call is the only suspension point
//! before persistence and is bounded by a timeout. Nothing is retried here.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use uuid::Uuid;

use plancraft_db::models::PlanKind;

use super::extract::extract_candidate;
use super::prompt::{build_prompt, system_instruction};
use super::request::PlanRequest;
use super::service::persist_plan;
use super::validate::{ParsedPlan, validate_plan};
use crate::error::{GenerationError, GenerationErrorKind};
use crate::llm::{ContentRequest, LlmConfig, LlmError, TextGenerator};
use crate::store::{PersistedPlan, PlanStore};

/// Where a generation attempt is (or ended).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStage {
    Built,
    Sent,
    Refused,
    Malformed,
    Invalid,
    Parsed,
    Persisted,
    RolledBack,
}

impl fmt::Display for GenerationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Built => "built",
            Self::Sent => "sent",
            Self::Refused => "refused",
            Self::Malformed => "malformed",
            Self::Invalid => "invalid",
            Self::Parsed => "parsed",
            Self::Persisted => "persisted",
            Self::RolledBack => "rolled_back",
        };
        f.write_str(s)
    }
}

/// Drives one plan kind against an injected [`TextGenerator`].
#[derive(Clone)]
pub struct PlanGenerator {
    client: Arc<dyn TextGenerator>,
    model_id: String,
    kind: PlanKind,
    timeout: Duration,
}

impl fmt::Debug for PlanGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlanGenerator")
            .field("client", &self.client.name())
            .field("model_id", &self.model_id)
            .field("kind", &self.kind)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl PlanGenerator {
    pub fn new(client: Arc<dyn TextGenerator>, model_id: impl Into<String>, kind: PlanKind) -> Self {
        Self {
            client,
            model_id: model_id.into(),
            kind,
            timeout: LlmConfig::DEFAULT_TIMEOUT,
        }
    }

    /// Build the client described by `config` and wrap it.
    pub fn from_config(config: &LlmConfig, kind: PlanKind) -> Result<Self, LlmError> {
        let client = config.build_client()?;
        Ok(Self::new(client, config.model.clone(), kind).with_timeout(config.timeout))
    }

    /// Bound on the service call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn kind(&self) -> PlanKind {
        self.kind
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Generate and validate a plan without storing it.
    pub async fn generate(&self, request: &PlanRequest) -> Result<ParsedPlan, GenerationError> {
        let prompt = build_prompt(self.kind, request);
        debug!(
            stage = %GenerationStage::Built,
            kind = %self.kind,
            prompt_len = prompt.len(),
            "prompt built"
        );

        let content = ContentRequest {
            model_id: &self.model_id,
            system_instruction: Some(system_instruction(self.kind)),
            prompt: &prompt,
        };

        let reply = match tokio::time::timeout(self.timeout, self.client.generate_content(&content))
            .await
        {
            Ok(Ok(reply)) => reply,
            Ok(Err(err)) => {
                warn!(provider = self.client.name(), error = %err, "generation service failed");
                return Err(err.into());
            }
            Err(_) => {
                warn!(
                    provider = self.client.name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "generation service timed out"
                );
                return Err(LlmError::Timeout { after: self.timeout }.into());
            }
        };
        debug!(
            stage = %GenerationStage::Sent,
            provider = self.client.name(),
            reply_len = reply.len(),
            "reply received"
        );

        let parsed = extract_candidate(&reply).and_then(|candidate| validate_plan(self.kind, candidate));
        match parsed {
            Ok(plan) => {
                info!(
                    stage = %GenerationStage::Parsed,
                    title = %plan.title,
                    items = plan.items.len(),
                    "plan parsed"
                );
                Ok(plan)
            }
            Err(err) => {
                let stage = match err.kind() {
                    GenerationErrorKind::NoPlan => GenerationStage::Refused,
                    GenerationErrorKind::MalformedResponse => GenerationStage::Malformed,
                    _ => GenerationStage::Invalid,
                };
                info!(stage = %stage, error = %err, "no usable plan in reply");
                Err(err)
            }
        }
    }

    /// Generate a plan and store it for `owner_id`.
    ///
    /// The service is called before any transaction is opened, so a refusal
    /// or invalid reply never touches the store.
    pub async fn generate_and_persist(
        &self,
        store: &dyn PlanStore,
        owner_id: Uuid,
        request: &PlanRequest,
    ) -> Result<PersistedPlan, GenerationError> {
        let plan = self.generate(request).await?;

        match persist_plan(store, owner_id, self.kind, request, &plan).await {
            Ok(persisted) => {
                info!(
                    stage = %GenerationStage::Persisted,
                    plan_id = %persisted.plan.id,
                    owner_id = %owner_id,
                    "plan stored"
                );
                Ok(persisted)
            }
            Err(err) => {
                warn!(stage = %GenerationStage::RolledBack, error = %err, "plan not stored");
                Err(err.into())
            }
        }
    }
}
