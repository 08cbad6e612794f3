//! Fakes shared by the core integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use plancraft_core::llm::{ContentRequest, LlmError, TextGenerator};
use plancraft_core::store::{PlanStore, PlanTransaction, StoreError};
use plancraft_db::models::{Item, Plan, Resource};
use plancraft_db::queries::items::NewItem;
use plancraft_db::queries::plans::NewPlan;
use plancraft_db::queries::resources::NewResource;

// ---------------------------------------------------------------------------
// Text generator
// ---------------------------------------------------------------------------

/// What a [`ScriptedGenerator`] does when called.
pub enum Script {
    Reply(String),
    Fail,
    Hang,
}

/// A [`TextGenerator`] that plays back one scripted outcome.
pub struct ScriptedGenerator {
    script: Script,
    calls: AtomicUsize,
    last: Mutex<Option<(String, Option<String>)>>,
}

impl ScriptedGenerator {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        })
    }

    pub fn replying(reply: &str) -> Arc<Self> {
        Self::new(Script::Reply(reply.to_owned()))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// `(prompt, system_instruction)` of the most recent call.
    pub fn last_request(&self) -> Option<(String, Option<String>)> {
        self.last.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate_content(&self, request: &ContentRequest<'_>) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some((
            request.prompt.to_owned(),
            request.system_instruction.map(str::to_owned),
        ));

        match &self.script {
            Script::Reply(text) => Ok(text.clone()),
            Script::Fail => Err(LlmError::Status {
                provider: "scripted".into(),
                status: 503,
                body: "overloaded".into(),
            }),
            Script::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(String::new())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Plan store
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone)]
pub struct MemoryState {
    pub plans: Vec<Plan>,
    pub items: Vec<Item>,
    pub resources: Vec<Resource>,
}

/// In-memory [`PlanStore`]: writes become visible only on commit.
///
/// Enforces unique item names per plan. `fail_on_item` makes the n-th item
/// insert (1-based) of every transaction fail with a conflict.
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    begins: AtomicUsize,
    rollbacks: Arc<AtomicUsize>,
    fail_on_item: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Arc::default(),
            begins: AtomicUsize::new(0),
            rollbacks: Arc::default(),
            fail_on_item: None,
        }
    }

    pub fn failing_on_item(n: usize) -> Self {
        Self {
            fail_on_item: Some(n),
            ..Self::new()
        }
    }

    pub fn begin_count(&self) -> usize {
        self.begins.load(Ordering::SeqCst)
    }

    pub fn rollback_count(&self) -> usize {
        self.rollbacks.load(Ordering::SeqCst)
    }

    pub fn committed(&self) -> MemoryState {
        self.state.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlanStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn PlanTransaction>, StoreError> {
        self.begins.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryTransaction {
            state: Arc::clone(&self.state),
            rollbacks: Arc::clone(&self.rollbacks),
            staged: MemoryState::default(),
            item_inserts: 0,
            fail_on_item: self.fail_on_item,
        }))
    }
}

struct MemoryTransaction {
    state: Arc<Mutex<MemoryState>>,
    rollbacks: Arc<AtomicUsize>,
    staged: MemoryState,
    item_inserts: usize,
    fail_on_item: Option<usize>,
}

fn conflict(constraint: &str) -> StoreError {
    StoreError::Conflict {
        message: format!("duplicate key value violates unique constraint \"{constraint}\""),
        constraint: Some(constraint.to_owned()),
    }
}

#[async_trait]
impl PlanTransaction for MemoryTransaction {
    async fn insert_plan(&mut self, new: &NewPlan<'_>) -> Result<Plan, StoreError> {
        let now = Utc::now();
        let plan = Plan {
            id: Uuid::new_v4(),
            owner_id: new.owner_id,
            kind: new.kind,
            goal: new.goal.to_owned(),
            title: new.title.to_owned(),
            description: new.description.to_owned(),
            completed: false,
            created_at: now,
            updated_at: now,
        };
        self.staged.plans.push(plan.clone());
        Ok(plan)
    }

    async fn insert_item(&mut self, new: &NewItem<'_>) -> Result<Item, StoreError> {
        self.item_inserts += 1;
        if self.fail_on_item == Some(self.item_inserts) {
            return Err(conflict("plan_items_plan_name_key"));
        }
        let duplicate = self
            .staged
            .items
            .iter()
            .any(|item| item.plan_id == new.plan_id && item.name == new.name);
        if duplicate {
            return Err(conflict("plan_items_plan_name_key"));
        }

        let item = Item {
            id: Uuid::new_v4(),
            plan_id: new.plan_id,
            position: new.position,
            name: new.name.to_owned(),
            description: new.description.map(str::to_owned),
            estimated_hours: new.estimated_hours,
            completed: false,
            created_at: Utc::now(),
        };
        self.staged.items.push(item.clone());
        Ok(item)
    }

    async fn insert_resource(&mut self, new: &NewResource<'_>) -> Result<Resource, StoreError> {
        let resource = Resource {
            id: Uuid::new_v4(),
            item_id: new.item_id,
            position: new.position,
            name: new.name.to_owned(),
            url: new.url.map(str::to_owned),
            description: new.description.map(str::to_owned),
        };
        self.staged.resources.push(resource.clone());
        Ok(resource)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryTransaction { state, staged, .. } = *self;
        let mut state = state.lock().unwrap();
        state.plans.extend(staged.plans);
        state.items.extend(staged.items);
        state.resources.extend(staged.resources);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
