//! Validated input for one generation call.

use thiserror::Error;

/// Longest accepted goal, in characters.
pub const MAX_GOAL_CHARS: usize = 200;
/// Smallest item count a skills plan may request.
pub const MIN_ITEM_COUNT: u32 = 3;
/// Largest item count a skills plan may request.
pub const MAX_ITEM_COUNT: u32 = 20;
pub const DEFAULT_ITEM_COUNT: u32 = 10;

/// Reasons a [`PlanRequest`] is rejected before any service call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanRequestError {
    #[error("goal must not be empty")]
    EmptyGoal,

    #[error("goal is {len} characters long (maximum {max})")]
    GoalTooLong { len: usize, max: usize },

    #[error("item count {count} is out of range ({min}..={max})")]
    ItemCountOutOfRange { count: u32, min: u32, max: u32 },
}

/// What to plan for. Lives only for the duration of a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanRequest {
    goal: String,
    item_count: u32,
    context: Option<String>,
}

impl PlanRequest {
    /// Validate and build a request.
    ///
    /// The goal and context are trimmed; a blank context counts as absent.
    /// `item_count` defaults to [`DEFAULT_ITEM_COUNT`].
    pub fn new(
        goal: impl Into<String>,
        item_count: Option<u32>,
        context: Option<String>,
    ) -> Result<Self, PlanRequestError> {
        let goal = goal.into().trim().to_owned();
        if goal.is_empty() {
            return Err(PlanRequestError::EmptyGoal);
        }
        let len = goal.chars().count();
        if len > MAX_GOAL_CHARS {
            return Err(PlanRequestError::GoalTooLong {
                len,
                max: MAX_GOAL_CHARS,
            });
        }

        let item_count = item_count.unwrap_or(DEFAULT_ITEM_COUNT);
        if !(MIN_ITEM_COUNT..=MAX_ITEM_COUNT).contains(&item_count) {
            return Err(PlanRequestError::ItemCountOutOfRange {
                count: item_count,
                min: MIN_ITEM_COUNT,
                max: MAX_ITEM_COUNT,
            });
        }

        let context = context
            .map(|c| c.trim().to_owned())
            .filter(|c| !c.is_empty());

        Ok(Self {
            goal,
            item_count,
            context,
        })
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }

    pub fn item_count(&self) -> u32 {
        self.item_count
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }
}
