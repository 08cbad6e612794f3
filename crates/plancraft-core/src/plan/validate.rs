//! Turn candidate JSON text into a [`ParsedPlan`].
//!
//! Required structure is enforced strictly; optional fields are lenient and
//! fall back to defaults when missing or wrongly typed.

use serde::Serialize;
use serde_json::{Map, Value};

use plancraft_db::models::PlanKind;

use super::items_key;
use crate::error::GenerationError;

/// Name given to a resource object that has none.
const DEFAULT_RESOURCE_NAME: &str = "Resource";

/// A structurally valid plan, not yet persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedPlan {
    pub title: String,
    /// Empty when the reply carried no description.
    pub description: String,
    pub items: Vec<PlanItem>,
}

/// One skill or task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanItem {
    pub name: String,
    pub description: Option<String>,
    /// Hours; never negative.
    pub estimated_effort: Option<f64>,
    pub resources: Vec<ItemResource>,
}

impl PlanItem {
    fn named(name: String) -> Self {
        Self {
            name,
            description: None,
            estimated_effort: None,
            resources: Vec::new(),
        }
    }
}

/// A learning resource attached to an item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemResource {
    pub name: String,
    pub url: Option<String>,
    pub description: Option<String>,
}

/// Parse and validate `candidate` as a plan of `kind`.
pub fn validate_plan(kind: PlanKind, candidate: &str) -> Result<ParsedPlan, GenerationError> {
    let value: Value = serde_json::from_str(candidate)?;

    let Value::Object(root) = value else {
        return Err(GenerationError::schema(format!(
            "expected a JSON object, got {}",
            type_name(&value)
        )));
    };

    let title = match root.get("title") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_owned(),
        Some(Value::String(_)) => return Err(GenerationError::schema("\"title\" is blank")),
        Some(other) => {
            return Err(GenerationError::schema(format!(
                "\"title\" must be a string, got {}",
                type_name(other)
            )));
        }
        None => return Err(GenerationError::schema("missing \"title\"")),
    };

    let key = items_key(kind);
    let raw_items = match root.get(key) {
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(GenerationError::schema(format!(
                "\"{key}\" must be an array, got {}",
                type_name(other)
            )));
        }
        None => return Err(GenerationError::schema(format!("missing \"{key}\""))),
    };

    let description = string_field(&root, "description").unwrap_or_default();
    let items: Vec<PlanItem> = raw_items.iter().filter_map(parse_item).collect();

    // Only an explicitly empty list may produce a plan without items.
    if items.is_empty() && !raw_items.is_empty() {
        return Err(GenerationError::schema(format!("no usable items in \"{key}\"")));
    }

    Ok(ParsedPlan {
        title,
        description,
        items,
    })
}

fn parse_item(value: &Value) -> Option<PlanItem> {
    match value {
        Value::String(s) => non_blank(s).map(PlanItem::named),
        Value::Object(obj) => {
            let name = string_field(obj, "name").or_else(|| string_field(obj, "title"))?;
            let estimated_effort = effort_field(obj, "estimated_hours")
                .or_else(|| effort_field(obj, "estimated_effort"));
            let resources = match obj.get("resources") {
                Some(Value::Array(list)) => list.iter().filter_map(parse_resource).collect(),
                _ => Vec::new(),
            };
            Some(PlanItem {
                name,
                description: string_field(obj, "description"),
                estimated_effort,
                resources,
            })
        }
        _ => None,
    }
}

fn parse_resource(value: &Value) -> Option<ItemResource> {
    match value {
        Value::String(s) => non_blank(s).map(|name| ItemResource {
            name,
            url: None,
            description: None,
        }),
        Value::Object(obj) => Some(ItemResource {
            name: string_field(obj, "name").unwrap_or_else(|| DEFAULT_RESOURCE_NAME.to_owned()),
            url: string_field(obj, "url"),
            description: string_field(obj, "description"),
        }),
        _ => None,
    }
}

/// Trimmed, non-blank string value of `key`; anything else is `None`.
fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).and_then(non_blank)
}

/// Non-negative, finite effort from a number or numeric string.
fn effort_field(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    let hours = match obj.get(key)? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (hours.is_finite() && hours >= 0.0).then_some(hours)
}

fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
