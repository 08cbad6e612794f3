//! Prompt construction for both plan kinds.
//!
//! Prompts are pure functions of the plan kind and the [`PlanRequest`]: no
//! timestamps, no randomness.

use plancraft_db::models::PlanKind;

use super::extract::REFUSAL_SENTINEL;
use super::items_key;
use super::request::PlanRequest;

/// Worked example for skills plans.
const SKILLS_EXAMPLE: &str = r#"{
  "title": "Learning path for Data Analyst",
  "description": "Core skills for an entry-level data analyst role.",
  "skills": [
    {
      "name": "SQL",
      "description": "Querying relational databases is the daily bread of analysis work.",
      "estimated_hours": 40,
      "resources": [
        {"name": "SQLBolt", "url": "https://sqlbolt.com", "description": "Interactive SQL lessons"},
        {"name": "Mode SQL Tutorial", "url": "https://mode.com/sql-tutorial", "description": "Analytics-focused SQL"},
        {"name": "Learning SQL (book)", "url": null, "description": "Alan Beaulieu, O'Reilly"}
      ]
    }
  ]
}"#;

/// Worked example for task plans.
const TASKS_EXAMPLE: &str = r#"{
  "title": "Run a first 10k",
  "description": "Build up from zero to a comfortable 10k race.",
  "tasks": [
    {"name": "Buy running shoes", "description": "Get fitted at a running store.", "estimated_hours": 2},
    {"name": "Follow a 8-week couch-to-10k schedule", "estimated_hours": 30},
    "Register for a local 10k race"
  ]
}"#;

/// Role line sent ahead of the prompt for providers that accept one.
pub fn system_instruction(kind: PlanKind) -> &'static str {
    match kind {
        PlanKind::Skills => "You are an expert educational curriculum designer.",
        PlanKind::Tasks => {
            "You are an expert planning assistant who breaks goals into concrete, actionable tasks."
        }
    }
}

/// Build the prompt for `kind` from a validated request.
pub fn build_prompt(kind: PlanKind, request: &PlanRequest) -> String {
    match kind {
        PlanKind::Skills => build_skills_prompt(request),
        PlanKind::Tasks => build_tasks_prompt(request),
    }
}

fn build_skills_prompt(request: &PlanRequest) -> String {
    let mut prompt = String::with_capacity(2048);

    prompt.push_str(&format!(
        "Create a detailed learning path for someone who wants to become: {}\n",
        request.goal()
    ));
    prompt.push_str(&format!(
        "Include exactly {} essential skills needed to achieve this goal.\n\n",
        request.item_count()
    ));
    prompt.push_str("Each skill must include:\n");
    prompt.push_str("- name: the name of the skill\n");
    prompt.push_str("- description: what the skill is and why it matters for this goal\n");
    prompt.push_str(
        "- resources: at least 3 specific learning resources (books, courses, websites), \
         each with name, url, and description\n",
    );
    prompt.push_str("- estimated_hours: how many hours it takes to learn the skill\n");

    if let Some(context) = request.context() {
        prompt.push_str(&format!("\nAdditional context about the learner: {context}\n"));
    }

    push_output_contract(&mut prompt, PlanKind::Skills);
    prompt.push_str("\nExample of the expected shape:\n");
    prompt.push_str(SKILLS_EXAMPLE);
    prompt.push('\n');
    prompt
}

fn build_tasks_prompt(request: &PlanRequest) -> String {
    let mut prompt = String::with_capacity(2048);

    prompt.push_str(&format!(
        "Break the following goal into concrete, actionable tasks: {}\n",
        request.goal()
    ));
    prompt.push_str("Use as many tasks as the goal genuinely needs, in the order they should be done.\n\n");
    prompt.push_str("Each task may be a plain string, or an object with:\n");
    prompt.push_str("- name: a short imperative title for the task\n");
    prompt.push_str("- description: optional detail\n");
    prompt.push_str("- estimated_hours: optional effort estimate in hours\n");

    if let Some(context) = request.context() {
        prompt.push_str(&format!("\nAdditional context: {context}\n"));
    }

    push_output_contract(&mut prompt, PlanKind::Tasks);
    prompt.push_str(&format!(
        "\nIf the goal is empty, nonsensical, harmful, or cannot be broken into tasks, \
         reply with exactly {REFUSAL_SENTINEL} and nothing else.\n"
    ));
    prompt.push_str("\nExample of the expected shape:\n");
    prompt.push_str(TASKS_EXAMPLE);
    prompt.push('\n');
    prompt
}

fn push_output_contract(prompt: &mut String, kind: PlanKind) {
    prompt.push_str(&format!(
        "\nRespond with ONLY a valid JSON object: no prose, no explanations, no markdown. \
         The object must have the top-level keys \"title\", \"description\", and \"{}\" \
         (an array).\n",
        items_key(kind)
    ));
}
