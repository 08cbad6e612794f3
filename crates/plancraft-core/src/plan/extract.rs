//! Isolate the JSON-bearing part of a free-form model reply.
//!
//! Rules, in order:
//! 1. A blank reply or the bare refusal sentinel means "no plan".
//! 2. If a fence marker is present, take the text between the first fence and
//!    the last fence, skipping a language tag on the opening fence line. An
//!    opening fence with no closing fence falls back to the whole reply.
//! 3. Otherwise the whole trimmed reply is the candidate.
//!
//! Nothing here parses JSON.

use crate::error::GenerationError;

/// Literal reply meaning "this input cannot be planned".
pub const REFUSAL_SENTINEL: &str = "404";

const FENCE: &str = "```";

/// Return the candidate JSON text inside `reply`, or [`GenerationError::NoPlan`].
pub fn extract_candidate(reply: &str) -> Result<&str, GenerationError> {
    let trimmed = reply.trim();
    if trimmed.is_empty() || trimmed == REFUSAL_SENTINEL {
        return Err(GenerationError::NoPlan);
    }

    Ok(fenced_body(trimmed).unwrap_or(trimmed))
}

/// Body between the first and last fence, or `None` if there is no complete
/// fenced span.
fn fenced_body(text: &str) -> Option<&str> {
    let open = text.find(FENCE)?;
    let after_open = &text[open + FENCE.len()..];
    let body_start = skip_language_tag(after_open);
    let rest = &after_open[body_start..];

    let close = rest.rfind(FENCE)?;
    Some(rest[..close].trim())
}

/// Offset into `after_fence` where the fenced body begins.
///
/// A tag such as `json` or `JSON5` is skipped when it fills the rest of the
/// opening line, or when JSON follows it directly (```` ```json{ ````).
/// Otherwise the body starts right after the fence.
fn skip_language_tag(after_fence: &str) -> usize {
    let line_end = after_fence.find('\n').unwrap_or(after_fence.len());
    let line = &after_fence[..line_end];

    let tag_len = line.find(|c: char| !is_tag_char(c)).unwrap_or(line.len());
    let after_tag = line[tag_len..].trim_start();
    if tag_len > 0 && after_tag.starts_with(['{', '[']) {
        return tag_len;
    }

    if line_end < after_fence.len() && line.trim().chars().all(is_tag_char) {
        line_end + 1
    } else {
        0
    }
}

fn is_tag_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '.')
}
