//! Pure rules governing projects and the places they own.

use std::collections::HashSet;

use time::OffsetDateTime;

use super::error::DomainError;

pub const MAX_PROJECT_NAME_LEN: usize = 255;

/// Whether a project with the given counts satisfies the completion rule.
pub fn is_complete(place_count: u64, visited_count: u64) -> bool {
    place_count > 0 && visited_count == place_count
}

/// Change to apply to a project's completion fields, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionChange {
    Complete { at: OffsetDateTime },
    Reopen,
    Unchanged,
}

/// Compare the stored flag with the state derived from fresh counts.
pub fn completion_change(
    stored_completed: bool,
    place_count: u64,
    visited_count: u64,
    now: OffsetDateTime,
) -> CompletionChange {
    match (stored_completed, is_complete(place_count, visited_count)) {
        (false, true) => CompletionChange::Complete { at: now },
        (true, false) => CompletionChange::Reopen,
        _ => CompletionChange::Unchanged,
    }
}

/// Resolve the `(visited, visited_at)` pair after a requested visited value.
///
/// Only a real transition touches `visited_at`; repeating the current value
/// keeps the original timestamp.
pub fn visit_transition(
    visited: bool,
    visited_at: Option<OffsetDateTime>,
    requested: bool,
    now: OffsetDateTime,
) -> (bool, Option<OffsetDateTime>) {
    match (visited, requested) {
        (false, true) => (true, Some(now)),
        (true, false) => (false, None),
        _ => (visited, visited_at),
    }
}

/// First external id that appears more than once, in input order.
pub fn first_duplicate(external_ids: impl IntoIterator<Item = i64>) -> Option<i64> {
    let mut seen = HashSet::new();
    external_ids.into_iter().find(|id| !seen.insert(*id))
}

/// Trim and validate a project name.
pub fn normalize_project_name(name: &str) -> Result<String, DomainError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("name", "must not be empty"));
    }
    if trimmed.chars().count() > MAX_PROJECT_NAME_LEN {
        return Err(DomainError::validation(
            "name",
            format!("must be at most {MAX_PROJECT_NAME_LEN} characters"),
        ));
    }
    Ok(trimmed.to_string())
}

/// Collapse blank free-text input to `None`.
pub fn normalize_optional_text(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}
