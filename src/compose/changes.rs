//! Turning parsed events into task results: changed detection, the list of
//! actions taken, warnings and failure messages.

use super::event::{Event, ResourceType};
use super::status;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// One action Compose performed on a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub what: ResourceType,
    pub id: Option<String>,
    pub status: String,
}

fn is_working_layer(event: &Event) -> bool {
    event.resource_type == ResourceType::ImageLayer
        && event
            .status()
            .is_some_and(|s| status::is_pull_progress_working(s) || s == status::PROGRESS_WORKING)
}

/// Returns true if the events show that Compose changed something.
pub fn has_changes(
    events: &[Event],
    ignore_service_pull_events: bool,
    ignore_build_events: bool,
) -> bool {
    events.iter().any(|event| {
        if let Some(s) = event.status().filter(|s| status::is_working(s)) {
            if ignore_service_pull_events && status::is_pull(s) {
                return false;
            }
            if ignore_build_events && status::is_build(s) {
                return false;
            }
            return true;
        }
        is_working_layer(event)
    })
}

/// Lists the actions Compose performed, in order.
///
/// Layer progress repeats a lot, so each (layer, status) pair is listed once.
pub fn extract_actions(events: &[Event]) -> Vec<Action> {
    let mut seen_layers: IndexSet<(Option<&str>, &str)> = IndexSet::new();
    let mut actions = Vec::new();

    for event in events {
        let Some(s) = event.status() else {
            continue;
        };
        let listed = if is_working_layer(event) {
            seen_layers.insert((event.resource_id(), s))
        } else {
            event.resource_type != ResourceType::ImageLayer && status::is_working(s)
        };
        if listed {
            actions.push(Action {
                what: event.resource_type,
                id: event.resource_id.clone(),
                status: s.to_string(),
            });
        }
    }

    actions
}

/// Reports warning events through `warn_fn`.
///
/// An event counts as a warning if its status is `Warning`, or if it has no
/// status but carries a message.
pub fn emit_warnings(events: &[Event], mut warn_fn: impl FnMut(String)) {
    for event in events {
        let is_warning = match (event.status(), event.msg()) {
            (Some(s), _) => status::is_warning(s),
            (None, msg) => msg.is_some(),
        };
        if is_warning {
            warn_fn(format!(
                "Docker compose: {} {}: {}",
                event.resource_type,
                event.resource_id().unwrap_or("None"),
                event.msg().unwrap_or("None"),
            ));
        }
    }
}

/// Human-readable messages for all error events.
pub fn failure_messages(events: &[Event]) -> Vec<String> {
    events
        .iter()
        .filter(|event| event.is_error())
        .map(|event| {
            let detail = event.msg().or(event.status()).unwrap_or_default();
            match (event.resource_type, event.resource_id()) {
                (ResourceType::Unknown, None | Some("")) => format!("General error: {detail}"),
                (ResourceType::Unknown, Some(id)) => {
                    format!("Error when processing {id}: {detail}")
                }
                (resource_type, id) => format!(
                    "Error when processing {resource_type} {}: {detail}",
                    id.unwrap_or_default()
                ),
            }
        })
        .collect()
}

/// Failure message for a finished Compose invocation, or `None` if it
/// exited successfully.
pub fn summarize_failure(events: &[Event], rc: i32) -> Option<String> {
    if rc == 0 {
        return None;
    }
    let messages = failure_messages(events);
    if messages.is_empty() {
        return Some(format!("Return code {rc} is non-zero"));
    }
    Some(messages.join("\n"))
}
