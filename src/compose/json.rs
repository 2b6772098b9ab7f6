//! Parser for the JSON-lines progress output of newer Compose releases
//! (`docker compose --progress json`).
//!
//! Every non-empty line must be one JSON object. Unlike the plain-text
//! parser there is no tolerant skipping: a line that does not decode is a
//! protocol violation and fails the whole parse.

use super::event::{Event, ResourceType};
use super::status;
use crate::error::{Error, Result};
use serde::Deserialize;
use tracing::{debug, trace};

/// One record of the JSON progress stream. Unknown fields (`current`,
/// `total`, `percent`, `dry_run`, `time`, ...) are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct JsonRecord {
    id: Option<String>,
    parent_id: Option<String>,
    status: Option<String>,
    text: Option<String>,
    level: Option<String>,
    msg: Option<String>,
    message: Option<String>,
    tail: Option<bool>,
    error: Option<bool>,
}

/// Prefix of plain warnings Compose sometimes prints into the JSON stream.
const PLAIN_WARNING_PREFIX: &str = "Warning: ";

const TAIL_WARNING_PREFIX: &str = "warning:";

fn is_status_word(value: Option<&str>) -> bool {
    value.is_some_and(status::is_known_or_warning)
}

fn is_layer_word(value: &str) -> bool {
    status::is_pull_progress(value) || status::is_known_or_warning(value)
}

/// Picks status and message for a layer record that has a parent.
///
/// `Working`/`Done` in `status` are the status. Otherwise a recognized word
/// in `text` is the status and whatever is in `status` (the progress bar)
/// becomes the message.
fn layer_status(status: Option<String>, text: Option<String>) -> (Option<String>, Option<String>) {
    match (status, text) {
        (Some(status), text) if status::is_generic_progress(&status) => (Some(status), text),
        (Some(status), Some(text)) if !is_layer_word(&status) && is_layer_word(&text) => {
            (Some(text), Some(status))
        }
        (Some(status), text) => (Some(status), text),
        (None, text) => (text, None),
    }
}

/// Converts one decoded record. `None` means the record carries nothing
/// worth reporting.
fn record_to_event(
    record: JsonRecord,
    line: &str,
    warn_fn: &mut dyn FnMut(String),
) -> Option<Event> {
    if record.tail == Some(true) {
        let mut status = status::STATUS_ERROR;
        let mut msg = record.text;
        if let Some(text) = msg.as_deref() {
            let prefixed = text
                .get(..TAIL_WARNING_PREFIX.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(TAIL_WARNING_PREFIX));
            if prefixed {
                status = status::STATUS_WARNING;
                msg = Some(text[TAIL_WARNING_PREFIX.len()..].trim_start().to_string());
            }
        }
        return Some(Event::from_parts(
            ResourceType::Unknown,
            None,
            Some(status.to_string()),
            msg,
        ));
    }

    if record.error == Some(true) {
        return Some(Event::from_parts(
            ResourceType::Unknown,
            record.id,
            Some(status::STATUS_ERROR.to_string()),
            record.message,
        ));
    }

    if record.id.is_none() {
        if let (Some(level), Some(msg)) = (record.level.as_deref(), record.msg) {
            let status = match level {
                "warning" => status::STATUS_WARNING,
                "error" => status::STATUS_ERROR,
                other => {
                    debug!(level = other, msg = %msg, "Dropping compose log record");
                    return None;
                }
            };
            return Some(Event::from_parts(
                ResourceType::Unknown,
                None,
                Some(status.to_string()),
                Some(msg),
            ));
        }
    }

    let mut resource_type = ResourceType::Unknown;
    let mut resource_id = record.id;
    let mut status = record.status;
    let mut text = record.text;

    match (resource_id.as_deref(), text.as_deref()) {
        (Some(" "), Some(t)) if t.starts_with("build service ") => {
            let service = t["build service ".len()..].trim().to_string();
            return Some(Event::new(ResourceType::Service, service, "Building"));
        }
        (Some("==>"), Some(t)) if t.starts_with("==> writing image ") => {
            debug!(line, "Ignoring image writing record");
            return None;
        }
        (Some("==> ==>"), Some(t)) if t.starts_with("naming to ") => {
            debug!(line, "Ignoring image naming record");
            return None;
        }
        (None, None) if status.is_none() => {
            debug!(line, "Ignoring record without id, status or text");
            return None;
        }
        _ => {}
    }

    let labelled = resource_id
        .as_deref()
        .and_then(|id| id.split_once(' '))
        .map(|(label, name)| (label.to_string(), name.to_string()));

    if let Some((label, name)) = labelled {
        resource_type = ResourceType::from_compose_label(&label).unwrap_or_else(|| {
            warn_fn(format!("Unknown resource type {label:?} in line {line:?}"));
            ResourceType::Unknown
        });
        resource_id = Some(name);
    } else if record.parent_id.is_some() {
        resource_type = ResourceType::ImageLayer;
        (status, text) = layer_status(status, text);
        return Some(Event::from_parts(resource_type, resource_id, status, text));
    } else if text.as_deref().is_some_and(status::is_pull) {
        resource_type = ResourceType::Image;
        std::mem::swap(&mut status, &mut text);
    } else if text.as_deref().is_some_and(status::is_pull_progress) {
        resource_type = ResourceType::ImageLayer;
        std::mem::swap(&mut status, &mut text);
    } else if status.is_none() {
        if let Some((skipped, reason)) = text.as_deref().and_then(|t| t.split_once(" - ")) {
            if skipped == status::STATUS_SKIPPED {
                status = Some(skipped.to_string());
                text = Some(reason.to_string());
            }
        }
    }

    if !is_status_word(status.as_deref()) && is_status_word(text.as_deref()) {
        std::mem::swap(&mut status, &mut text);
    }

    Some(Event::from_parts(resource_type, resource_id, status, text))
}

/// Parses JSON-lines progress output that is already decoded.
pub(crate) fn parse_json_text(text: &str, warn_fn: &mut dyn FnMut(String)) -> Result<Vec<Event>> {
    let mut events = Vec::new();

    for raw_line in text.split(['\r', '\n']) {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        if !(line.starts_with('{') && line.ends_with('}')) {
            if let Some(rest) = line.strip_prefix(PLAIN_WARNING_PREFIX) {
                events.push(Event::from_parts(
                    ResourceType::Unknown,
                    None,
                    Some(status::STATUS_WARNING.to_string()),
                    Some(rest.to_string()),
                ));
                continue;
            }
            return Err(Error::unexpected_record(line, "expected a JSON object"));
        }

        let record: JsonRecord =
            serde_json::from_str(line).map_err(|e| Error::json_event(line, e))?;
        if let Some(event) = record_to_event(record, line, warn_fn) {
            trace!(event = %event, "Parsed compose JSON event");
            events.push(event);
        }
    }

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(text: &str) -> (Vec<Event>, Vec<String>) {
        let mut warnings = Vec::new();
        let events = parse_json_text(text, &mut |w| warnings.push(w)).unwrap();
        (events, warnings)
    }

    #[test]
    fn test_layer_status_prefers_generic_progress() {
        assert_eq!(
            layer_status(Some("Working".to_string()), Some("Downloading".to_string())),
            (Some("Working".to_string()), Some("Downloading".to_string()))
        );
        assert_eq!(
            layer_status(
                Some("[==>   ]  32.77kB/599.9kB".to_string()),
                Some("Extracting".to_string())
            ),
            (
                Some("Extracting".to_string()),
                Some("[==>   ]  32.77kB/599.9kB".to_string())
            )
        );
        assert_eq!(
            layer_status(None, Some("Pull complete".to_string())),
            (Some("Pull complete".to_string()), None)
        );
    }

    #[test]
    fn test_labelled_ids() {
        let (events, warnings) = parse(
            "{\"id\":\"Network app_default\",\"status\":\"Working\",\"text\":\"Creating\"}\n\
             {\"id\":\"Secret token\",\"text\":\"Created\"}\n",
        );
        assert_eq!(
            events,
            vec![
                Event::new(ResourceType::Network, "app_default", "Creating").with_msg("Working"),
                Event::new(ResourceType::Unknown, "token", "Created"),
            ]
        );
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("Unknown resource type \"Secret\""));
    }

    #[test]
    fn test_skipped_record() {
        let (events, _) = parse(
            "{\"id\":\"bash_1\",\"text\":\"Skipped - Image is already being pulled by bash_2\"}\n",
        );
        assert_eq!(
            events,
            vec![Event::new(ResourceType::Unknown, "bash_1", "Skipped")
                .with_msg("Image is already being pulled by bash_2")]
        );
    }

    #[test]
    fn test_build_records() {
        let (events, _) = parse(
            "{\"dry_run\":false,\"id\":\" \",\"text\":\"build service app\"}\n\
             {\"dry_run\":false,\"id\":\"==>\",\"text\":\"==> writing image sha256:b8da48b0\"}\n\
             {\"dry_run\":false,\"id\":\"==> ==>\",\"text\":\"naming to docker.io/library/app:latest done\"}\n",
        );
        assert_eq!(
            events,
            vec![Event::new(ResourceType::Service, "app", "Building")]
        );
    }

    #[test]
    fn test_empty_record_is_dropped() {
        let (events, warnings) = parse("{\"dry_run\":true}\n");
        assert!(events.is_empty());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_camel_case_parent_id_is_ignored() {
        let (events, _) = parse(
            "{\"id\":\"63a26ae4e8a8\",\"parent_id\":\"web\",\"parentId\":\"web\",\"status\":\"Done\",\"text\":\"Pull complete\"}\n",
        );
        assert_eq!(
            events,
            vec![Event::new(ResourceType::ImageLayer, "63a26ae4e8a8", "Done")
                .with_msg("Pull complete")]
        );
    }

    #[test]
    fn test_carriage_returns_split_records() {
        let (events, _) = parse(
            "{\"id\":\"svc\",\"text\":\"Pulling\"}\r{\"id\":\"svc\",\"text\":\"Pulled\"}\r\n",
        );
        assert_eq!(
            events,
            vec![
                Event::new(ResourceType::Image, "svc", "Pulling"),
                Event::new(ResourceType::Image, "svc", "Pulled"),
            ]
        );
    }

    #[test]
    fn test_non_object_line_is_fatal() {
        let err = parse_json_text("[1, 2]\n", &mut |_| {}).unwrap_err();
        assert!(matches!(err, Error::UnexpectedRecord { .. }));
        let err = parse_json_text("{\"id\": }\n", &mut |_| {}).unwrap_err();
        assert!(matches!(err, Error::JsonEvent { .. }));
    }
}
