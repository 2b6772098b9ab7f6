//! Parser for the human-readable progress output of Compose.
//!
//! Each line is classified into a [`LineShape`] by a cascade of patterns,
//! most specific first. The only state carried between lines is the list of
//! events built so far and the index of the last error event, which absorbs
//! follow-up lines that belong to its message.

use super::event::{Event, ResourceType};
use super::logfmt::parse_logfmt_line;
use super::status;
use crate::config::ParserConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, trace, warn};

/// Prefix Compose puts in front of every progress line in dry-run mode.
pub const DRY_RUN_MARKER: &str = "DRY-RUN MODE -";

/// `Container web-1  Started`, `Network app_default  Creating`
static RESOURCE_EVENT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?P<resource_type>Network|Image|Volume|Container)\s+(?P<resource_id>\S+)\s+(?P<status>\S(?:.*\S)?)\s*$",
    )
    .expect("Invalid resource event regex")
});

/// `web Pulling`, `web Pulled`
static PULL_EVENT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^\s*(?P<service>\S+)\s+(?P<status>{})\s*$",
        alternation(status::STATUS_PULL.iter().copied())
    ))
    .expect("Invalid pull event regex")
});

/// `web Error`, `web Error <message>`
static ERROR_EVENT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^\s*(?P<resource_id>\S+)\s+{}(?:\s+(?P<msg>\S(?:.*\S)?))?\s*$",
        regex::escape(status::STATUS_ERROR)
    ))
    .expect("Invalid error event regex")
});

/// `web Warning`, `web Warning <message>`
static WARNING_EVENT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^\s*(?P<resource_id>\S+)\s+{}(?:\s+(?P<msg>\S(?:.*\S)?))?\s*$",
        regex::escape(status::STATUS_WARNING)
    ))
    .expect("Invalid warning event regex")
});

/// `bbe49a0ba3c4 Downloading [=====>    ]  1.2MB/2.8MB`, `bbe49a0ba3c4 Pull complete`
static PULL_PROGRESS_REGEX: Lazy<Regex> = Lazy::new(|| {
    let mut statuses: Vec<&str> = status::PULL_PROGRESS_DONE
        .iter()
        .chain(status::PULL_PROGRESS_WORKING)
        .copied()
        .collect();
    statuses.sort_unstable();
    Regex::new(&format!(
        r"^\s*(?P<layer>\S+)\s+(?P<status>{})\s*(?:\s\[[^\]]+\]\s+\S+\s*|\s+[0-9.kKmMgGbB]+/[0-9.kKmMgGbB]+\s*)?$",
        alternation(statuses)
    ))
    .expect("Invalid pull progress regex")
});

/// `web Skipped`, `web Skipped - Image is already being pulled by api`
static SKIPPED_EVENT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?P<resource_id>\S+)\s+Skipped(?: -\s*(?P<msg>\S(?:.*\S)?)|\s*)$")
        .expect("Invalid skipped event regex")
});

/// `build service web`
static BUILD_START_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*build service\s+(?P<resource_id>\S+)$").expect("Invalid build start regex")
});

/// `==> writing image sha256:...`
static BUILD_PROGRESS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*==>\s+(?P<msg>.*)$").expect("Invalid build progress regex")
});

/// `web - <more text for web>`
static CONTINUE_EVENT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?P<resource_id>\S+)\s+-\s*(?P<msg>\S(?:.*\S)?)$")
        .expect("Invalid continue event regex")
});

fn alternation<'a>(words: impl IntoIterator<Item = &'a str>) -> String {
    words
        .into_iter()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("|")
}

/// Structural shape of one progress line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LineShape {
    /// A line that resolves to exactly one event.
    Event(Event),
    /// `<id> Warning [<message>]`, reported as a warning only.
    ResourceWarning { resource_id: String, msg: Option<String> },
    /// logrus `level=warning` record.
    LogrusWarning(String),
    /// `==> ...` build output, ignored.
    BuildProgress,
    /// `<id> - <text>`, more text for an earlier event.
    Continuation { resource_id: String, msg: String },
    /// Nothing matched.
    Unrecognized,
}

/// Splits the text after a resource id into status and message.
///
/// A known status alone is the status. A known status followed by more text
/// keeps the leading word as status and the rest as message, except for
/// `Error` where the whole text is the daemon's message. Anything else is an
/// unrecognized status and becomes the message.
fn split_status(text: &str) -> (Option<String>, Option<String>) {
    if status::is_known(text) {
        return (Some(text.to_string()), None);
    }
    if let Some((head, rest)) = text.split_once(char::is_whitespace) {
        if status::is_error(head) {
            return (Some(head.to_string()), Some(text.to_string()));
        }
        if status::is_known(head) {
            return (Some(head.to_string()), Some(rest.trim_start().to_string()));
        }
    }
    (None, Some(text.to_string()))
}

fn optional_group(caps: &regex::Captures<'_>, name: &str) -> Option<String> {
    caps.name(name)
        .map(|m| m.as_str().to_string())
        .filter(|s| !s.is_empty())
}

/// Classifies a single trimmed line (dry-run marker already removed).
pub(crate) fn classify_line(line: &str) -> LineShape {
    if let Some(caps) = RESOURCE_EVENT_REGEX.captures(line) {
        // the regex only admits labels that map
        let resource_type = ResourceType::from_compose_label(&caps["resource_type"])
            .unwrap_or(ResourceType::Unknown);
        let (status, msg) = split_status(&caps["status"]);
        return LineShape::Event(Event::from_parts(
            resource_type,
            Some(caps["resource_id"].to_string()),
            status,
            msg,
        ));
    }
    if let Some(caps) = PULL_EVENT_REGEX.captures(line) {
        return LineShape::Event(Event::new(
            ResourceType::Service,
            &caps["service"],
            &caps["status"],
        ));
    }
    if let Some(caps) = ERROR_EVENT_REGEX.captures(line) {
        return LineShape::Event(Event::from_parts(
            ResourceType::Unknown,
            Some(caps["resource_id"].to_string()),
            Some(status::STATUS_ERROR.to_string()),
            optional_group(&caps, "msg"),
        ));
    }
    if let Some(caps) = WARNING_EVENT_REGEX.captures(line) {
        return LineShape::ResourceWarning {
            resource_id: caps["resource_id"].to_string(),
            msg: optional_group(&caps, "msg"),
        };
    }
    if let Some(caps) = PULL_PROGRESS_REGEX.captures(line) {
        return LineShape::Event(Event::new(
            ResourceType::ImageLayer,
            &caps["layer"],
            &caps["status"],
        ));
    }
    if let Some(caps) = SKIPPED_EVENT_REGEX.captures(line) {
        return LineShape::Event(Event::from_parts(
            ResourceType::Unknown,
            Some(caps["resource_id"].to_string()),
            Some(status::STATUS_SKIPPED.to_string()),
            optional_group(&caps, "msg"),
        ));
    }
    if let Some(caps) = BUILD_START_REGEX.captures(line) {
        return LineShape::Event(Event::new(
            ResourceType::Service,
            &caps["resource_id"],
            "Building",
        ));
    }
    if BUILD_PROGRESS_REGEX.is_match(line) {
        return LineShape::BuildProgress;
    }
    if let Some(caps) = CONTINUE_EVENT_REGEX.captures(line) {
        return LineShape::Continuation {
            resource_id: caps["resource_id"].to_string(),
            msg: caps["msg"].to_string(),
        };
    }
    if let Ok(record) = parse_logfmt_line(line, true) {
        let field = |key: &str| record.get(key).and_then(|v| v.as_deref());
        if let (Some(_), Some(level), Some(msg)) = (field("time"), field("level"), field("msg")) {
            if level == "warning" {
                return LineShape::LogrusWarning(msg.to_string());
            }
        }
    }
    LineShape::Unrecognized
}

/// Events built so far in one parse call.
#[derive(Debug, Default)]
struct PlainEventState {
    events: Vec<Event>,
    /// Index of the last event, if it was an error event.
    open_error: Option<usize>,
}

impl PlainEventState {
    fn push(&mut self, event: Event) {
        let is_error = event.is_error();
        self.events.push(event);
        self.open_error = is_error.then(|| self.events.len() - 1);
    }

    fn last_index_for(&self, resource_id: &str) -> Option<usize> {
        self.events
            .iter()
            .rposition(|event| event.resource_id() == Some(resource_id))
    }
}

/// Parses plain-text progress output that is already decoded.
pub(crate) fn parse_plain_text(
    text: &str,
    dry_run: bool,
    nonzero_rc: bool,
    config: &ParserConfig,
    warn_fn: &mut dyn FnMut(String),
) -> Vec<Event> {
    // a bare `\r` separates lines as well, as in redrawn progress output
    let lines: Vec<&str> = text
        .split(['\r', '\n'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    let last_index = lines.len().saturating_sub(1);
    let mut state = PlainEventState::default();

    for (index, &raw_line) in lines.iter().enumerate() {
        let mut line = raw_line;
        let mut missing_dry_run_marker = false;
        if dry_run {
            match line.strip_prefix(DRY_RUN_MARKER) {
                Some(rest) => line = rest.trim_start(),
                None => missing_dry_run_marker = true,
            }
        }
        if line.is_empty() {
            continue;
        }

        match classify_line(line) {
            LineShape::Event(event) => {
                trace!(event = %event, "Parsed compose event");
                state.push(event);
                if missing_dry_run_marker && config.warn_missing_dry_run_marker {
                    warn_fn(format!(
                        "Event line is missing dry-run mode marker: {line:?}"
                    ));
                }
                continue;
            }
            LineShape::ResourceWarning { resource_id, msg } => {
                warn_fn(match msg {
                    Some(msg) => format!("{resource_id}: {msg}"),
                    None => format!("Unspecified warning for {resource_id}"),
                });
                continue;
            }
            LineShape::LogrusWarning(msg) => {
                warn_fn(msg);
                continue;
            }
            LineShape::BuildProgress => {
                debug!(line, "Ignoring build progress line");
                continue;
            }
            LineShape::Continuation { resource_id, msg } => {
                if let Some(target) = state.last_index_for(&resource_id) {
                    debug!(resource_id = %resource_id, "Appending continuation line");
                    state.events[target].append_msg(&msg);
                    continue;
                }
            }
            LineShape::Unrecognized => {}
        }

        if let Some(open) = state.open_error {
            // more text for the error reported on the previous line
            state.events[open].append_msg(line);
            continue;
        }
        if line.starts_with("Error ")
            || lines.len() == 1
            || (nonzero_rc && index == last_index)
        {
            trace!(line, "Treating line as general error");
            state.push(Event::general_error(line));
            continue;
        }

        warn!(line, "Cannot parse compose event line");
        if config.report_unparsable_lines {
            warn_fn(format!(
                "Cannot parse event from line: {line:?}. Please report this as a bug, \
                 together with the Docker Compose version in use"
            ));
        }
    }

    state.events
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn event(shape: LineShape) -> Event {
        match shape {
            LineShape::Event(event) => event,
            other => panic!("expected event, got {other:?}"),
        }
    }

    #[test]
    fn test_resource_line() {
        assert_eq!(
            event(classify_line("Container web-1  Started")),
            Event::new(ResourceType::Container, "web-1", "Started")
        );
        assert_eq!(
            event(classify_line("Volume data  Removed")),
            Event::new(ResourceType::Volume, "data", "Removed")
        );
    }

    #[test]
    fn test_resource_line_status_with_message() {
        assert_eq!(
            event(classify_line("Container web-1  Waiting for healthy dependency")),
            Event::new(ResourceType::Container, "web-1", "Waiting")
                .with_msg("for healthy dependency")
        );
        assert_eq!(
            event(classify_line(
                "Container web-1  Error response from daemon: Conflict"
            )),
            Event::new(ResourceType::Container, "web-1", "Error")
                .with_msg("Error response from daemon: Conflict")
        );
    }

    #[test]
    fn test_resource_line_unknown_status() {
        assert_eq!(
            event(classify_line("Container web-1  Something odd")),
            Event::from_parts(
                ResourceType::Container,
                Some("web-1".to_string()),
                None,
                Some("Something odd".to_string())
            )
        );
    }

    #[test]
    fn test_service_pull_lines() {
        assert_eq!(
            event(classify_line("web Pulling")),
            Event::new(ResourceType::Service, "web", "Pulling")
        );
        assert_eq!(
            event(classify_line("web Pulled ")),
            Event::new(ResourceType::Service, "web", "Pulled")
        );
    }

    #[test]
    fn test_layer_progress_drops_progress_bar() {
        assert_eq!(
            event(classify_line(
                "bbe49a0ba3c4 Downloading [>                                                  ]  32.77kB/2.791MB"
            )),
            Event::new(ResourceType::ImageLayer, "bbe49a0ba3c4", "Downloading")
        );
        assert_eq!(
            event(classify_line("63a26ae4e8a8 Downloading     541B/541B")),
            Event::new(ResourceType::ImageLayer, "63a26ae4e8a8", "Downloading")
        );
        assert_eq!(
            event(classify_line("63a26ae4e8a8 Pulling fs layer")),
            Event::new(ResourceType::ImageLayer, "63a26ae4e8a8", "Pulling fs layer")
        );
    }

    #[test]
    fn test_error_and_warning_lines() {
        assert_eq!(
            event(classify_line("dummy5 Error Bar baz bam")),
            Event::new(ResourceType::Unknown, "dummy5", "Error").with_msg("Bar baz bam")
        );
        assert_eq!(
            classify_line("dummy4 Warning Foo bar"),
            LineShape::ResourceWarning {
                resource_id: "dummy4".to_string(),
                msg: Some("Foo bar".to_string())
            }
        );
        assert_eq!(
            classify_line("dummy3 Warning"),
            LineShape::ResourceWarning {
                resource_id: "dummy3".to_string(),
                msg: None
            }
        );
        assert_eq!(classify_line("dummy Errors"), LineShape::Unrecognized);
    }

    #[test]
    fn test_skipped_lines() {
        assert_eq!(
            event(classify_line("bash_1 Skipped")),
            Event::new(ResourceType::Unknown, "bash_1", "Skipped")
        );
        assert_eq!(
            event(classify_line(
                "bash_1 Skipped - Image is already being pulled by bash_2"
            )),
            Event::new(ResourceType::Unknown, "bash_1", "Skipped")
                .with_msg("Image is already being pulled by bash_2")
        );
    }

    #[test]
    fn test_build_lines() {
        assert_eq!(
            event(classify_line("build service app")),
            Event::new(ResourceType::Service, "app", "Building")
        );
        assert_eq!(
            classify_line("==> writing image sha256:b8da48b0a4c9"),
            LineShape::BuildProgress
        );
    }

    #[test]
    fn test_continuation_and_logrus() {
        assert_eq!(
            classify_line("web - more detail"),
            LineShape::Continuation {
                resource_id: "web".to_string(),
                msg: "more detail".to_string()
            }
        );
        assert_eq!(
            classify_line(r#"time="2024-02-02T08:14:10+01:00" level=warning msg="careful""#),
            LineShape::LogrusWarning("careful".to_string())
        );
        assert_eq!(
            classify_line(r#"time="2024-02-02T08:14:10+01:00" level=info msg="fine""#),
            LineShape::Unrecognized
        );
    }

    fn parse(text: &str, dry_run: bool, nonzero_rc: bool) -> (Vec<Event>, Vec<String>) {
        let mut warnings = Vec::new();
        let events = parse_plain_text(
            text,
            dry_run,
            nonzero_rc,
            &ParserConfig::default(),
            &mut |w| warnings.push(w),
        );
        (events, warnings)
    }

    #[test]
    fn test_marker_only_line_is_blank() {
        let (events, warnings) = parse(" DRY-RUN MODE -  \n", true, true);
        assert!(events.is_empty());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_carriage_return_separates_lines() {
        let (events, warnings) = parse(
            " Container c1  Starting\r Container c1  Started\r\n",
            false,
            false,
        );
        assert_eq!(
            events,
            vec![
                Event::new(ResourceType::Container, "c1", "Starting"),
                Event::new(ResourceType::Container, "c1", "Started"),
            ]
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_bare_daemon_error_is_unrecognized() {
        assert_eq!(
            classify_line("Error response from daemon: No such image: x:latest"),
            LineShape::Unrecognized
        );
    }
}
