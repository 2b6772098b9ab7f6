//! Docker Compose progress output parsing.
//!
//! Compose reports what it does on stderr. Depending on its version and the
//! `--progress` flag this is either human-readable text or one JSON object
//! per line. Both are turned into the same list of [`Event`]s:
//!
//! ```rust
//! use compose_events::compose::{parse_events, Event, ResourceType};
//!
//! let mut warnings = Vec::new();
//! let events = parse_events(
//!     b" Container web-1  Starting\n Container web-1  Started\n",
//!     false,
//!     false,
//!     |w| warnings.push(w),
//! )?;
//! assert_eq!(events, vec![
//!     Event::new(ResourceType::Container, "web-1", "Starting"),
//!     Event::new(ResourceType::Container, "web-1", "Started"),
//! ]);
//! assert!(warnings.is_empty());
//! # Ok::<(), compose_events::error::Error>(())
//! ```
//!
//! Warnings are handed to a caller-supplied callback as they are found. The
//! parsers keep no state between calls.

pub mod changes;
pub mod event;
pub mod json;
pub mod logfmt;
pub mod plain;
pub mod status;
pub mod version;

pub use changes::{
    emit_warnings, extract_actions, failure_messages, has_changes, summarize_failure, Action,
};
pub use event::{Event, ResourceType};
pub use plain::DRY_RUN_MARKER;
pub use version::{ComposeVersion, EventFormat};

use crate::config::ParserConfig;
use crate::error::Result;
use tracing::debug_span;

/// Event parser with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct EventParser {
    config: ParserConfig,
}

impl EventParser {
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// The format to parse output of the given Compose release with,
    /// honouring the configured preference.
    pub fn format_for(&self, version: Option<&ComposeVersion>) -> EventFormat {
        self.config.format.resolve(version)
    }

    /// Parses plain-text progress output.
    ///
    /// `dry_run` strips the dry-run marker from each line. `nonzero_rc` tells
    /// the parser the process failed, so an unrecognized last line is taken
    /// as its final error message.
    pub fn parse_plain(
        &self,
        stderr: &[u8],
        dry_run: bool,
        nonzero_rc: bool,
        mut warn_fn: impl FnMut(String),
    ) -> Result<Vec<Event>> {
        let _span = debug_span!(
            "parse_events",
            bytes = stderr.len(),
            dry_run = dry_run,
            nonzero_rc = nonzero_rc
        )
        .entered();
        let text = std::str::from_utf8(stderr)?;
        Ok(plain::parse_plain_text(
            text,
            dry_run,
            nonzero_rc,
            &self.config,
            &mut warn_fn,
        ))
    }

    /// Parses JSON-lines progress output.
    pub fn parse_json(&self, stderr: &[u8], mut warn_fn: impl FnMut(String)) -> Result<Vec<Event>> {
        let _span = debug_span!("parse_json_events", bytes = stderr.len()).entered();
        let text = std::str::from_utf8(stderr)?;
        json::parse_json_text(text, &mut warn_fn)
    }

    /// Parses output in the given format. `dry_run` and `nonzero_rc` only
    /// matter for plain text.
    pub fn parse(
        &self,
        stderr: &[u8],
        format: EventFormat,
        dry_run: bool,
        nonzero_rc: bool,
        warn_fn: impl FnMut(String),
    ) -> Result<Vec<Event>> {
        match format {
            EventFormat::Plain => self.parse_plain(stderr, dry_run, nonzero_rc, warn_fn),
            EventFormat::Json => self.parse_json(stderr, warn_fn),
        }
    }
}

/// Parses plain-text Compose progress output with the default configuration.
pub fn parse_events(
    stderr: &[u8],
    dry_run: bool,
    nonzero_rc: bool,
    warn_fn: impl FnMut(String),
) -> Result<Vec<Event>> {
    EventParser::default().parse_plain(stderr, dry_run, nonzero_rc, warn_fn)
}

/// Parses JSON-lines Compose progress output with the default configuration.
pub fn parse_json_events(stderr: &[u8], warn_fn: impl FnMut(String)) -> Result<Vec<Event>> {
    EventParser::default().parse_json(stderr, warn_fn)
}
