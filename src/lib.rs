//! # compose-events - Docker Compose progress output parsing
//!
//! Docker Compose v2 reports what it does to networks, volumes, images and
//! containers on stderr. This crate turns that output into a typed list of
//! [`Event`](compose::Event)s a caller can use to decide whether anything
//! changed, which actions were taken and why a run failed.
//!
//! ## Core Concepts
//!
//! - **Events**: a resource type, an optional resource id, a status and an
//!   optional message
//! - **Plain text**: the human-readable `--progress plain` output, including
//!   dry-run mode and logrus-style warnings
//! - **JSON lines**: the `--progress json` output of newer Compose releases
//! - **Warnings**: anything that is worth telling the user but is not an
//!   event goes to a caller-supplied callback
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                   captured stderr (bytes)                     │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//!              ┌────────────────┴────────────────┐
//!              ▼                                 ▼
//! ┌──────────────────────────┐      ┌──────────────────────────┐
//! │   compose::plain         │      │   compose::json          │
//! │   (line classifier +     │      │   (serde records +       │
//! │    logfmt warnings)      │      │    status/text rules)    │
//! └──────────────────────────┘      └──────────────────────────┘
//!              │                                 │
//!              └────────────────┬────────────────┘
//!                               ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │         Vec<Event>  ──▶  compose::changes (results)           │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Example
//!
//! ```rust
//! use compose_events::prelude::*;
//!
//! let stderr = b" Network app_default  Creating\n Network app_default  Created\n";
//! let events = parse_events(stderr, false, false, |w| eprintln!("{w}"))?;
//!
//! assert!(has_changes(&events, false, false));
//! assert_eq!(events[1], Event::new(ResourceType::Network, "app_default", "Created"));
//! # Ok::<(), Error>(())
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod prelude {
    //! Re-exports of the types most callers need.

    pub use crate::compose::{
        emit_warnings, extract_actions, failure_messages, has_changes, parse_events,
        parse_json_events, summarize_failure, Action, ComposeVersion, Event, EventFormat,
        EventParser, ResourceType,
    };
    pub use crate::config::{FormatPreference, ParserConfig};
    pub use crate::error::{Error, Result};
}

/// Error types and result aliases.
pub mod error;

/// Parser configuration from defaults, TOML files and the environment.
pub mod config;

/// Event model and the plain-text and JSON progress parsers.
///
/// See [`compose::parse_events`] and [`compose::parse_json_events`].
pub mod compose;

/// Logging setup for applications embedding the parsers.
pub mod telemetry;

/// Returns the current version of compose-events.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
