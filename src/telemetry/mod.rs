//! Observability for compose-events.
//!
//! The parsers emit `tracing` events: `trace` for every classified line,
//! `debug` for lines that are dropped or merged into an earlier event and
//! `warn` for lines that could not be parsed. Nothing is printed unless the
//! embedding application installs a subscriber, for example with
//! [`LoggingBuilder`]:
//!
//! ```rust,ignore
//! use compose_events::telemetry::{LogFormat, LogLevel, LoggingBuilder};
//!
//! LoggingBuilder::new()
//!     .with_level(LogLevel::Debug)
//!     .with_format(LogFormat::Json)
//!     .init()?;
//! ```

pub mod logging;

pub use logging::{LogFormat, LogLevel, LoggingBuilder, LoggingConfig};
