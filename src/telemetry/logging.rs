//! Structured logging setup using the tracing crate.
//!
//! The library itself only emits `tracing` events; applications embedding
//! it call [`LoggingBuilder::init`] once to see them.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    #[default]
    Compact,
    Json,
    /// Default fmt output with span enter/exit events
    Full,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    /// Filter directive, e.g. `compose_events::compose=trace`
    pub filter: Option<String>,
    pub ansi_colors: bool,
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            format: LogFormat::default(),
            filter: None,
            ansi_colors: false,
            with_target: true,
        }
    }
}

/// Builder for installing the global tracing subscriber.
pub struct LoggingBuilder {
    config: LoggingConfig,
}

impl LoggingBuilder {
    /// Create a new logging builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: LoggingConfig::default(),
        }
    }

    /// Create a builder from an existing configuration.
    pub fn from_config(config: LoggingConfig) -> Self {
        Self { config }
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.config.level = level;
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.config.format = format;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.config.filter = Some(filter.into());
        self
    }

    pub fn with_ansi(mut self, enabled: bool) -> Self {
        self.config.ansi_colors = enabled;
        self
    }

    pub fn with_target(mut self, enabled: bool) -> Self {
        self.config.with_target = enabled;
        self
    }

    pub fn config(&self) -> &LoggingConfig {
        &self.config
    }

    /// `RUST_LOG` wins over the configured filter, which wins over the level.
    pub fn build_filter(&self) -> EnvFilter {
        let default_filter = self.config.level.as_filter();

        if let Some(ref filter) = self.config.filter {
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(filter))
                .unwrap_or_else(|_| EnvFilter::new(default_filter))
        } else {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
        }
    }

    /// Install the subscriber. Fails if one is already installed.
    pub fn init(self) -> Result<()> {
        let env_filter = self.build_filter();
        let registry = tracing_subscriber::registry().with(env_filter);
        let base = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(self.config.with_target);

        let result = match self.config.format {
            LogFormat::Pretty => registry
                .with(base.pretty().with_ansi(self.config.ansi_colors))
                .try_init(),
            LogFormat::Compact => registry
                .with(base.compact().with_ansi(self.config.ansi_colors))
                .try_init(),
            LogFormat::Json => registry.with(base.json()).try_init(),
            LogFormat::Full => registry
                .with(
                    base.with_ansi(self.config.ansi_colors)
                        .with_span_events(FmtSpan::FULL),
                )
                .try_init(),
        };

        result.map_err(|e| Error::Logging(e.to_string()))
    }
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self::new()
    }
}
