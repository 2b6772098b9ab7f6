//! Configuration for the event parsers
//!
//! Values come from, in increasing precedence:
//! - Default values
//! - A TOML file (`[parser]` table, or the root table)
//! - Environment variables (`COMPOSE_EVENTS_*`)

use crate::compose::version::{ComposeVersion, EventFormat};
use crate::error::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable overriding [`ParserConfig::format`].
pub const ENV_FORMAT: &str = "COMPOSE_EVENTS_FORMAT";

/// Environment variable overriding [`ParserConfig::report_unparsable_lines`].
pub const ENV_REPORT_UNPARSABLE: &str = "COMPOSE_EVENTS_REPORT_UNPARSABLE";

/// Which parser to use for captured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatPreference {
    /// Decide from the Compose version
    #[default]
    Auto,
    Plain,
    Json,
}

impl FormatPreference {
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(FormatPreference::Auto),
            "plain" | "text" => Ok(FormatPreference::Plain),
            "json" => Ok(FormatPreference::Json),
            _ => Err(Error::invalid_config(
                "format",
                format!("'{}' is not one of: auto, plain, json", s),
            )),
        }
    }

    /// Resolves the preference, using `version` for [`FormatPreference::Auto`].
    /// Without a known version, `Auto` falls back to plain text.
    pub fn resolve(&self, version: Option<&ComposeVersion>) -> EventFormat {
        match self {
            FormatPreference::Plain => EventFormat::Plain,
            FormatPreference::Json => EventFormat::Json,
            FormatPreference::Auto => version
                .map(EventFormat::for_version)
                .unwrap_or(EventFormat::Plain),
        }
    }
}

/// Parser configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Parser selection
    pub format: FormatPreference,

    /// Warn when an event line lacks the dry-run marker in dry-run mode
    pub warn_missing_dry_run_marker: bool,

    /// Send unparsable plain-text lines to the warning callback
    pub report_unparsable_lines: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            format: FormatPreference::Auto,
            warn_missing_dry_run_marker: true,
            report_unparsable_lines: true,
        }
    }
}

#[derive(Deserialize)]
struct ConfigFile {
    parser: Option<ParserConfig>,
}

impl ParserConfig {
    /// Parses a TOML document. Settings may live in a `[parser]` table or at
    /// the root.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(content)?;
        let has_parser_table = table.contains_key("parser");
        let value = toml::Value::Table(table);
        if has_parser_table {
            let file: ConfigFile = value.try_into()?;
            return Ok(file.parser.unwrap_or_default());
        }
        Ok(value.try_into()?)
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Loads configuration from an optional file and applies environment
    /// overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Applies `COMPOSE_EVENTS_*` environment variables.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(format) = std::env::var(ENV_FORMAT) {
            self.format = FormatPreference::from_str(&format)?;
        }
        if let Ok(report) = std::env::var(ENV_REPORT_UNPARSABLE) {
            self.report_unparsable_lines = match report.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(Error::invalid_config(
                        ENV_REPORT_UNPARSABLE,
                        format!("'{}' is not a boolean", report),
                    ))
                }
            };
        }
        Ok(())
    }
}
