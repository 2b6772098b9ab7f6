//! Docker Compose version handling.
//!
//! The progress format Compose writes depends on its version, so callers
//! that know the version (from `docker compose version --short`) can let it
//! pick the parser.

use crate::error::{Error, Result};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Oldest Compose release whose output the parsers are tested against.
pub const MINIMUM_COMPOSE_VERSION: Version = Version::new(2, 18, 0);

/// First Compose release that can write JSON-lines progress output.
pub const JSON_PROGRESS_VERSION: Version = Version::new(2, 29, 0);

/// A Docker Compose version.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComposeVersion(Version);

impl ComposeVersion {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self(Version::new(major, minor, patch))
    }

    /// Parses versions as printed by Compose: `2.24.6`, `v2.24.6`,
    /// `2.24.6-desktop.1`, or `2.30` with the patch level missing.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let bare = trimmed.strip_prefix('v').unwrap_or(trimmed);
        if bare.is_empty() {
            return Err(Error::invalid_version(raw, "empty version string"));
        }

        let (core, suffix) = match bare.find(['-', '+']) {
            Some(pos) => bare.split_at(pos),
            None => (bare, ""),
        };
        let normalized = match core.split('.').count() {
            1 => format!("{core}.0.0{suffix}"),
            2 => format!("{core}.0{suffix}"),
            _ => bare.to_string(),
        };

        Version::parse(&normalized)
            .map(Self)
            .map_err(|e| Error::invalid_version(raw, e.to_string()))
    }

    pub fn version(&self) -> &Version {
        &self.0
    }

    /// Compares release numbers only; `2.24.6-desktop.1` counts as `2.24.6`.
    fn release_at_least(&self, other: &Version) -> bool {
        (self.0.major, self.0.minor, self.0.patch) >= (other.major, other.minor, other.patch)
    }

    /// True if this release is at least [`MINIMUM_COMPOSE_VERSION`].
    pub fn is_supported(&self) -> bool {
        self.release_at_least(&MINIMUM_COMPOSE_VERSION)
    }

    /// True if this release can write JSON progress output.
    pub fn supports_json_progress(&self) -> bool {
        self.release_at_least(&JSON_PROGRESS_VERSION)
    }
}

impl FromStr for ComposeVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ComposeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Serialization format of the captured progress output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventFormat {
    /// Human-readable lines
    Plain,
    /// One JSON object per line
    Json,
}

impl EventFormat {
    /// The format a given Compose release should be asked to write.
    pub fn for_version(version: &ComposeVersion) -> Self {
        if version.supports_json_progress() {
            EventFormat::Json
        } else {
            EventFormat::Plain
        }
    }

    /// Value for `docker compose --progress`.
    pub fn progress_arg(&self) -> &'static str {
        match self {
            EventFormat::Plain => "plain",
            EventFormat::Json => "json",
        }
    }
}
