//! Structured events extracted from Compose progress output.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of resource an [`Event`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceType {
    /// Could not be attributed to a resource kind
    Unknown,
    Network,
    Image,
    /// A single layer of an image being pulled
    ImageLayer,
    Volume,
    Container,
    Service,
}

impl ResourceType {
    /// Maps the kind label Compose prints in front of a resource name
    /// (`Container foo`, `Network bar_default`, ...).
    pub fn from_compose_label(label: &str) -> Option<Self> {
        match label {
            "Network" => Some(ResourceType::Network),
            "Image" => Some(ResourceType::Image),
            "Volume" => Some(ResourceType::Volume),
            "Container" => Some(ResourceType::Container),
            "Service" => Some(ResourceType::Service),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Unknown => "unknown",
            ResourceType::Network => "network",
            ResourceType::Image => "image",
            ResourceType::ImageLayer => "image-layer",
            ResourceType::Volume => "volume",
            ResourceType::Container => "container",
            ResourceType::Service => "service",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One resource lifecycle transition, error or warning reported by Compose.
///
/// `resource_id` is `None` only for JSON log records that are not tied to a
/// resource; the plain-text parser uses an empty id instead. `status` is
/// `None` when a resource line carried text that is not a recognized status,
/// in which case that text is in `msg`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Event {
    pub resource_type: ResourceType,
    pub resource_id: Option<String>,
    pub status: Option<String>,
    pub msg: Option<String>,
}

impl Event {
    /// Creates an event for a resource with a status and no message.
    pub fn new(
        resource_type: ResourceType,
        resource_id: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            resource_type,
            resource_id: Some(resource_id.into()),
            status: Some(status.into()),
            msg: None,
        }
    }

    /// Creates an event from its raw parts.
    pub fn from_parts(
        resource_type: ResourceType,
        resource_id: Option<String>,
        status: Option<String>,
        msg: Option<String>,
    ) -> Self {
        Self {
            resource_type,
            resource_id,
            status,
            msg,
        }
    }

    /// Creates the synthetic error event used for lines without resource context.
    pub fn general_error(msg: impl Into<String>) -> Self {
        Self {
            resource_type: ResourceType::Unknown,
            resource_id: Some(String::new()),
            status: Some(super::status::STATUS_ERROR.to_string()),
            msg: Some(msg.into()),
        }
    }

    /// Sets the message.
    pub fn with_msg(mut self, msg: impl Into<String>) -> Self {
        self.msg = Some(msg.into());
        self
    }

    pub fn resource_id(&self) -> Option<&str> {
        self.resource_id.as_deref()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn msg(&self) -> Option<&str> {
        self.msg.as_deref()
    }

    /// True if the status is `Error`.
    pub fn is_error(&self) -> bool {
        self.status().is_some_and(super::status::is_error)
    }

    /// Appends a line to the message, newline separated.
    pub(crate) fn append_msg(&mut self, line: &str) {
        self.msg = Some(match self.msg.take() {
            Some(existing) => format!("{existing}\n{line}"),
            None => line.to_string(),
        });
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.resource_type,
            self.resource_id().unwrap_or("-"),
            self.status().unwrap_or("-")
        )?;
        if let Some(msg) = self.msg() {
            write!(f, ": {msg}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_mapping() {
        assert_eq!(
            ResourceType::from_compose_label("Container"),
            Some(ResourceType::Container)
        );
        assert_eq!(
            ResourceType::from_compose_label("Service"),
            Some(ResourceType::Service)
        );
        assert_eq!(ResourceType::from_compose_label("container"), None);
        assert_eq!(ResourceType::from_compose_label("Secret"), None);
    }

    #[test]
    fn test_resource_type_serializes_like_display() {
        let json = serde_json::to_string(&ResourceType::ImageLayer).unwrap();
        assert_eq!(json, "\"image-layer\"");
        assert_eq!(ResourceType::ImageLayer.to_string(), "image-layer");
    }

    #[test]
    fn test_append_msg() {
        let mut event = Event::new(ResourceType::Unknown, "web", "Error");
        event.append_msg("first");
        event.append_msg("second");
        assert_eq!(event.msg(), Some("first\nsecond"));
    }

    #[test]
    fn test_general_error() {
        let event = Event::general_error("Error response from daemon: boom");
        assert!(event.is_error());
        assert_eq!(event.resource_id(), Some(""));
        assert_eq!(event.resource_type, ResourceType::Unknown);
    }

    #[test]
    fn test_display() {
        let event = Event::new(ResourceType::Container, "web-1", "Started");
        assert_eq!(event.to_string(), "container web-1 Started");
        let event = Event::from_parts(
            ResourceType::Unknown,
            None,
            Some("Warning".to_string()),
            Some("careful".to_string()),
        );
        assert_eq!(event.to_string(), "unknown - Warning: careful");
    }
}
