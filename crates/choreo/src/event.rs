use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Key/value payload carried by an event (waypoint args, listener details)
pub type Details = Map<String, Value>;

/// Source tag stamped on every event emitted by a [`crate::Timeline`]
pub const TIMELINE_SOURCE: &str = "TIMELINE";

/// An immutable symbolic event: what happened, who raised it, and any details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
	event_type: String,
	source: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	details: Option<Details>,
}

impl Event {
	pub fn new(event_type: impl Into<String>, source: impl Into<String>) -> Self {
		Self {
			event_type: event_type.into(),
			source: source.into(),
			details: None,
		}
	}

	pub fn with_details(mut self, details: Details) -> Self {
		self.details = Some(details);
		self
	}

	pub fn event_type(&self) -> &str {
		&self.event_type
	}

	pub fn source(&self) -> &str {
		&self.source
	}

	pub fn details(&self) -> Option<&Details> {
		self.details.as_ref()
	}

	/// Look up a string-valued detail
	pub fn detail_str(&self, key: &str) -> Option<&str> {
		self.details.as_ref()?.get(key)?.as_str()
	}
}

impl fmt::Display for Event {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.details {
			Some(details) => write!(f, "Event({} -> {}|{})", self.source, self.event_type, Value::Object(details.clone())),
			None => write!(f, "Event({} -> {}|{{}})", self.source, self.event_type),
		}
	}
}
