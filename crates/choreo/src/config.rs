use crate::error::{ChoreoError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Which end of the pending queue loses events once it grows past the limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
	/// Keep the oldest `overflow_limit` events, drop everything enqueued after them
	#[default]
	DropNewest,
	/// Keep the newest `overflow_limit` events, drop the stale head
	DropOldest,
}

impl FromStr for OverflowPolicy {
	type Err = ChoreoError;

	fn from_str(s: &str) -> Result<Self> {
		match s {
			"drop_newest" | "drop-newest" => Ok(Self::DropNewest),
			"drop_oldest" | "drop-oldest" => Ok(Self::DropOldest),
			other => Err(ChoreoError::InvalidConfig(format!("unknown overflow policy '{other}'"))),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherConfig {
	/// Maximum number of events delivered per `handle_events` call
	#[serde(default = "default_events_per_tick")]
	pub events_per_tick: usize,

	/// Queue length above which the queue is trimmed after a batch
	#[serde(default = "default_overflow_limit")]
	pub overflow_limit: usize,

	#[serde(default)]
	pub overflow_policy: OverflowPolicy,
}

fn default_events_per_tick() -> usize {
	10
}

fn default_overflow_limit() -> usize {
	100
}

impl DispatcherConfig {
	pub fn new(events_per_tick: usize, overflow_limit: usize) -> Self {
		Self {
			events_per_tick,
			overflow_limit,
			overflow_policy: OverflowPolicy::default(),
		}
	}

	pub fn with_overflow_policy(mut self, policy: OverflowPolicy) -> Self {
		self.overflow_policy = policy;
		self
	}
}

impl Default for DispatcherConfig {
	fn default() -> Self {
		Self::new(default_events_per_tick(), default_overflow_limit())
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowConfig {
	/// Number of actors in the ensemble
	#[serde(default = "default_actors")]
	pub actors: usize,

	/// Delay between driver iterations (timeline tick + one dispatch batch)
	#[serde(default = "default_tick_interval")]
	pub tick_interval_ms: u64,

	#[serde(default)]
	pub dispatcher: DispatcherConfig,
}

fn default_actors() -> usize {
	4
}

fn default_tick_interval() -> u64 {
	10
}

impl ShowConfig {
	pub fn new(actors: usize) -> Self {
		Self {
			actors,
			tick_interval_ms: default_tick_interval(),
			dispatcher: DispatcherConfig::default(),
		}
	}

	pub fn with_tick_interval(mut self, ms: u64) -> Self {
		self.tick_interval_ms = ms;
		self
	}

	pub fn with_dispatcher(mut self, dispatcher: DispatcherConfig) -> Self {
		self.dispatcher = dispatcher;
		self
	}

	pub fn tick_interval(&self) -> Duration {
		Duration::from_millis(self.tick_interval_ms)
	}

	pub fn validate(&self) -> Result<()> {
		if self.actors == 0 {
			return Err(ChoreoError::InvalidConfig("ensemble needs at least one actor".to_string()));
		}
		if self.tick_interval_ms == 0 {
			return Err(ChoreoError::InvalidConfig("tick interval must be positive".to_string()));
		}
		if self.dispatcher.events_per_tick == 0 {
			return Err(ChoreoError::InvalidConfig("events_per_tick must be positive or the queue never drains".to_string()));
		}
		Ok(())
	}
}

impl Default for ShowConfig {
	fn default() -> Self {
		Self::new(default_actors())
	}
}
