use crate::dispatcher::EventDispatcher;
use crate::error::{ChoreoError, Result};
use crate::event::{Details, Event, TIMELINE_SOURCE};
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// A named event scheduled at an offset from the start of the show
#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
	pub name: String,
	pub offset_seconds: f64,
	pub args: Details,
}

impl Waypoint {
	pub fn new(name: impl Into<String>, offset_seconds: f64) -> Self {
		Self {
			name: name.into(),
			offset_seconds,
			args: Details::new(),
		}
	}

	pub fn with_args(mut self, args: Details) -> Self {
		self.args = args;
		self
	}

	/// Identity of a waypoint within one timeline: `<name>-<offset>`
	pub fn key(&self) -> String {
		format!("{}-{}", self.name, self.offset_seconds)
	}

	fn to_event(&self) -> Event {
		Event::new(self.name.clone(), TIMELINE_SOURCE).with_details(self.args.clone())
	}
}

/// Fires each waypoint once, the first tick after its offset has strictly passed.
///
/// Owned by the driving loop; `start()` may be called again to rewind and replay.
#[derive(Debug)]
pub struct Timeline {
	waypoints: Vec<Waypoint>,
	fired: Vec<bool>,
	origin: Option<Instant>,
}

impl Timeline {
	/// Fails on non-finite offsets and on duplicate `(name, offset)` keys.
	pub fn new(waypoints: Vec<Waypoint>) -> Result<Self> {
		let mut keys = HashSet::with_capacity(waypoints.len());
		for waypoint in &waypoints {
			if !waypoint.offset_seconds.is_finite() {
				return Err(ChoreoError::InvalidWaypoint(format!("'{}' has a non-finite offset", waypoint.name)));
			}
			if !keys.insert(waypoint.key()) {
				return Err(ChoreoError::DuplicateWaypoint(waypoint.key()));
			}
		}

		let fired = vec![false; waypoints.len()];
		Ok(Self { waypoints, fired, origin: None })
	}

	/// Clear fired-state and take `now` as the origin of elapsed time
	pub fn start(&mut self) {
		self.fired.fill(false);
		self.origin = Some(Instant::now());
		info!("Timeline started with {} waypoints", self.waypoints.len());
	}

	/// Emit an event for every unfired waypoint whose offset is below the elapsed time.
	/// Returns how many fired.
	pub fn tick(&mut self, dispatcher: &EventDispatcher) -> Result<usize> {
		let origin = self.origin.ok_or(ChoreoError::NotStarted)?;
		let elapsed = origin.elapsed().as_secs_f64();
		Ok(self.fire_due(elapsed, dispatcher))
	}

	/// Fire against an explicit elapsed time in seconds instead of the clock
	pub fn fire_due(&mut self, elapsed: f64, dispatcher: &EventDispatcher) -> usize {
		let mut fired = 0;
		// Waypoints are not assumed sorted; the full scan keeps `start()` trivial.
		for (waypoint, done) in self.waypoints.iter().zip(self.fired.iter_mut()) {
			if !*done && waypoint.offset_seconds < elapsed {
				*done = true;
				fired += 1;
				debug!("Waypoint '{}' fired at {:.3}s", waypoint.name, elapsed);
				dispatcher.send_event(waypoint.to_event());
			}
		}
		fired
	}

	pub fn done(&self) -> bool {
		self.fired.iter().all(|fired| *fired)
	}

	pub fn is_started(&self) -> bool {
		self.origin.is_some()
	}

	pub fn elapsed(&self) -> Option<Duration> {
		self.origin.map(|origin| origin.elapsed())
	}

	pub fn fired_count(&self) -> usize {
		self.fired.iter().filter(|fired| **fired).count()
	}

	pub fn is_fired(&self, key: &str) -> bool {
		self.waypoints.iter().zip(&self.fired).any(|(waypoint, fired)| *fired && waypoint.key() == key)
	}

	pub fn waypoints(&self) -> &[Waypoint] {
		&self.waypoints
	}

	pub fn len(&self) -> usize {
		self.waypoints.len()
	}

	pub fn is_empty(&self) -> bool {
		self.waypoints.is_empty()
	}
}
