use crate::config::ShowConfig;
use crate::dispatcher::{EventDispatcher, HandleReport};
use crate::error::Result;
use crate::timeline::Timeline;
use std::sync::Arc;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Totals for one run of a show
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShowSummary {
	pub ticks: u64,
	pub events_handled: usize,
	pub events_dropped: usize,
	/// Recoverable listener errors the show logged and continued past
	pub listener_errors: usize,
	pub cancelled: bool,
}

impl ShowSummary {
	fn record(&mut self, report: HandleReport) {
		self.ticks += 1;
		self.events_handled += report.handled;
		self.events_dropped += report.dropped;
	}
}

/// Drives a timeline and its dispatcher from a single task.
///
/// Each iteration ticks the timeline, then delivers one batch of events.
/// A listener that runs a script holds the loop until the script finishes,
/// so later waypoints fire late rather than overlapping it.
pub struct Show {
	config: ShowConfig,
	timeline: Timeline,
	dispatcher: Arc<EventDispatcher>,
}

impl Show {
	pub fn new(config: ShowConfig, timeline: Timeline, dispatcher: Arc<EventDispatcher>) -> Result<Self> {
		config.validate()?;
		Ok(Self { config, timeline, dispatcher })
	}

	pub fn config(&self) -> &ShowConfig {
		&self.config
	}

	pub fn timeline(&self) -> &Timeline {
		&self.timeline
	}

	pub fn dispatcher(&self) -> &Arc<EventDispatcher> {
		&self.dispatcher
	}

	/// Start the timeline and loop until every waypoint has fired and the
	/// queue is empty, or until `cancel` fires. Recoverable listener errors are
	/// logged and skipped; any other listener error ends the show.
	pub async fn run(&mut self, cancel: &CancellationToken) -> Result<ShowSummary> {
		let mut ticker = interval(self.config.tick_interval());
		ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
		let mut summary = ShowSummary::default();

		self.timeline.start();
		info!("Show started: {} waypoints, tick interval {:?}", self.timeline.len(), self.config.tick_interval());

		loop {
			tokio::select! {
				biased;

				() = cancel.cancelled() => {
					summary.cancelled = true;
					break;
				}
				_ = ticker.tick() => {}
			}

			let fired = self.timeline.tick(&self.dispatcher)?;
			if fired > 0 {
				debug!("{} waypoints fired ({}/{})", fired, self.timeline.fired_count(), self.timeline.len());
			}

			let handled = tokio::select! {
				biased;

				() = cancel.cancelled() => {
					summary.cancelled = true;
					break;
				}
				handled = self.dispatcher.handle_events() => handled,
			};

			match handled {
				Ok(report) => summary.record(report),
				// The failing event is already consumed; the rest of the batch waits for the next tick
				Err(e) if e.is_recoverable() => {
					warn!("Continuing show past listener error: {}", e);
					summary.ticks += 1;
					summary.listener_errors += 1;
				}
				Err(e) => return Err(e),
			}

			if self.timeline.done() && self.dispatcher.pending() == 0 {
				break;
			}
		}

		if summary.cancelled {
			info!("Show cancelled after {} ticks ({} events pending)", summary.ticks, self.dispatcher.pending());
		} else {
			info!("Show finished after {} ticks: {} events handled, {} dropped", summary.ticks, summary.events_handled, summary.events_dropped);
		}

		Ok(summary)
	}
}
