use super::{ramp_steps, ActorId, Command, Pose, CONTROL_RATE_HZ};
use crate::transport::PoseTransport;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Observable state of one actor
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ActorStatus {
	pub pose: Pose,
	/// True while an interpolated ramp is in progress
	pub active: bool,
	/// Commands dispatched to this actor that have not finished yet
	pub queued: usize,
}

impl ActorStatus {
	pub const fn is_idle(&self) -> bool {
		!self.active && self.queued == 0
	}
}

/// Control loop for a single actor. Owns the actor's pose and `active` flag;
/// the only other writer of the status channel is the dispatcher bumping `queued`.
pub(super) struct ActorController {
	actor: ActorId,
	transport: Arc<dyn PoseTransport>,
	status: Arc<watch::Sender<ActorStatus>>,
	commands: mpsc::UnboundedReceiver<Command>,
	cancel: CancellationToken,
}

impl ActorController {
	pub(super) fn new(
		actor: ActorId,
		transport: Arc<dyn PoseTransport>,
		status: Arc<watch::Sender<ActorStatus>>,
		commands: mpsc::UnboundedReceiver<Command>,
		cancel: CancellationToken,
	) -> Self {
		Self {
			actor,
			transport,
			status,
			commands,
			cancel,
		}
	}

	/// Execute commands one at a time until cancelled or every sender is gone
	pub(super) async fn run(mut self) {
		debug!("Actor {} controller started", self.actor);

		loop {
			tokio::select! {
				biased;

				() = self.cancel.cancelled() => {
					debug!("Actor {} controller cancelled", self.actor);
					break;
				}
				received = self.commands.recv() => {
					let Some(command) = received else { break };
					self.execute(command).await;
					self.status.send_modify(|s| s.queued = s.queued.saturating_sub(1));
				}
			}
		}

		// Nothing will drain the queue any more; release anyone waiting on the barrier
		self.status.send_modify(|s| {
			s.active = false;
			s.queued = 0;
		});
		debug!("Actor {} controller stopped", self.actor);
	}

	async fn execute(&self, command: Command) {
		let initial = self.status.borrow().pose;
		let goal = command.goal(initial);
		let steps = ramp_steps(command.delay_seconds);

		match command.angle {
			Some(angle) => info!("Actor {} {} {} deg over {}s", self.actor, command.kind, angle, command.delay_seconds),
			None => info!("Actor {} {} over {}s", self.actor, command.kind, command.delay_seconds),
		}

		if steps == 0 {
			self.apply(goal).await;
			return;
		}

		let Some(step_delay) = ramp_step_delay(command.delay_seconds, steps) else {
			warn!("Actor {} cannot ramp over {}s; applying goal immediately", self.actor, command.delay_seconds);
			self.apply(goal).await;
			return;
		};
		let step_delta = (goal - initial) / f64::from(steps);

		self.status.send_modify(|s| s.active = true);

		let mut pose = initial;
		for step in 1..=steps {
			// Land the last step exactly on the goal so rounding never accumulates
			pose = if step == steps { goal } else { pose + step_delta };
			self.apply(pose).await;

			tokio::select! {
				() = sleep(step_delay) => {}
				() = self.cancel.cancelled() => {
					warn!("Actor {} ramp cancelled at step {}/{}", self.actor, step, steps);
					break;
				}
			}
		}

		self.status.send_modify(|s| s.active = false);
	}

	/// Record `pose` as current and publish it
	async fn apply(&self, pose: Pose) {
		self.status.send_modify(|s| s.pose = pose);
		if let Err(e) = self.transport.publish(self.actor, pose).await {
			warn!("Failed to publish pose for actor {}: {}", self.actor, e);
		}
	}
}

/// Sleep between ramp steps, or `None` when the delay does not fit the step
/// count or a `Duration`
fn ramp_step_delay(delay_seconds: f64, steps: u32) -> Option<Duration> {
	if delay_seconds * CONTROL_RATE_HZ > f64::from(u32::MAX) {
		return None;
	}
	Duration::try_from_secs_f64(delay_seconds / f64::from(steps)).ok()
}
