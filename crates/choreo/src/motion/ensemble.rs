use super::controller::{ActorController, ActorStatus};
use super::{ActorId, Command, Pose};
use crate::error::{ChoreoError, Result};
use crate::transport::PoseTransport;
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

struct ActorHandle {
	commands: mpsc::UnboundedSender<Command>,
	status: Arc<watch::Sender<ActorStatus>>,
}

/// The fixed set of actors, each driven by its own controller task
pub struct Ensemble {
	actors: Vec<ActorHandle>,
	tasks: Mutex<Vec<JoinHandle<()>>>,
	cancel_token: CancellationToken,
}

impl Ensemble {
	/// Spawn one controller task per actor. Must be called inside a tokio runtime.
	pub fn spawn(size: usize, transport: Arc<dyn PoseTransport>, parent_token: &CancellationToken) -> Self {
		let cancel_token = parent_token.child_token();
		let mut actors = Vec::with_capacity(size);
		let mut tasks = Vec::with_capacity(size);

		for actor in 0..size {
			let (command_tx, command_rx) = mpsc::unbounded_channel();
			let status = Arc::new(watch::Sender::new(ActorStatus::default()));

			let controller = ActorController::new(actor, Arc::clone(&transport), Arc::clone(&status), command_rx, cancel_token.clone());
			tasks.push(tokio::spawn(controller.run()));
			actors.push(ActorHandle { commands: command_tx, status });
		}

		info!("Ensemble spawned with {} actors", size);

		Self {
			actors,
			tasks: Mutex::new(tasks),
			cancel_token,
		}
	}

	pub fn len(&self) -> usize {
		self.actors.len()
	}

	pub fn is_empty(&self) -> bool {
		self.actors.is_empty()
	}

	/// Queue a command on its actor without waiting for it to run.
	/// The actor starts it once every earlier command for that actor has finished.
	pub fn dispatch(&self, command: Command) -> Result<()> {
		let handle = self.handle(command.actor)?;

		// Count it before the controller can see it so the barrier never misses it
		handle.status.send_modify(|s| s.queued += 1);
		handle.commands.send(command).map_err(|_| {
			handle.status.send_modify(|s| s.queued = s.queued.saturating_sub(1));
			ChoreoError::ActorClosed(command.actor)
		})
	}

	/// Parse inbound command text for `actor` and queue it
	pub fn dispatch_raw(&self, actor: ActorId, text: &str) -> Result<()> {
		self.handle(actor)?;
		self.dispatch(Command::parse_text(actor, text)?)
	}

	/// Snap every actor to the zero pose and wait until all have applied it
	pub async fn reset_all(&self) -> Result<()> {
		info!("Resetting all actors");
		for actor in 0..self.len() {
			self.dispatch(Command::reset(actor, 0.0))?;
		}
		self.wait_idle().await;
		Ok(())
	}

	pub fn status(&self, actor: ActorId) -> Result<ActorStatus> {
		Ok(*self.handle(actor)?.status.borrow())
	}

	pub fn pose(&self, actor: ActorId) -> Result<Pose> {
		Ok(self.status(actor)?.pose)
	}

	pub fn subscribe(&self, actor: ActorId) -> Result<watch::Receiver<ActorStatus>> {
		Ok(self.handle(actor)?.status.subscribe())
	}

	/// True when no actor is ramping and no command is waiting
	pub fn is_idle(&self) -> bool {
		self.actors.iter().all(|handle| handle.status.borrow().is_idle())
	}

	/// Block until every actor has finished all dispatched commands
	pub async fn wait_idle(&self) {
		loop {
			for handle in &self.actors {
				let mut status_rx = handle.status.subscribe();
				// The sender lives in `self`, so a closed channel cannot happen while we borrow it
				if let Err(e) = status_rx.wait_for(ActorStatus::is_idle).await {
					debug!("Actor status channel closed while waiting for idle: {}", e);
				};
			}
			if self.is_idle() {
				return;
			}
		}
	}

	/// Cancel every controller and wait for the tasks to exit
	pub async fn shutdown(&self) {
		info!("Shutting down ensemble");
		self.cancel_token.cancel();

		let tasks: Vec<JoinHandle<()>> = self.tasks.lock().await.drain(..).collect();
		for task in tasks {
			let _ = task.await;
		}

		info!("Ensemble shut down complete");
	}

	fn handle(&self, actor: ActorId) -> Result<&ActorHandle> {
		self.actors.get(actor).ok_or(ChoreoError::UnknownActor { actor, size: self.actors.len() })
	}
}

impl Drop for Ensemble {
	fn drop(&mut self) {
		self.cancel_token.cancel();
	}
}
