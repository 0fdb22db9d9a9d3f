//! Outbound pose transport
//!
//! The motion controllers only need "send this pose to actor i". Anything that
//! can do that (a robot bus, a simulator, a log) implements [`PoseTransport`].

use crate::error::Result;
use crate::motion::{ActorId, Pose};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::info;

/// One published pose
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseUpdate {
	pub actor: ActorId,
	pub pose: Pose,
}

#[async_trait]
pub trait PoseTransport: Send + Sync + 'static {
	async fn publish(&self, actor: ActorId, pose: Pose) -> Result<()>;
}

/// In-process transport backed by a broadcast channel.
///
/// Publishing never fails for lack of subscribers; slow subscribers lose the
/// oldest updates once `capacity` is exceeded.
#[derive(Clone)]
pub struct InMemTransport {
	sender: broadcast::Sender<PoseUpdate>,
}

impl InMemTransport {
	#[must_use]
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	pub fn subscribe(&self) -> broadcast::Receiver<PoseUpdate> {
		self.sender.subscribe()
	}

	pub fn receiver_count(&self) -> usize {
		self.sender.receiver_count()
	}
}

impl Default for InMemTransport {
	fn default() -> Self {
		Self::new(1024)
	}
}

#[async_trait]
impl PoseTransport for InMemTransport {
	async fn publish(&self, actor: ActorId, pose: Pose) -> Result<()> {
		// Err only means nobody is listening right now
		let _ = self.sender.send(PoseUpdate { actor, pose });
		Ok(())
	}
}

/// Writes every pose to the log; used when no robots are attached
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTransport;

#[async_trait]
impl PoseTransport for TracingTransport {
	async fn publish(&self, actor: ActorId, pose: Pose) -> Result<()> {
		info!(actor, lean = pose.lean(), turn = pose.turn(), twist = pose.twist(), tilt = pose.tilt(), "pose");
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_inmem_delivers_to_subscribers() {
		let transport = InMemTransport::new(8);
		let mut rx = transport.subscribe();
		assert_eq!(transport.receiver_count(), 1);

		transport.publish(2, Pose::new([1.0, 2.0, 3.0, 4.0])).await.unwrap();

		let update = rx.recv().await.unwrap();
		assert_eq!(update.actor, 2);
		assert_eq!(update.pose, Pose::new([1.0, 2.0, 3.0, 4.0]));
	}

	#[tokio::test]
	async fn test_inmem_publish_without_subscribers() {
		let transport = InMemTransport::default();
		assert!(transport.publish(0, Pose::ZERO).await.is_ok());
	}

	#[tokio::test]
	async fn test_tracing_transport_accepts_poses() {
		assert!(TracingTransport.publish(1, Pose::ZERO).await.is_ok());
	}
}
