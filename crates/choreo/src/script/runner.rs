use super::{Instruction, Script};
use crate::error::{ChoreoError, Result};
use crate::motion::Ensemble;
use std::path::Path;
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, info};

/// Plays scripts against an ensemble
#[derive(Clone)]
pub struct ScriptRunner {
	ensemble: Arc<Ensemble>,
}

impl ScriptRunner {
	pub fn new(ensemble: Arc<Ensemble>) -> Self {
		Self { ensemble }
	}

	pub fn ensemble(&self) -> &Arc<Ensemble> {
		&self.ensemble
	}

	/// Run every instruction in order, then wait until all actors are idle.
	///
	/// Dispatches return as soon as the command is queued, so commands for
	/// different actors overlap while commands for one actor run back to back.
	/// Waits pause only this runner.
	pub async fn run(&self, script: &Script) -> Result<()> {
		// Reject the whole script before anything moves
		if let Some(actor) = script.actors().into_iter().find(|actor| *actor >= self.ensemble.len()) {
			return Err(ChoreoError::UnknownActor { actor, size: self.ensemble.len() });
		}

		for instruction in script.instructions() {
			match instruction {
				Instruction::Dispatch(command) => self.ensemble.dispatch(*command)?,
				Instruction::Wait(duration) => {
					debug!("Script waiting {:?}", duration);
					sleep(*duration).await;
				}
			}
		}

		self.ensemble.wait_idle().await;
		Ok(())
	}

	pub async fn run_file(&self, path: impl AsRef<Path>) -> Result<()> {
		let path = path.as_ref();
		let script = Script::load(path).await?;
		info!("Running script {} ({} instructions)", path.display(), script.len());
		self.run(&script).await?;
		info!("Script {} finished", path.display());
		Ok(())
	}
}
