use super::ScriptRunner;
use crate::dispatcher::EventListener;
use crate::error::{ChoreoError, Result};
use crate::event::Event;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

/// Detail key naming the script an event should run
pub const SCRIPT_PATH_KEY: &str = "script_path";

/// Runs the script named by each event it receives. Relative paths resolve
/// against `script_root`. Holds the dispatcher until the script's barrier passes.
pub struct ScriptListener {
	runner: ScriptRunner,
	script_root: PathBuf,
}

impl ScriptListener {
	pub fn new(runner: ScriptRunner, script_root: impl Into<PathBuf>) -> Self {
		Self {
			runner,
			script_root: script_root.into(),
		}
	}

	pub fn script_root(&self) -> &Path {
		&self.script_root
	}

	pub fn resolve(&self, event: &Event) -> Result<PathBuf> {
		let script_path = event.detail_str(SCRIPT_PATH_KEY).ok_or_else(|| ChoreoError::Listener(format!("{event} has no '{SCRIPT_PATH_KEY}' detail")))?;
		Ok(self.script_root.join(script_path))
	}
}

#[async_trait]
impl EventListener for ScriptListener {
	async fn on_event(&self, event: &Event) -> Result<()> {
		let path = self.resolve(event)?;
		info!("{} triggered script {}", event.event_type(), path.display());
		self.runner.run_file(path).await
	}
}
