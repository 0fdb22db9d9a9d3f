use choreo::{DispatcherConfig, OverflowPolicy, ShowConfig};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Parser, Clone, Debug, Serialize, Deserialize)]
#[command(author, version, about = "Play a timeline of dance scripts on a robot ensemble", long_about = None)]
pub struct Config {
	#[arg(long, env = "TIMELINE_PATH", default_value = "timeline.json", help = "Timeline document with temporal_waypoints")]
	pub timeline: PathBuf,

	#[arg(long, env = "SCRIPT_ROOT", help = "Directory script_path details resolve against (defaults to the timeline's directory)")]
	pub script_root: Option<PathBuf>,

	#[arg(long, env = "ACTORS", default_value = "4", help = "Number of actors in the ensemble")]
	pub actors: usize,

	#[arg(long, env = "EVENTS_PER_TICK", default_value = "10", help = "Maximum events delivered per driver tick")]
	pub events_per_tick: usize,

	#[arg(long, env = "OVERFLOW_LIMIT", default_value = "100", help = "Pending events kept after a batch before trimming")]
	pub overflow_limit: usize,

	#[arg(long, env = "OVERFLOW_POLICY", default_value = "drop_newest", help = "Which events to drop on overflow: drop_newest or drop_oldest")]
	pub overflow_policy: OverflowPolicy,

	#[arg(long, env = "TICK_INTERVAL_MS", default_value = "10", help = "Driver loop period in milliseconds")]
	pub tick_interval_ms: u64,

	#[arg(long, env = "LOG_JSON", default_value_t = false, help = "Emit logs as JSON")]
	pub log_json: bool,

	#[arg(long, env = "RUST_LOG", default_value = "info", help = "Log filter directives")]
	pub rust_log: Option<String>,
}

impl Config {
	pub fn show_config(&self) -> ShowConfig {
		let dispatcher = DispatcherConfig::new(self.events_per_tick, self.overflow_limit).with_overflow_policy(self.overflow_policy);
		ShowConfig::new(self.actors).with_tick_interval(self.tick_interval_ms).with_dispatcher(dispatcher)
	}

	pub fn script_root(&self) -> PathBuf {
		self.script_root.clone().unwrap_or_else(|| self.timeline.parent().map_or_else(|| PathBuf::from("."), Path::to_path_buf))
	}
}
