use crate::error::Result;
use crate::event::Details;
use crate::timeline::{Timeline, Waypoint};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// On-disk waypoint record (entity/transport type)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaypointData {
	pub name: String,
	pub time_sec: f64,
	#[serde(default)]
	pub args: Details,
}

/// On-disk timeline document: `{"temporal_waypoints": [...]}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimelineFile {
	pub temporal_waypoints: Vec<WaypointData>,
}

impl TimelineFile {
	pub fn from_json(json: &str) -> Result<Self> {
		Ok(serde_json::from_str(json)?)
	}

	pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
		let json = tokio::fs::read_to_string(path).await?;
		Self::from_json(&json)
	}

	/// Build a timeline, rejecting duplicate keys and non-finite offsets
	pub fn into_timeline(self) -> Result<Timeline> {
		Timeline::new(self.temporal_waypoints.into_iter().map(Waypoint::from).collect())
	}
}

impl From<WaypointData> for Waypoint {
	fn from(data: WaypointData) -> Self {
		Self::new(data.name, data.time_sec).with_args(data.args)
	}
}

impl From<Waypoint> for WaypointData {
	fn from(waypoint: Waypoint) -> Self {
		Self {
			name: waypoint.name,
			time_sec: waypoint.offset_seconds,
			args: waypoint.args,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::ChoreoError;
	use std::io::Write;

	const THRILLER: &str = r#"{
		"temporal_waypoints": [
			{"name": "intro", "time_sec": 0.0, "args": {"script_path": "scripts/intro.txt"}},
			{"name": "concern", "time_sec": 12.5, "args": {"script_path": "scripts/concern.txt"}},
			{"name": "end", "time_sec": 40}
		]
	}"#;

	#[test]
	fn test_parse_timeline_document() {
		let file = TimelineFile::from_json(THRILLER).unwrap();
		assert_eq!(file.temporal_waypoints.len(), 3);
		assert!(file.temporal_waypoints[2].args.is_empty());

		let timeline = file.into_timeline().unwrap();
		assert_eq!(timeline.len(), 3);
		assert_eq!(timeline.waypoints()[1].offset_seconds, 12.5);
		assert_eq!(timeline.waypoints()[0].args.get("script_path").and_then(|v| v.as_str()), Some("scripts/intro.txt"));
	}

	#[test]
	fn test_duplicate_waypoints_fail_at_load() {
		let json = r#"{"temporal_waypoints": [
			{"name": "chorus", "time_sec": 30.0, "args": {}},
			{"name": "chorus", "time_sec": 30.0, "args": {}}
		]}"#;
		let err = TimelineFile::from_json(json).unwrap().into_timeline().unwrap_err();
		assert!(matches!(err, ChoreoError::DuplicateWaypoint(_)));
	}

	#[test]
	fn test_malformed_document_fails() {
		assert!(matches!(TimelineFile::from_json(r#"{"waypoints": []}"#), Err(ChoreoError::Json(_))));
		assert!(matches!(TimelineFile::from_json(r#"{"temporal_waypoints": [{"name": "x"}]}"#), Err(ChoreoError::Json(_))));
	}

	#[tokio::test]
	async fn test_load_from_disk() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		file.write_all(THRILLER.as_bytes()).unwrap();

		let loaded = TimelineFile::load(file.path()).await.unwrap();
		assert_eq!(loaded.temporal_waypoints[1].name, "concern");
	}

	#[tokio::test]
	async fn test_load_missing_file() {
		assert!(matches!(TimelineFile::load("/definitely/not/here.json").await, Err(ChoreoError::Io(_))));
	}
}
