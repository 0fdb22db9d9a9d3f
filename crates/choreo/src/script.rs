//! Dance scripts
//!
//! A script is a list of lines, each either `<kind> <actor> <angle> <delay>`
//! or `wait <seconds>`. Reset lines may omit the angle.

mod listener;
mod runner;

pub use listener::{ScriptListener, SCRIPT_PATH_KEY};
pub use runner::ScriptRunner;

use crate::error::{ChoreoError, Result};
use crate::motion::{ActorId, Command};
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
	/// Hand a command to its actor and move on without waiting for it
	Dispatch(Command),
	/// Suspend the runner (not the actors) for this long
	Wait(Duration),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Script {
	instructions: Vec<Instruction>,
}

impl Script {
	pub fn new(instructions: Vec<Instruction>) -> Self {
		Self { instructions }
	}

	/// Parse script text. Blank lines are skipped; any malformed line fails the whole script.
	pub fn parse(text: &str) -> Result<Self> {
		let mut instructions = Vec::new();

		for (idx, line) in text.lines().enumerate() {
			let line_no = idx + 1;
			let fields: Vec<&str> = line.split_whitespace().collect();

			let instruction = match fields.as_slice() {
				[] => continue,
				["wait", duration] => Instruction::Wait(parse_wait(duration).map_err(|m| ChoreoError::parse(line_no, m))?),
				["wait", ..] => return Err(ChoreoError::parse(line_no, format!("wait expects one duration, got {} fields", fields.len() - 1))),
				[kind, actor, rest @ ..] => {
					let actor: ActorId = actor.parse().map_err(|_| ChoreoError::parse(line_no, format!("actor '{actor}' is not a non-negative integer")))?;
					Instruction::Dispatch(Command::from_fields(actor, kind, rest).map_err(|m| ChoreoError::parse(line_no, m))?)
				}
				[kind] => return Err(ChoreoError::parse(line_no, format!("'{kind}' is missing its actor"))),
			};
			instructions.push(instruction);
		}

		Ok(Self { instructions })
	}

	pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
		let text = tokio::fs::read_to_string(path).await?;
		Self::parse(&text)
	}

	pub fn instructions(&self) -> &[Instruction] {
		&self.instructions
	}

	pub fn len(&self) -> usize {
		self.instructions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.instructions.is_empty()
	}

	/// Every actor the script sends a command to
	pub fn actors(&self) -> BTreeSet<ActorId> {
		self
			.instructions
			.iter()
			.filter_map(|instruction| match instruction {
				Instruction::Dispatch(command) => Some(command.actor),
				Instruction::Wait(_) => None,
			})
			.collect()
	}

	/// Sum of all waits; a lower bound on how long the script runs
	pub fn total_wait(&self) -> Duration {
		self
			.instructions
			.iter()
			.filter_map(|instruction| match instruction {
				Instruction::Wait(duration) => Some(*duration),
				Instruction::Dispatch(_) => None,
			})
			.fold(Duration::ZERO, Duration::saturating_add)
	}
}

fn parse_wait(raw: &str) -> std::result::Result<Duration, String> {
	match raw.parse::<f64>() {
		Ok(seconds) if seconds.is_finite() && seconds >= 0.0 => Duration::try_from_secs_f64(seconds).map_err(|e| format!("wait duration '{raw}' is out of range: {e}")),
		_ => Err(format!("wait duration '{raw}' is not a non-negative number")),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::motion::MotionKind;
	use std::io::Write;

	const ROUTINE: &str = "\
lean 0 20 1.0
turn_and_twist 1 15 0.5
wait 2

reset 0 0 0
reset 1 1.5
wait 0.25
";

	#[test]
	fn test_parse_routine() {
		let script = Script::parse(ROUTINE).unwrap();
		assert_eq!(
			script.instructions(),
			&[
				Instruction::Dispatch(Command::new(0, MotionKind::Lean, 20.0, 1.0)),
				Instruction::Dispatch(Command::new(1, MotionKind::TurnAndTwist, 15.0, 0.5)),
				Instruction::Wait(Duration::from_secs(2)),
				Instruction::Dispatch(Command::reset(0, 0.0)),
				Instruction::Dispatch(Command::reset(1, 1.5)),
				Instruction::Wait(Duration::from_millis(250)),
			]
		);
		assert_eq!(script.actors().into_iter().collect::<Vec<_>>(), vec![0, 1]);
		assert_eq!(script.total_wait(), Duration::from_millis(2250));
	}

	#[test]
	fn test_malformed_lines_report_line_number() {
		let cases = [
			("lean 0 20 1\nwait\n", 2),
			("lean 0 20 1\nwait 1 2\n", 2),
			("wait -1\n", 1),
			("lean 0 20 1\nwait 1e20\n", 2),
			("lean 0 20 1e30\n", 1),
			("lean\n", 1),
			("\n\nlean x 20 1\n", 3),
			("lean 0 20\n", 1),
			("moonwalk 0 20 1\n", 1),
			("tilt 2 abc 1\n", 1),
		];

		for (text, expected_line) in cases {
			match Script::parse(text) {
				Err(ChoreoError::Parse { line, .. }) => assert_eq!(line, expected_line, "{text:?}"),
				other => panic!("expected parse error for {text:?}, got {other:?}"),
			}
		}
	}

	#[test]
	fn test_total_wait_saturates() {
		let script = Script::new(vec![Instruction::Wait(Duration::MAX), Instruction::Wait(Duration::from_secs(1))]);
		assert_eq!(script.total_wait(), Duration::MAX);
	}

	#[test]
	fn test_empty_script() {
		let script = Script::parse("\n   \n").unwrap();
		assert!(script.is_empty());
		assert!(script.actors().is_empty());
	}

	#[tokio::test]
	async fn test_load_from_disk() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		file.write_all(ROUTINE.as_bytes()).unwrap();

		let script = Script::load(file.path()).await.unwrap();
		assert_eq!(script.len(), 6);
	}
}
