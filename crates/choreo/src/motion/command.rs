use super::{ActorId, Pose};
use crate::error::{ChoreoError, Result};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Fixed controller update rate for interpolated motion
pub const CONTROL_RATE_HZ: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotionKind {
	Lean,
	Turn,
	Twist,
	Tilt,
	LeanAndTwist,
	LeanAndTilt,
	TurnAndTwist,
	TurnAndTilt,
	TiltInPlace,
	Reset,
}

impl MotionKind {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Lean => "lean",
			Self::Turn => "turn",
			Self::Twist => "twist",
			Self::Tilt => "tilt",
			Self::LeanAndTwist => "lean_and_twist",
			Self::LeanAndTilt => "lean_and_tilt",
			Self::TurnAndTwist => "turn_and_twist",
			Self::TurnAndTilt => "turn_and_tilt",
			Self::TiltInPlace => "tilt_in_place",
			Self::Reset => "reset",
		}
	}

	/// Goal pose for this motion starting from `current`. `Reset` ignores `angle`.
	pub fn goal(self, current: Pose, angle: f64) -> Pose {
		let [lean, turn, twist, tilt] = current.axes();
		Pose::new(match self {
			Self::Lean => [angle, turn, twist, tilt],
			Self::Turn => [lean, angle, twist, tilt],
			Self::Twist => [lean, turn, angle, tilt],
			Self::Tilt | Self::TiltInPlace => [lean, turn, twist, angle],
			Self::LeanAndTwist => [angle, turn, angle, tilt],
			Self::LeanAndTilt => [angle, turn, twist, -angle],
			Self::TurnAndTwist => [lean, angle, -angle, tilt],
			Self::TurnAndTilt => [lean, angle, twist, angle],
			Self::Reset => [0.0; 4],
		})
	}
}

impl FromStr for MotionKind {
	type Err = ChoreoError;

	fn from_str(s: &str) -> Result<Self> {
		Ok(match s {
			"lean" => Self::Lean,
			"turn" => Self::Turn,
			"twist" => Self::Twist,
			"tilt" => Self::Tilt,
			"lean_and_twist" => Self::LeanAndTwist,
			"lean_and_tilt" => Self::LeanAndTilt,
			"turn_and_twist" => Self::TurnAndTwist,
			"turn_and_tilt" => Self::TurnAndTilt,
			"tilt_in_place" => Self::TiltInPlace,
			"reset" => Self::Reset,
			other => return Err(ChoreoError::UnknownMotion(other.to_string())),
		})
	}
}

impl fmt::Display for MotionKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A motion addressed to one actor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Command {
	pub actor: ActorId,
	pub kind: MotionKind,
	pub angle: Option<f64>,
	pub delay_seconds: f64,
}

impl Command {
	pub fn new(actor: ActorId, kind: MotionKind, angle: f64, delay_seconds: f64) -> Self {
		let angle = (kind != MotionKind::Reset).then_some(angle);
		Self {
			actor,
			kind,
			angle,
			delay_seconds,
		}
	}

	pub fn reset(actor: ActorId, delay_seconds: f64) -> Self {
		Self {
			actor,
			kind: MotionKind::Reset,
			angle: None,
			delay_seconds,
		}
	}

	pub fn goal(&self, current: Pose) -> Pose {
		self.kind.goal(current, self.angle.unwrap_or_default())
	}

	/// Parse inbound command text: `"<kind> <angle> <delay>"`, or for reset
	/// `"reset <delay>"` / `"reset <ignored> <delay>"`.
	pub fn parse_text(actor: ActorId, text: &str) -> Result<Self> {
		let fields: Vec<&str> = text.split_whitespace().collect();
		let (kind, rest) = fields.split_first().ok_or_else(|| ChoreoError::InvalidCommand("empty command".to_string()))?;
		Self::from_fields(actor, kind, rest).map_err(ChoreoError::InvalidCommand)
	}

	/// Shared by inbound text and script lines; `rest` is everything after the kind
	pub(crate) fn from_fields(actor: ActorId, kind: &str, rest: &[&str]) -> std::result::Result<Self, String> {
		let kind: MotionKind = kind.parse().map_err(|e: ChoreoError| e.to_string())?;

		let (angle, delay) = match (kind, rest) {
			(MotionKind::Reset, [delay] | [_, delay]) => (None, *delay),
			(MotionKind::Reset, _) => return Err(format!("reset expects '[angle] <delay>', got {} fields", rest.len())),
			(_, [angle, delay]) => (Some(parse_number("angle", angle)?), *delay),
			(_, _) => return Err(format!("{kind} expects '<angle> <delay>', got {} fields", rest.len())),
		};

		let delay_seconds = parse_number("delay", delay)?;
		if delay_seconds < 0.0 {
			return Err(format!("delay must not be negative, got {delay_seconds}"));
		}
		if delay_seconds * CONTROL_RATE_HZ > f64::from(u32::MAX) || Duration::try_from_secs_f64(delay_seconds).is_err() {
			return Err(format!("delay {delay_seconds}s is too long to ramp"));
		}

		Ok(Self {
			actor,
			kind,
			angle,
			delay_seconds,
		})
	}
}

fn parse_number(field: &str, raw: &str) -> std::result::Result<f64, String> {
	match raw.parse::<f64>() {
		Ok(value) if value.is_finite() => Ok(value),
		_ => Err(format!("{field} '{raw}' is not a finite number")),
	}
}

/// Number of 10 Hz control steps a ramp of `delay_seconds` takes. Zero means
/// the goal is applied immediately.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn ramp_steps(delay_seconds: f64) -> u32 {
	if delay_seconds <= 0.0 {
		return 0;
	}
	(delay_seconds * CONTROL_RATE_HZ).floor() as u32
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_goal_table() {
		let cs = Pose::new([1.0, 2.0, 3.0, 4.0]);
		let cases = [
			(MotionKind::Lean, [9.0, 2.0, 3.0, 4.0]),
			(MotionKind::Turn, [1.0, 9.0, 3.0, 4.0]),
			(MotionKind::Twist, [1.0, 2.0, 9.0, 4.0]),
			(MotionKind::Tilt, [1.0, 2.0, 3.0, 9.0]),
			(MotionKind::LeanAndTwist, [9.0, 2.0, 9.0, 4.0]),
			(MotionKind::LeanAndTilt, [9.0, 2.0, 3.0, -9.0]),
			(MotionKind::TurnAndTwist, [1.0, 9.0, -9.0, 4.0]),
			(MotionKind::TurnAndTilt, [1.0, 9.0, 3.0, 9.0]),
			(MotionKind::TiltInPlace, [1.0, 2.0, 3.0, 9.0]),
			(MotionKind::Reset, [0.0, 0.0, 0.0, 0.0]),
		];

		for (kind, expected) in cases {
			assert_eq!(kind.goal(cs, 9.0), Pose::new(expected), "{kind}");
		}
	}

	#[test]
	fn test_lean_and_tilt_mirrors_angle() {
		let command = Command::new(0, MotionKind::LeanAndTilt, 30.0, 0.0);
		assert_eq!(command.goal(Pose::new([0.0, 5.0, 0.0, 0.0])), Pose::new([30.0, 5.0, 0.0, -30.0]));
	}

	#[test]
	fn test_kind_round_trips_through_name() {
		for name in ["lean", "turn", "twist", "tilt", "lean_and_twist", "lean_and_tilt", "turn_and_twist", "turn_and_tilt", "tilt_in_place", "reset"] {
			assert_eq!(name.parse::<MotionKind>().unwrap().as_str(), name);
		}
		assert!(matches!("moonwalk".parse::<MotionKind>(), Err(ChoreoError::UnknownMotion(_))));
	}

	#[test]
	fn test_parse_text() {
		let command = Command::parse_text(2, "turn_and_tilt -15 1.5").unwrap();
		assert_eq!(command.actor, 2);
		assert_eq!(command.kind, MotionKind::TurnAndTilt);
		assert_eq!(command.angle, Some(-15.0));
		assert_eq!(command.delay_seconds, 1.5);
	}

	#[test]
	fn test_parse_reset_forms() {
		let short = Command::parse_text(0, "reset 2").unwrap();
		assert_eq!(short, Command::reset(0, 2.0));

		let with_placeholder = Command::parse_text(0, "reset 0 0.5").unwrap();
		assert_eq!(with_placeholder, Command::reset(0, 0.5));
	}

	#[test]
	fn test_parse_rejects_malformed_text() {
		for text in ["", "lean", "lean 10", "lean ten 1", "lean 10 soon", "lean 10 1 extra", "lean 10 -1", "reset", "wobble 1 1", "lean NaN 1", "lean 10 1e30", "reset 5e9"] {
			assert!(matches!(Command::parse_text(0, text), Err(ChoreoError::InvalidCommand(_))), "accepted '{text}'");
		}
	}

	#[test]
	fn test_reset_ignores_angle() {
		let command = Command::new(1, MotionKind::Reset, 45.0, 0.0);
		assert_eq!(command.angle, None);
		assert_eq!(command.goal(Pose::new([5.0, 5.0, 5.0, 5.0])), Pose::ZERO);
	}

	#[test]
	fn test_long_delays_within_step_range_parse() {
		let command = Command::parse_text(0, "lean 10 3600").unwrap();
		assert_eq!(ramp_steps(command.delay_seconds), 36_000);
	}

	#[test]
	fn test_ramp_steps() {
		assert_eq!(ramp_steps(0.0), 0);
		assert_eq!(ramp_steps(0.05), 0);
		assert_eq!(ramp_steps(0.1), 1);
		assert_eq!(ramp_steps(1.0), 10);
		assert_eq!(ramp_steps(1.25), 12);
		assert_eq!(ramp_steps(-3.0), 0);
	}
}
