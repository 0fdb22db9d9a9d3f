use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChoreoError>;

#[derive(Debug, Error)]
pub enum ChoreoError {
	#[error("Timeline has not been started; call start() before tick()")]
	NotStarted,

	#[error("Duplicate waypoint: {0}")]
	DuplicateWaypoint(String),

	#[error("Invalid waypoint: {0}")]
	InvalidWaypoint(String),

	#[error("Parse error on line {line}: {message}")]
	Parse { line: usize, message: String },

	#[error("Unknown motion: {0}")]
	UnknownMotion(String),

	#[error("Invalid command: {0}")]
	InvalidCommand(String),

	#[error("Unknown actor {actor} (ensemble has {size} actors)")]
	UnknownActor { actor: usize, size: usize },

	#[error("Listener failed: {0}")]
	Listener(String),

	#[error("Transport error: {0}")]
	Transport(String),

	#[error("Actor {0} controller is no longer running")]
	ActorClosed(usize),

	#[error("Invalid configuration: {0}")]
	InvalidConfig(String),

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Serialization error: {0}")]
	Json(#[from] serde_json::Error),
}

impl ChoreoError {
	/// Errors the show loop may log and continue past.
	pub fn is_recoverable(&self) -> bool {
		matches!(self, Self::Transport(_))
	}

	pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
		Self::Parse { line, message: message.into() }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_fail_fast_errors_are_not_recoverable() {
		assert!(!ChoreoError::NotStarted.is_recoverable());
		assert!(!ChoreoError::parse(3, "bad").is_recoverable());
		assert!(!ChoreoError::Listener("boom".into()).is_recoverable());
		assert!(ChoreoError::Transport("closed".into()).is_recoverable());
	}

	#[test]
	fn test_parse_error_message_carries_line() {
		let err = ChoreoError::parse(7, "expected 4 fields");
		assert_eq!(err.to_string(), "Parse error on line 7: expected 4 fields");
	}
}
