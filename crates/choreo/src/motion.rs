//! Per-actor motion control
//!
//! Every actor owns a four-axis [`Pose`] and runs its own controller task. A
//! [`Command`] either writes its goal pose at once or ramps towards it at a
//! fixed 10 Hz control rate. Commands for one actor run strictly in order;
//! different actors move concurrently.

mod command;
mod controller;
mod ensemble;
mod pose;

pub use command::{ramp_steps, Command, MotionKind, CONTROL_RATE_HZ};
pub use controller::ActorStatus;
pub use ensemble::Ensemble;
pub use pose::Pose;

/// Index of an actor within its ensemble
pub type ActorId = usize;
