//! Event-driven choreography for a small ensemble of four-axis actors.
//!
//! A [`Timeline`] turns wall-clock offsets into [`Event`]s, an
//! [`EventDispatcher`] delivers them in bounded batches, and listeners such as
//! [`ScriptListener`] play dance scripts on an [`Ensemble`] of per-actor
//! motion controllers. [`Show`] ties the loop together.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod motion;
pub mod script;
pub mod show;
pub mod timeline;
pub mod timeline_file;
pub mod transport;

pub use config::{DispatcherConfig, OverflowPolicy, ShowConfig};
pub use dispatcher::{EventDispatcher, EventListener, HandleReport};
pub use error::{ChoreoError, Result};
pub use event::{Details, Event, TIMELINE_SOURCE};
pub use motion::{ActorId, ActorStatus, Command, Ensemble, MotionKind, Pose};
pub use script::{Instruction, Script, ScriptListener, ScriptRunner, SCRIPT_PATH_KEY};
pub use show::{Show, ShowSummary};
pub use timeline::{Timeline, Waypoint};
pub use timeline_file::{TimelineFile, WaypointData};
pub use transport::{InMemTransport, PoseTransport, PoseUpdate, TracingTransport};
