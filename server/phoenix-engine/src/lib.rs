//! Phoenix Incident Decision Engine — deterministic, rule-based.
//!
//! Learns per-signal baselines, scores deviations, groups them by downstream
//! topology reachability inside a time window, and escalates groups to
//! incidents under a global cooldown.
//!
//! No DB, no network; pure computation + in-memory state.

pub mod baseline;
pub mod clock;
pub mod config;
pub mod correlation;
pub mod deviation;
pub mod engine;
pub mod error;
pub mod incident;
pub mod normalize;
pub mod topology;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use engine::Engine;
pub use error::EngineError;
pub use topology::Topology;
pub use types::{Deviation, DeviationLevel, Incident, Observation, Severity};
