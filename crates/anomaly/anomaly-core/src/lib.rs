//! Anomaly Scoring Core
//!
//! Feature extraction, standardization, the isolation forest, the three
//! detectors and the engine that ties them to a trained, persisted state.

mod dropoff;
mod engine;
mod features;
mod inactivity;
mod isolation_forest;
mod normalizer;
mod persistence;
mod route_deviation;
mod shared;
mod state;

pub use dropoff::*;
pub use engine::*;
pub use features::*;
pub use inactivity::*;
pub use isolation_forest::*;
pub use normalizer::*;
pub use persistence::*;
pub use route_deviation::*;
pub use shared::*;
pub use state::*;
