//! # Traffic Light Detector
//!
//! Decides, once per camera frame, whether the vehicle needs to stop at a traffic light ahead and
//! produces the traffic waypoint sent to the planner.
//!
//! Each cycle:
//! 1. Finds the waypoint closest to the vehicle.
//! 2. Finds the next stop line ahead of it.
//! 3. Selects the observed light closest to that stop line.
//! 4. Resolves the colour of the light.
//! 5. Encodes the stop line waypoint and colour into the traffic waypoint.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod params;
pub mod registers;
pub mod resolver;
pub mod selector;
pub mod signal;
mod state;
pub mod stop_line;
pub mod waypoint_index;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use params::*;
pub use registers::InputRegisters;
pub use resolver::{
    ClassifierResolver, GroundTruthResolver, LightClassifier, LightStateResolver, ResolveError,
};
pub use signal::{Decision, TrafficSignal};
pub use state::*;
pub use stop_line::AheadPolicy;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use stop_line::StopLineError;
use util::kdtree::KdTreeError;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors preventing the detector from being created. These are fatal.
#[derive(Debug, thiserror::Error)]
pub enum TlDetectorInitError {
    #[error("Could not build the waypoint index: {0}")]
    Index(KdTreeError),

    #[error("Could not associate the stop lines with the path: {0}")]
    StopLines(StopLineError),

    #[error("The path has {0} waypoints, more than can be encoded in a traffic waypoint")]
    PathTooLong(usize),
}

/// Reasons a cycle was aborted without producing a traffic waypoint.
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum TlDetectorError {
    #[error("No vehicle pose has been received yet")]
    MissingPose,

    #[error("The vehicle pose is not a finite position")]
    InvalidPose,

    #[error("The light state could not be classified: {0}")]
    ClassificationUnavailable(ResolveError),
}
