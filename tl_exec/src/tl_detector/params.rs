//! Parameters structure for the traffic light detector

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

use super::stop_line::AheadPolicy;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters for the traffic light detector.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {
    // ---- MAP ----
    /// Position of each stop line in the map frame.
    ///
    /// Units: meters,
    /// Frame: Map
    pub stop_line_positions: Vec<[f64; 2]>,

    // ---- CLASSIFICATION ----
    /// If true the self-reported state of each light is used instead of the classifier. Only
    /// valid in simulation.
    #[serde(default)]
    pub use_truth: bool,

    /// Name of the classifier the classification server should use
    #[serde(default = "default_classifier_name")]
    pub classifier_name: String,

    // ---- DECISION ----
    /// Number of waypoints a stop line may be behind the vehicle and still count as ahead.
    #[serde(default = "default_ahead_tolerance_wps")]
    pub ahead_tolerance_wps: usize,

    /// How waypoint indices are compared when deciding if a stop line is ahead
    #[serde(default)]
    pub ahead_policy: AheadPolicy,

    /// If set, the number of consecutive cycles a signal must be seen for before it is
    /// published. If not set every cycle's signal is published immediately.
    #[serde(default)]
    pub debounce_count: Option<u32>,
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn default_classifier_name() -> String {
    String::from("sim")
}

fn default_ahead_tolerance_wps() -> usize {
    5
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
