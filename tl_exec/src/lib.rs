//! # Traffic light library.
//!
//! This library allows other crates in the workspace to access items defined inside the traffic
//! light crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Camera client - receives frames from the vehicle's camera stream
pub mod cam_client;

/// Classifier client - asks the classification server for the state of a light
pub mod classifier_client;

/// Traffic light detector - decides if and where the vehicle must stop for a light
pub mod tl_detector;

/// Traffic waypoint server - publishes the detector's output to the planner
pub mod traffic_wp_server;

/// Vehicle client - receives the vehicle pose and observed traffic lights
pub mod veh_client;

/// Waypoint client - receives the base path
pub mod waypoint_client;
