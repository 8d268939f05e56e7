//! # Communications interface crate.
//!
//! Provides all common communications interfaces for the software.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Request and response definitions for equipment (camera, light classifier)
pub mod eqpt;

/// Network module
pub mod net;

/// Vehicle state messages (pose, path waypoints, traffic lights, traffic waypoint)
pub mod veh;
