//! # Stop Line Association
//!
//! Maps the configured stop lines onto the base path and finds the next one ahead of the vehicle.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::debug;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use super::waypoint_index::WaypointIndex;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Associates stop lines with the path waypoints nearest to them.
///
/// Stop lines and the path are both fixed for the run, so the waypoint of each stop line is
/// computed once on construction.
#[derive(Debug, Clone)]
pub struct StopLineAssociator {
    /// Waypoint index nearest to each stop line, in configuration order
    stop_wps: Vec<usize>,

    /// Number of waypoints in the path
    num_wps: usize,

    /// How many waypoints behind the vehicle a stop line may be and still count as ahead
    tolerance_wps: usize,

    policy: AheadPolicy,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// How "ahead of the vehicle" is decided.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum AheadPolicy {
    /// A stop line is ahead if `stop_wp > car_wp - tolerance`. Stop lines past the end of a
    /// closed loop are not seen until the vehicle wraps around.
    Linear,

    /// Indices are compared modulo the path length, so the first stop line after the end of a
    /// closed loop is found while the vehicle is still approaching the end.
    Modulo,
}

#[derive(Debug, thiserror::Error)]
pub enum StopLineError {
    #[error("No stop line positions were provided")]
    NoStopLines,

    #[error("Stop line {0} at {1:?} is not a finite position")]
    InvalidPosition(usize, [f64; 2]),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for AheadPolicy {
    fn default() -> Self {
        AheadPolicy::Linear
    }
}

impl StopLineAssociator {
    /// Create a new associator for the given stop line positions.
    pub fn new(
        index: &WaypointIndex,
        stop_line_positions: &[[f64; 2]],
        tolerance_wps: usize,
        policy: AheadPolicy,
    ) -> Result<Self, StopLineError> {
        if stop_line_positions.is_empty() {
            return Err(StopLineError::NoStopLines);
        }

        let mut stop_wps = Vec::with_capacity(stop_line_positions.len());

        for (i, pos) in stop_line_positions.iter().enumerate() {
            let stop_wp = index
                .query_nearest(&Vector2::new(pos[0], pos[1]))
                .ok_or(StopLineError::InvalidPosition(i, *pos))?;

            debug!("Stop line {} at {:?} -> waypoint {}", i, pos, stop_wp);

            stop_wps.push(stop_wp);
        }

        Ok(Self {
            stop_wps,
            num_wps: index.len(),
            tolerance_wps,
            policy,
        })
    }

    /// Waypoint index of each stop line, in configuration order
    pub fn stop_wps(&self) -> &[usize] {
        &self.stop_wps
    }

    /// Find the waypoint of the nearest stop line ahead of the vehicle at `car_wp`.
    ///
    /// Returns `None` if no stop line is ahead.
    pub fn next_stop_wp(&self, car_wp: usize) -> Option<usize> {
        let threshold = car_wp as i64 - self.tolerance_wps as i64;

        match self.policy {
            AheadPolicy::Linear => self
                .stop_wps
                .iter()
                .copied()
                .filter(|&stop_wp| stop_wp as i64 > threshold)
                .min(),
            AheadPolicy::Modulo => self
                .stop_wps
                .iter()
                .copied()
                .map(|stop_wp| {
                    let offset =
                        util::maths::cyclic_offset(threshold, stop_wp as i64, self.num_wps as i64);
                    (offset, stop_wp)
                })
                .filter(|&(offset, _)| offset > 0)
                .min()
                .map(|(_, stop_wp)| stop_wp),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
