//! # Traffic Light Selection
//!
//! Picks the observed traffic light belonging to a stop line.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::veh::{TrafficLight, Waypoint};
use util::maths::norm;

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Select the light closest to the stop line waypoint `stop_wp`.
///
/// Distance is measured in 3D since light fixtures are raised above the road. Returns the index of
/// the light in `lights` and its distance, or `None` if `lights` is empty. If two lights are the
/// same distance away the first is chosen.
///
/// The set of lights is only ever a handful of entries so a linear scan is used.
pub fn select_light(stop_wp: &Waypoint, lights: &[TrafficLight]) -> Option<(usize, f64)> {
    let mut closest: Option<(usize, f64)> = None;

    for (i, light) in lights.iter().enumerate() {
        let dist = match norm(stop_wp.position_m.as_slice(), light.position_m.as_slice()) {
            Some(d) if !d.is_nan() => d,
            _ => continue,
        };

        if closest.map_or(true, |(_, closest_dist)| dist < closest_dist) {
            closest = Some((i, dist));
        }
    }

    closest
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
