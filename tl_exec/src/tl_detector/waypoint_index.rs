//! # Waypoint Index
//!
//! Nearest neighbour lookups over the base path.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::veh::Waypoint;
use nalgebra::Vector2;
use util::kdtree::{KdTree, KdTreeError};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A static spatial index over the waypoints of the base path.
///
/// The path is immutable for the lifetime of the index, so the index is never rebuilt.
pub struct WaypointIndex {
    waypoints: Vec<Waypoint>,

    tree: KdTree,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl WaypointIndex {
    /// Build the index over the given ordered path.
    ///
    /// An empty path is rejected.
    pub fn build(waypoints: Vec<Waypoint>) -> Result<Self, KdTreeError> {
        let tree = KdTree::new(waypoints.iter().map(|wp| wp.position2()).collect())?;

        Ok(Self { waypoints, tree })
    }

    /// Get the index of the waypoint closest to `point` in the XY plane.
    ///
    /// Ties are broken by the lowest index. `None` is returned if `point` is not finite.
    pub fn query_nearest(&self, point: &Vector2<f64>) -> Option<usize> {
        self.tree.nearest(point).map(|(index, _)| index)
    }

    /// Get the waypoint at the given path index
    pub fn waypoint(&self, index: usize) -> Option<&Waypoint> {
        self.waypoints.get(index)
    }

    /// Number of waypoints in the path
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Always false, an index cannot be built over an empty path
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use nalgebra::Vector3;

    use super::*;

    /// A closed loop of waypoints around a circle
    fn loop_path(num: usize, radius_m: f64) -> Vec<Waypoint> {
        (0..num)
            .map(|i| {
                let theta = i as f64 / num as f64 * std::f64::consts::TAU;
                Waypoint {
                    position_m: Vector3::new(radius_m * theta.cos(), radius_m * theta.sin(), 0.0),
                    heading_rad: theta + std::f64::consts::FRAC_PI_2,
                    velocity_ms: 11.0,
                }
            })
            .collect()
    }

    #[test]
    fn test_empty_path() {
        assert!(matches!(
            WaypointIndex::build(Vec::new()),
            Err(KdTreeError::Empty)
        ));
    }

    #[test]
    fn test_query_on_waypoint() -> Result<(), KdTreeError> {
        let index = WaypointIndex::build(loop_path(360, 50.0))?;

        assert_eq!(index.len(), 360);
        for i in 0..index.len() {
            let point = index.waypoint(i).unwrap().position2();
            assert_eq!(index.query_nearest(&point), Some(i));
        }

        Ok(())
    }

    #[test]
    fn test_query_off_path() -> Result<(), KdTreeError> {
        let index = WaypointIndex::build(loop_path(4, 10.0))?;

        // Just outside waypoint 1 (at (0, 10))
        assert_eq!(index.query_nearest(&Vector2::new(0.5, 12.0)), Some(1));

        // Centre of the loop is equidistant to all waypoints
        assert_eq!(index.query_nearest(&Vector2::new(0.0, 0.0)), Some(0));

        Ok(())
    }

    #[test]
    fn test_height_ignored() -> Result<(), KdTreeError> {
        let mut path = loop_path(8, 10.0);
        path[3].position_m.z = 100.0;
        let index = WaypointIndex::build(path.clone())?;

        assert_eq!(index.query_nearest(&path[3].position2()), Some(3));

        Ok(())
    }
}
