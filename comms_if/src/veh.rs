//! # Vehicle State Communications Module
//!
//! Messages describing the vehicle and its surroundings, as streamed by the vehicle interface, and
//! the traffic waypoint signal sent back to the planner.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::convert::TryFrom;

use nalgebra::{UnitQuaternion, Vector2, Vector3};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The current pose (position and attitude in the map frame) of the vehicle.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pose {
    /// The position in the map frame
    pub position_m: Vector3<f64>,

    /// The attitude of the vehicle in the map frame. This is a quaternion that will rotate an
    /// object from the map frame into the vehicle body frame.
    pub attitude_q: UnitQuaternion<f64>,
}

/// A single point on the vehicle's base path.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq)]
pub struct Waypoint {
    /// The position in the map frame
    pub position_m: Vector3<f64>,

    /// Heading of the path at this point (angle to the +ve x axis)
    pub heading_rad: f64,

    /// Target linear velocity at this point
    pub velocity_ms: f64,
}

/// The base path, delivered once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lane {
    /// Ordered waypoints in the direction of travel
    pub waypoints: Vec<Waypoint>,
}

/// A traffic light as observed by the vehicle.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrafficLight {
    /// Position of the light fixture in the map frame
    pub position_m: Vector3<f64>,

    /// The colour the light reports for itself. Only available in simulation.
    pub state: LightState,
}

/// The signal sent to the planner, a waypoint index with the urgency encoded in its sign.
///
/// - `n >= 0`: red light, stop at waypoint `n`
/// - `n < 0` and `n != -num_waypoints`: yellow light at waypoint `-n`
/// - `n == -num_waypoints`: no red or yellow light ahead
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrafficWaypoint(pub i32);

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Colour of a traffic light.
///
/// Carried on the wire as the simulator's numeric id, see [`LightState::id`].
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "u8", into = "u8")]
pub enum LightState {
    Red,
    Yellow,
    Green,
    Unknown,
}

/// Data streamed by the vehicle interface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum VehData {
    /// The latest vehicle pose
    Pose(Pose),

    /// The complete set of currently observed traffic lights, replacing any previous set
    TrafficLights(Vec<TrafficLight>),
}

#[derive(Debug, thiserror::Error)]
#[error("{0} is not a valid traffic light state id")]
pub struct InvalidLightStateId(pub u8);

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Pose {
    /// Create a new pose at the given position with no rotation
    pub fn from_position(position_m: Vector3<f64>) -> Self {
        Self {
            position_m,
            attitude_q: UnitQuaternion::identity(),
        }
    }

    /// Return the position of the vehicle in the XY plane
    pub fn position2(&self) -> Vector2<f64> {
        self.position_m.xy()
    }

    /// Return the heading (angle to the positive X axis) of the vehicle in radians.
    pub fn get_heading(&self) -> f64 {
        self.attitude_q.euler_angles().2
    }
}

impl Waypoint {
    /// Return the position of the waypoint in the XY plane
    pub fn position2(&self) -> Vector2<f64> {
        self.position_m.xy()
    }
}

impl LightState {
    /// Numeric id of the state as used by the simulator (RED = 0, YELLOW = 1, GREEN = 2,
    /// UNKNOWN = 4).
    pub fn id(&self) -> u8 {
        match self {
            LightState::Red => 0,
            LightState::Yellow => 1,
            LightState::Green => 2,
            LightState::Unknown => 4,
        }
    }
}

impl From<LightState> for u8 {
    fn from(state: LightState) -> Self {
        state.id()
    }
}

impl TryFrom<u8> for LightState {
    type Error = InvalidLightStateId;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        match id {
            0 => Ok(LightState::Red),
            1 => Ok(LightState::Yellow),
            2 => Ok(LightState::Green),
            4 => Ok(LightState::Unknown),
            i => Err(InvalidLightStateId(i)),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_light_state_ids() {
        for state in &[
            LightState::Red,
            LightState::Yellow,
            LightState::Green,
            LightState::Unknown,
        ] {
            assert_eq!(LightState::try_from(state.id()).unwrap(), *state);
        }

        assert!(LightState::try_from(3).is_err());
    }

    #[test]
    fn test_veh_data_json() {
        let msg = r#"{"TrafficLights": [
            {"position_m": [1.0, 2.0, 5.0], "state": 0},
            {"position_m": [3.0, 4.0, 5.0], "state": 2}
        ]}"#;

        match serde_json::from_str::<VehData>(msg).unwrap() {
            VehData::TrafficLights(lights) => {
                assert_eq!(lights.len(), 2);
                assert_eq!(lights[0].state, LightState::Red);
                assert_eq!(lights[1].position_m, Vector3::new(3.0, 4.0, 5.0));
            }
            d => panic!("Expected traffic lights, got {:?}", d),
        }
    }

    #[test]
    fn test_light_state_json() {
        assert_eq!(serde_json::to_string(&LightState::Unknown).unwrap(), "4");
        assert_eq!(
            serde_json::from_str::<LightState>("1").unwrap(),
            LightState::Yellow
        );
        assert!(serde_json::from_str::<LightState>("3").is_err());
        assert!(serde_json::from_str::<LightState>("\"Red\"").is_err());
    }

    #[test]
    fn test_traffic_waypoint_json() {
        assert_eq!(serde_json::to_string(&TrafficWaypoint(-42)).unwrap(), "-42");
    }

    #[test]
    fn test_pose_position2() {
        let pose = Pose::from_position(Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(pose.position2(), Vector2::new(1.0, 2.0));
        assert_eq!(pose.get_heading(), 0.0);
    }
}
