//! # Traffic Signal Encoding
//!
//! Converts the result of a decision cycle into the traffic waypoint published to the planner, and
//! optionally debounces it.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::veh::{LightState, TrafficWaypoint};
use serde::Serialize;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Result of a single decision cycle: the stop line waypoint and the colour of its light.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Decision {
    pub wp_index: usize,
    pub state: LightState,
}

/// Requires a signal to be seen a number of times in a row before it is acted on.
#[derive(Debug, Clone)]
pub struct Debouncer {
    /// Number of consecutive identical observations needed
    threshold: u32,

    /// Most recent observation and how many times in a row it has been seen
    candidate: Option<(TrafficSignal, u32)>,

    /// The last signal which met the threshold
    stable: TrafficSignal,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// What the planner is told about the road ahead.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum TrafficSignal {
    /// Red light, stop at the waypoint
    Stop { wp: usize },

    /// Yellow light at the waypoint
    Caution { wp: usize },

    /// No red or yellow light ahead
    Clear,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for TrafficSignal {
    fn default() -> Self {
        TrafficSignal::Clear
    }
}

impl From<Option<Decision>> for TrafficSignal {
    fn from(decision: Option<Decision>) -> Self {
        match decision {
            Some(Decision {
                wp_index,
                state: LightState::Red,
            }) => TrafficSignal::Stop { wp: wp_index },
            Some(Decision {
                wp_index,
                state: LightState::Yellow,
            }) => TrafficSignal::Caution { wp: wp_index },
            _ => TrafficSignal::Clear,
        }
    }
}

impl TrafficSignal {
    /// Encode the signal into a single integer for a path of `num_wps` waypoints.
    ///
    /// - `Stop` is the waypoint index
    /// - `Caution` is the negated waypoint index
    /// - `Clear` is `-num_wps`
    ///
    /// A caution at waypoint 0 encodes to 0 and so reads as a stop at waypoint 0. The encoding has
    /// no way to represent it differently.
    pub fn encode(&self, num_wps: usize) -> TrafficWaypoint {
        match *self {
            TrafficSignal::Stop { wp } => TrafficWaypoint(wp as i32),
            TrafficSignal::Caution { wp } => TrafficWaypoint(-(wp as i32)),
            TrafficSignal::Clear => TrafficWaypoint(-(num_wps as i32)),
        }
    }
}

impl Debouncer {
    /// Create a new debouncer which starts out clear.
    ///
    /// A threshold of 0 or 1 passes every signal through immediately.
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            candidate: None,
            stable: TrafficSignal::Clear,
        }
    }

    /// Feed the latest signal in, returning the signal to act on.
    pub fn update(&mut self, signal: TrafficSignal) -> TrafficSignal {
        let count = match self.candidate {
            Some((s, n)) if s == signal => n.saturating_add(1),
            _ => 1,
        };
        self.candidate = Some((signal, count));

        if count >= self.threshold {
            self.stable = signal;
        }

        self.stable
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn decision(wp_index: usize, state: LightState) -> Option<Decision> {
        Some(Decision { wp_index, state })
    }

    #[test]
    fn test_encode() {
        let n = 10902;

        assert_eq!(
            TrafficSignal::from(decision(42, LightState::Red)).encode(n),
            TrafficWaypoint(42)
        );
        assert_eq!(
            TrafficSignal::from(decision(42, LightState::Yellow)).encode(n),
            TrafficWaypoint(-42)
        );
        assert_eq!(TrafficSignal::from(None).encode(n), TrafficWaypoint(-10902));
    }

    #[test]
    fn test_green_and_unknown_are_clear() {
        assert_eq!(
            TrafficSignal::from(decision(42, LightState::Green)),
            TrafficSignal::Clear
        );
        assert_eq!(
            TrafficSignal::from(decision(42, LightState::Unknown)),
            TrafficSignal::Clear
        );
    }

    #[test]
    fn test_zero_waypoint() {
        // Stop and caution are indistinguishable at waypoint 0
        assert_eq!(TrafficSignal::Stop { wp: 0 }.encode(100), TrafficWaypoint(0));
        assert_eq!(TrafficSignal::Caution { wp: 0 }.encode(100), TrafficWaypoint(0));
    }

    #[test]
    fn test_debounce() {
        let stop = TrafficSignal::Stop { wp: 6 };
        let mut db = Debouncer::new(3);

        assert_eq!(db.update(stop), TrafficSignal::Clear);
        assert_eq!(db.update(stop), TrafficSignal::Clear);
        assert_eq!(db.update(stop), stop);

        // A single different observation doesn't change the output
        assert_eq!(db.update(TrafficSignal::Clear), stop);
        assert_eq!(db.update(stop), stop);
        assert_eq!(db.update(TrafficSignal::Clear), stop);
        assert_eq!(db.update(TrafficSignal::Clear), stop);
        assert_eq!(db.update(TrafficSignal::Clear), TrafficSignal::Clear);
    }

    #[test]
    fn test_debounce_pass_through() {
        let mut db = Debouncer::new(1);
        let caution = TrafficSignal::Caution { wp: 3 };

        assert_eq!(db.update(caution), caution);
        assert_eq!(db.update(TrafficSignal::Clear), TrafficSignal::Clear);
    }
}
