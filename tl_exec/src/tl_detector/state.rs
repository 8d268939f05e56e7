//! Implementation of the traffic light detector state

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::Arc;

use comms_if::{
    eqpt::cam::CamImage,
    veh::{LightState, TrafficWaypoint, Waypoint},
};
use log::{debug, info, trace};
use serde::Serialize;

use super::{
    selector::select_light,
    signal::{Debouncer, Decision, TrafficSignal},
    stop_line::StopLineAssociator,
    waypoint_index::WaypointIndex,
    InputRegisters, LightStateResolver, Params, TlDetectorError, TlDetectorInitError,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The traffic light detector.
///
/// Owns the static path and stop line data, and the registers holding the latest inputs.
pub struct TlDetector {
    wp_index: WaypointIndex,

    stop_lines: StopLineAssociator,

    resolver: Box<dyn LightStateResolver + Send>,

    registers: InputRegisters,

    debouncer: Option<Debouncer>,
}

/// Status report for a completed detector cycle.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct StatusReport {
    /// Waypoint closest to the vehicle
    pub car_wp: usize,

    /// Waypoint of the next stop line ahead, if any
    pub stop_wp: Option<usize>,

    /// Index of the selected light in the light set, and its distance from the stop line
    pub light: Option<(usize, f64)>,

    /// Resolved state of the selected light
    pub light_state: Option<LightState>,

    /// Signal decided on this cycle, before debouncing
    pub signal: TrafficSignal,

    /// The value to publish
    pub traffic_wp: TrafficWaypoint,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TlDetector {
    /// Create a new detector for the given path.
    ///
    /// `resolver` decides how light states are found and is fixed for the life of the detector.
    pub fn new(
        params: Params,
        waypoints: Vec<Waypoint>,
        resolver: Box<dyn LightStateResolver + Send>,
    ) -> Result<Self, TlDetectorInitError> {
        if waypoints.len() > i32::MAX as usize {
            return Err(TlDetectorInitError::PathTooLong(waypoints.len()));
        }

        let wp_index = WaypointIndex::build(waypoints).map_err(TlDetectorInitError::Index)?;
        info!("Waypoint index built over {} waypoints", wp_index.len());

        let stop_lines = StopLineAssociator::new(
            &wp_index,
            &params.stop_line_positions,
            params.ahead_tolerance_wps,
            params.ahead_policy,
        )
        .map_err(TlDetectorInitError::StopLines)?;

        info!("Stop line association ({:?} policy):", params.ahead_policy);
        for (pos, wp) in params
            .stop_line_positions
            .iter()
            .zip(stop_lines.stop_wps())
        {
            info!("    ({:>9.2}, {:>9.2}) -> {}", pos[0], pos[1], wp);
        }

        let debouncer = match params.debounce_count {
            Some(n) => {
                info!("Debouncing signals over {} cycles", n);
                Some(Debouncer::new(n))
            }
            None => None,
        };

        Ok(Self {
            wp_index,
            stop_lines,
            resolver,
            registers: InputRegisters::new(),
            debouncer,
        })
    }

    /// Handle to the input registers, for producers to write into.
    pub fn registers(&self) -> InputRegisters {
        self.registers.clone()
    }

    /// Number of waypoints in the path
    pub fn num_waypoints(&self) -> usize {
        self.wp_index.len()
    }

    /// Waypoint of each stop line, in configuration order
    pub fn stop_line_wps(&self) -> &[usize] {
        self.stop_lines.stop_wps()
    }

    /// Process a newly arrived camera frame.
    ///
    /// The frame replaces the previous one and a decision cycle is run.
    pub fn proc(
        &mut self,
        frame: Arc<CamImage>,
    ) -> Result<(TrafficWaypoint, StatusReport), TlDetectorError> {
        self.registers.set_frame(frame);

        self.process_cycle()
    }

    /// Run a decision cycle on the current contents of the registers.
    ///
    /// Returns the traffic waypoint to publish, or an error if the cycle was aborted and nothing
    /// should be published.
    pub fn process_cycle(&mut self) -> Result<(TrafficWaypoint, StatusReport), TlDetectorError> {
        let pose = self.registers.pose().ok_or(TlDetectorError::MissingPose)?;

        let car_wp = self
            .wp_index
            .query_nearest(&pose.position2())
            .ok_or(TlDetectorError::InvalidPose)?;

        let mut report = StatusReport {
            car_wp,
            stop_wp: None,
            light: None,
            light_state: None,
            signal: TrafficSignal::Clear,
            traffic_wp: TrafficWaypoint(0),
        };

        let decision = self.decide(&mut report)?;

        report.signal = TrafficSignal::from(decision);

        let signal = match self.debouncer {
            Some(ref mut db) => db.update(report.signal),
            None => report.signal,
        };

        report.traffic_wp = signal.encode(self.wp_index.len());

        debug!(
            "car_wp: {}, stop_wp: {:?}, light: {:?}, state: {:?}, publish: {}",
            report.car_wp,
            report.stop_wp,
            report.light,
            report.light_state,
            report.traffic_wp.0
        );

        Ok((report.traffic_wp, report))
    }

    /// Find the stop line ahead and the state of its light.
    ///
    /// `Ok(None)` means there is no stop line ahead or no light near it.
    fn decide(&mut self, report: &mut StatusReport) -> Result<Option<Decision>, TlDetectorError> {
        let stop_wp = match self.stop_lines.next_stop_wp(report.car_wp) {
            Some(wp) => wp,
            None => {
                trace!("No stop line ahead of waypoint {}", report.car_wp);
                return Ok(None);
            }
        };
        report.stop_wp = Some(stop_wp);

        let stop_waypoint = match self.wp_index.waypoint(stop_wp) {
            Some(wp) => wp,
            None => return Ok(None),
        };

        let lights = self.registers.lights();
        let (light_index, dist_m) = match select_light(stop_waypoint, &lights) {
            Some(l) => l,
            None => {
                trace!("No lights observed near stop line at waypoint {}", stop_wp);
                return Ok(None);
            }
        };
        report.light = Some((light_index, dist_m));

        // Only the frame pointer is taken from the register, the resolver runs unlocked
        let frame = self.registers.frame();
        let state = self
            .resolver
            .resolve(&lights[light_index], frame.as_deref())
            .map_err(TlDetectorError::ClassificationUnavailable)?;
        report.light_state = Some(state);

        Ok(Some(Decision {
            wp_index: stop_wp,
            state,
        }))
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use comms_if::veh::{Pose, TrafficLight};
    use nalgebra::Vector3;

    use super::*;
    use crate::tl_detector::{
        resolver::{
            test::{blank_image, ScriptedClassifier},
            ClassifierResolver, GroundTruthResolver, ResolveError,
        },
        AheadPolicy,
    };

    /// 10 waypoints 10 m apart along the x axis
    fn line_path() -> Vec<Waypoint> {
        (0..10)
            .map(|i| Waypoint {
                position_m: Vector3::new(i as f64 * 10.0, 0.0, 0.0),
                heading_rad: 0.0,
                velocity_ms: 11.0,
            })
            .collect()
    }

    fn params() -> Params {
        Params {
            stop_line_positions: vec![[60.8, -2.0]],
            use_truth: true,
            classifier_name: String::from("test"),
            ahead_tolerance_wps: 5,
            ahead_policy: AheadPolicy::Linear,
            debounce_count: None,
        }
    }

    fn detector(params: Params, resolver: Box<dyn LightStateResolver + Send>) -> TlDetector {
        TlDetector::new(params, line_path(), resolver).unwrap()
    }

    /// Place the car at the given waypoint and a single light near waypoint 6
    fn set_scene(tld: &TlDetector, car_wp: usize, state: LightState) {
        let regs = tld.registers();

        regs.set_pose(Pose::from_position(Vector3::new(
            car_wp as f64 * 10.0 + 0.4,
            1.0,
            0.0,
        )));
        regs.set_lights(vec![TrafficLight {
            position_m: Vector3::new(63.0, 8.0, 5.5),
            state,
        }]);
    }

    fn run(tld: &mut TlDetector) -> Result<(TrafficWaypoint, StatusReport), TlDetectorError> {
        tld.proc(Arc::new(blank_image()))
    }

    #[test]
    fn test_stop_line_cached() {
        let tld = detector(params(), Box::new(GroundTruthResolver));

        assert_eq!(tld.stop_line_wps(), &[6]);
        assert_eq!(tld.num_waypoints(), 10);
    }

    #[test]
    fn test_red_light() {
        let mut tld = detector(params(), Box::new(GroundTruthResolver));
        set_scene(&tld, 1, LightState::Red);

        let (traffic_wp, report) = run(&mut tld).unwrap();

        assert_eq!(traffic_wp, TrafficWaypoint(6));
        assert_eq!(report.car_wp, 1);
        assert_eq!(report.stop_wp, Some(6));
        assert_eq!(report.light.map(|l| l.0), Some(0));
        assert_eq!(report.light_state, Some(LightState::Red));
        assert_eq!(report.signal, TrafficSignal::Stop { wp: 6 });
    }

    #[test]
    fn test_yellow_light() {
        let mut tld = detector(params(), Box::new(GroundTruthResolver));
        set_scene(&tld, 1, LightState::Yellow);

        assert_eq!(run(&mut tld).unwrap().0, TrafficWaypoint(-6));
    }

    #[test]
    fn test_green_light() {
        let mut tld = detector(params(), Box::new(GroundTruthResolver));
        set_scene(&tld, 1, LightState::Green);

        assert_eq!(run(&mut tld).unwrap().0, TrafficWaypoint(-10));
    }

    #[test]
    fn test_unknown_light() {
        let mut tld = detector(params(), Box::new(GroundTruthResolver));
        set_scene(&tld, 1, LightState::Unknown);

        assert_eq!(run(&mut tld).unwrap().0, TrafficWaypoint(-10));
    }

    #[test]
    fn test_passed_stop_line() {
        // Waypoint 6 is two behind the car, outside a tolerance of 2
        let mut p = params();
        p.ahead_tolerance_wps = 2;
        let mut tld = detector(p, Box::new(GroundTruthResolver));
        set_scene(&tld, 8, LightState::Red);

        let (traffic_wp, report) = run(&mut tld).unwrap();

        assert_eq!(traffic_wp, TrafficWaypoint(-10));
        assert_eq!(report.stop_wp, None);
        assert_eq!(report.light, None);
    }

    #[test]
    fn test_stop_line_within_tolerance_behind() {
        // With the default tolerance waypoint 6 still counts as ahead of waypoint 8
        let mut tld = detector(params(), Box::new(GroundTruthResolver));
        set_scene(&tld, 8, LightState::Red);

        assert_eq!(run(&mut tld).unwrap().0, TrafficWaypoint(6));
    }

    #[test]
    fn test_no_lights() {
        let mut tld = detector(params(), Box::new(GroundTruthResolver));
        set_scene(&tld, 1, LightState::Red);
        tld.registers().set_lights(Vec::new());

        let (traffic_wp, report) = run(&mut tld).unwrap();

        assert_eq!(traffic_wp, TrafficWaypoint(-10));
        assert_eq!(report.stop_wp, Some(6));
        assert_eq!(report.light, None);
    }

    #[test]
    fn test_nearest_light_selected() {
        let mut tld = detector(params(), Box::new(GroundTruthResolver));
        set_scene(&tld, 1, LightState::Red);
        tld.registers().set_lights(vec![
            TrafficLight {
                position_m: Vector3::new(10.0, 8.0, 5.5),
                state: LightState::Red,
            },
            TrafficLight {
                position_m: Vector3::new(58.0, -8.0, 5.5),
                state: LightState::Yellow,
            },
        ]);

        let (traffic_wp, report) = run(&mut tld).unwrap();

        assert_eq!(traffic_wp, TrafficWaypoint(-6));
        assert_eq!(report.light.map(|l| l.0), Some(1));
    }

    #[test]
    fn test_idempotent() {
        let mut tld = detector(params(), Box::new(GroundTruthResolver));
        set_scene(&tld, 1, LightState::Red);

        let first = run(&mut tld).unwrap();
        let second = run(&mut tld).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_pose() {
        let mut tld = detector(params(), Box::new(GroundTruthResolver));
        tld.registers().set_lights(vec![TrafficLight {
            position_m: Vector3::new(63.0, 8.0, 5.5),
            state: LightState::Red,
        }]);

        assert_eq!(run(&mut tld), Err(TlDetectorError::MissingPose));
    }

    #[test]
    fn test_invalid_pose() {
        let mut tld = detector(params(), Box::new(GroundTruthResolver));
        tld.registers()
            .set_pose(Pose::from_position(Vector3::new(f64::NAN, 0.0, 0.0)));

        assert_eq!(run(&mut tld), Err(TlDetectorError::InvalidPose));
    }

    #[test]
    fn test_classifier_without_frame() {
        let mut p = params();
        p.use_truth = false;
        let mut tld = detector(
            p,
            Box::new(ClassifierResolver::new(ScriptedClassifier::new(vec![
                Ok(LightState::Red),
            ]))),
        );
        set_scene(&tld, 1, LightState::Red);

        assert_eq!(
            tld.process_cycle(),
            Err(TlDetectorError::ClassificationUnavailable(
                ResolveError::NoFrame
            ))
        );
    }

    #[test]
    fn test_classifier_verdict_used() {
        let mut p = params();
        p.use_truth = false;
        let mut tld = detector(
            p,
            Box::new(ClassifierResolver::new(ScriptedClassifier::new(vec![
                Ok(LightState::Yellow),
                Err(String::from("server busy")),
            ]))),
        );

        // The light reports green but the classifier sees yellow
        set_scene(&tld, 1, LightState::Green);

        assert_eq!(run(&mut tld).unwrap().0, TrafficWaypoint(-6));
        assert!(matches!(
            run(&mut tld),
            Err(TlDetectorError::ClassificationUnavailable(
                ResolveError::ClassifierFailed(_)
            ))
        ));
    }

    #[test]
    fn test_classifier_gets_latest_frame_and_selected_light() {
        let mut p = params();
        p.use_truth = false;
        let classifier = ScriptedClassifier::new(vec![Ok(LightState::Red)]);
        let seen = classifier.seen();
        let mut tld = detector(p, Box::new(ClassifierResolver::new(classifier)));

        // The far light is listed first so the selected one isn't index 0
        set_scene(&tld, 1, LightState::Green);
        let near = tld.registers().lights()[0].position_m;
        tld.registers().set_lights(vec![
            TrafficLight {
                position_m: Vector3::new(20.0, 8.0, 5.5),
                state: LightState::Green,
            },
            TrafficLight {
                position_m: near,
                state: LightState::Green,
            },
        ]);

        let frame_a = blank_image();
        let mut frame_b = blank_image();
        frame_b.timestamp = frame_a.timestamp + chrono::Duration::seconds(1);

        tld.proc(Arc::new(frame_a.clone())).unwrap();
        let (traffic_wp, report) = tld.proc(Arc::new(frame_b.clone())).unwrap();

        assert_eq!(traffic_wp, TrafficWaypoint(6));
        assert_eq!(report.light.map(|(i, _)| i), Some(1));

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![(frame_a.timestamp, near), (frame_b.timestamp, near)]
        );
    }

    #[test]
    fn test_classifier_not_needed_when_clear() {
        let mut p = params();
        p.use_truth = false;
        p.ahead_tolerance_wps = 0;
        let mut tld = detector(
            p,
            Box::new(ClassifierResolver::new(ScriptedClassifier::new(vec![
                Err(String::from("never called")),
            ]))),
        );

        // No stop line ahead, so the missing frame doesn't matter
        set_scene(&tld, 7, LightState::Red);

        assert_eq!(tld.process_cycle().unwrap().0, TrafficWaypoint(-10));
    }

    #[test]
    fn test_debounce() {
        let mut p = params();
        p.debounce_count = Some(2);
        let mut tld = detector(p, Box::new(GroundTruthResolver));

        set_scene(&tld, 1, LightState::Red);
        let (traffic_wp, report) = run(&mut tld).unwrap();
        assert_eq!(traffic_wp, TrafficWaypoint(-10));
        assert_eq!(report.signal, TrafficSignal::Stop { wp: 6 });

        assert_eq!(run(&mut tld).unwrap().0, TrafficWaypoint(6));

        set_scene(&tld, 1, LightState::Green);
        assert_eq!(run(&mut tld).unwrap().0, TrafficWaypoint(6));
        assert_eq!(run(&mut tld).unwrap().0, TrafficWaypoint(-10));
    }

    #[test]
    fn test_modulo_policy() {
        let mut p = params();
        p.stop_line_positions = vec![[10.0, 0.0]];
        p.ahead_tolerance_wps = 2;
        p.ahead_policy = AheadPolicy::Modulo;
        let mut tld = detector(p, Box::new(GroundTruthResolver));

        let regs = tld.registers();
        regs.set_pose(Pose::from_position(Vector3::new(90.0, 0.0, 0.0)));
        regs.set_lights(vec![TrafficLight {
            position_m: Vector3::new(12.0, 6.0, 5.5),
            state: LightState::Red,
        }]);

        // The loop closes so the stop line at waypoint 1 is next
        assert_eq!(run(&mut tld).unwrap().0, TrafficWaypoint(1));
    }

    #[test]
    fn test_empty_path() {
        assert!(matches!(
            TlDetector::new(params(), Vec::new(), Box::new(GroundTruthResolver)),
            Err(TlDetectorInitError::Index(_))
        ));
    }

    #[test]
    fn test_no_stop_lines() {
        let mut p = params();
        p.stop_line_positions.clear();

        assert!(matches!(
            TlDetector::new(p, line_path(), Box::new(GroundTruthResolver)),
            Err(TlDetectorInitError::StopLines(_))
        ));
    }
}
