//! # Input Registers
//!
//! Last-write-wins slots holding the most recent pose, traffic light set and camera frame. Each is
//! written by a network client and read by the detector when a cycle runs. Nothing ties the slots
//! together, so a cycle may see a pose and a light set received at different times.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::{Arc, Mutex};

use comms_if::{
    eqpt::cam::CamImage,
    veh::{Pose, TrafficLight},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Handle to the detector's input registers. Clones share the same slots.
#[derive(Clone, Default)]
pub struct InputRegisters {
    pose: Arc<Mutex<Option<Pose>>>,

    /// The light set is replaced wholesale, readers keep their own snapshot
    lights: Arc<Mutex<Arc<Vec<TrafficLight>>>>,

    /// Frames are large so only the pointer is copied out under the lock
    frame: Arc<Mutex<Option<Arc<CamImage>>>>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl InputRegisters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current pose.
    pub fn set_pose(&self, pose: Pose) {
        let mut p = self
            .pose
            .lock()
            .expect("InputRegisters: pose mutex poisoned");

        *p = Some(pose);
    }

    /// The latest pose, or `None` if none has been received.
    pub fn pose(&self) -> Option<Pose> {
        *self
            .pose
            .lock()
            .expect("InputRegisters: pose mutex poisoned")
    }

    /// Replace the whole set of observed lights.
    pub fn set_lights(&self, lights: Vec<TrafficLight>) {
        let mut l = self
            .lights
            .lock()
            .expect("InputRegisters: lights mutex poisoned");

        *l = Arc::new(lights);
    }

    /// Snapshot of the latest light set. Empty if none has been received.
    pub fn lights(&self) -> Arc<Vec<TrafficLight>> {
        self.lights
            .lock()
            .expect("InputRegisters: lights mutex poisoned")
            .clone()
    }

    /// Replace the current camera frame.
    pub fn set_frame(&self, frame: Arc<CamImage>) {
        let mut f = self
            .frame
            .lock()
            .expect("InputRegisters: frame mutex poisoned");

        *f = Some(frame);
    }

    /// The latest camera frame, or `None` if none has been received.
    pub fn frame(&self) -> Option<Arc<CamImage>> {
        self.frame
            .lock()
            .expect("InputRegisters: frame mutex poisoned")
            .clone()
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
