//! # Light State Resolution
//!
//! Determines the colour of the selected traffic light. The mode is chosen once when the detector
//! is built:
//!
//! - [`GroundTruthResolver`] trusts the colour the light reports for itself, which is only
//!   available in simulation and is used for development.
//! - [`ClassifierResolver`] passes the latest camera frame to a [`LightClassifier`].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    eqpt::cam::CamImage,
    veh::{LightState, TrafficLight},
};
use log::trace;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Resolves the colour of a light.
pub trait LightStateResolver {
    /// Get the state of `light`, using `frame` if one has been received.
    fn resolve(
        &mut self,
        light: &TrafficLight,
        frame: Option<&CamImage>,
    ) -> Result<LightState, ResolveError>;
}

/// An image classifier able to determine the colour of a light in a camera frame.
///
/// Classification may be slow. Implementations are called without any of the detector's shared
/// state locked.
pub trait LightClassifier {
    type Error: std::error::Error;

    /// Classify `light` in `image`, the light's position being a hint for where to look.
    fn get_classification(
        &mut self,
        image: &CamImage,
        light: &TrafficLight,
    ) -> Result<LightState, Self::Error>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Returns the light's self-reported state.
#[derive(Debug, Default, Clone, Copy)]
pub struct GroundTruthResolver;

/// Classifies the light in the latest camera frame.
pub struct ClassifierResolver<C> {
    classifier: C,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Reasons a light's state cannot be resolved.
///
/// These are distinct from [`LightState::Unknown`]: an unresolved light means there is no
/// information at all, so nothing should be published.
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum ResolveError {
    #[error("No camera frame has been received yet")]
    NoFrame,

    #[error("The light classifier failed: {0}")]
    ClassifierFailed(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl LightStateResolver for GroundTruthResolver {
    fn resolve(
        &mut self,
        light: &TrafficLight,
        _frame: Option<&CamImage>,
    ) -> Result<LightState, ResolveError> {
        Ok(light.state)
    }
}

impl<C> ClassifierResolver<C>
where
    C: LightClassifier,
{
    pub fn new(classifier: C) -> Self {
        Self { classifier }
    }
}

impl<C> LightStateResolver for ClassifierResolver<C>
where
    C: LightClassifier,
{
    fn resolve(
        &mut self,
        light: &TrafficLight,
        frame: Option<&CamImage>,
    ) -> Result<LightState, ResolveError> {
        let image = frame.ok_or(ResolveError::NoFrame)?;

        let state = self
            .classifier
            .get_classification(image, light)
            .map_err(|e| ResolveError::ClassifierFailed(e.to_string()))?;

        trace!("Classified light at {:?} as {:?}", light.position_m, state);

        Ok(state)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod test {
    use std::sync::{Arc, Mutex};

    use chrono::{DateTime, Utc};
    use image::ImageBuffer;
    use nalgebra::Vector3;

    use super::*;

    /// Frame timestamp and light position of each classification request
    pub(crate) type SeenLog = Arc<Mutex<Vec<(DateTime<Utc>, Vector3<f64>)>>>;

    /// A classifier returning a fixed sequence of results
    pub(crate) struct ScriptedClassifier {
        results: Vec<Result<LightState, String>>,
        pub calls: usize,
        seen: SeenLog,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("{0}")]
    pub(crate) struct ScriptedError(String);

    impl ScriptedClassifier {
        pub(crate) fn new(results: Vec<Result<LightState, String>>) -> Self {
            Self {
                results,
                calls: 0,
                seen: SeenLog::default(),
            }
        }

        /// Handle to the log of requests, usable after the classifier is boxed away
        pub(crate) fn seen(&self) -> SeenLog {
            self.seen.clone()
        }
    }

    impl LightClassifier for ScriptedClassifier {
        type Error = ScriptedError;

        fn get_classification(
            &mut self,
            image: &CamImage,
            light: &TrafficLight,
        ) -> Result<LightState, Self::Error> {
            self.seen
                .lock()
                .unwrap()
                .push((image.timestamp, light.position_m));

            let result = self.results[self.calls % self.results.len()].clone();
            self.calls += 1;
            result.map_err(ScriptedError)
        }
    }

    pub(crate) fn blank_image() -> CamImage {
        CamImage {
            timestamp: Utc::now(),
            image: ImageBuffer::new(4, 3),
        }
    }

    fn light(state: LightState) -> TrafficLight {
        TrafficLight {
            position_m: Vector3::new(1.0, 2.0, 5.0),
            state,
        }
    }

    #[test]
    fn test_ground_truth() {
        let mut resolver = GroundTruthResolver;

        assert_eq!(resolver.resolve(&light(LightState::Red), None), Ok(LightState::Red));
        assert_eq!(
            resolver.resolve(&light(LightState::Yellow), Some(&blank_image())),
            Ok(LightState::Yellow)
        );
        assert_eq!(
            resolver.resolve(&light(LightState::Unknown), None),
            Ok(LightState::Unknown)
        );
    }

    #[test]
    fn test_classifier_needs_frame() {
        let mut resolver =
            ClassifierResolver::new(ScriptedClassifier::new(vec![Ok(LightState::Red)]));

        assert_eq!(
            resolver.resolve(&light(LightState::Green), None),
            Err(ResolveError::NoFrame)
        );
        assert_eq!(resolver.classifier.calls, 0);
    }

    #[test]
    fn test_classifier_verdict() {
        let mut resolver = ClassifierResolver::new(ScriptedClassifier::new(vec![
            Ok(LightState::Red),
            Err(String::from("timeout")),
        ]));
        let image = blank_image();

        // Self reported state is ignored
        assert_eq!(
            resolver.resolve(&light(LightState::Green), Some(&image)),
            Ok(LightState::Red)
        );
        assert_eq!(
            resolver.resolve(&light(LightState::Green), Some(&image)),
            Err(ResolveError::ClassifierFailed(String::from("timeout")))
        );
    }
}
