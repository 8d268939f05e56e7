//! # Classifier Client
//!
//! Sends camera frames to the classification server and receives the classified state of a
//! traffic light back. Each classification is a blocking request and response.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    eqpt::{
        cam::CamImage,
        classifier::{ClassifyRequest, ClassifyResponse},
    },
    net::{zmq, MonitoredSocket, MonitoredSocketError, NetParams, SocketOptions},
    veh::{LightState, TrafficLight},
};
use log::trace;

use crate::tl_detector::LightClassifier;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Maximum time to wait for the server to classify a frame
const CLASSIFY_TIMEOUT_MS: i32 = 500;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The classifier client
pub struct ClassifierClient {
    socket: MonitoredSocket,

    /// Classifier the server is asked to use
    classifier_name: String,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ClassifierClientError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("The client is not connected to the server")]
    NotConnected,

    #[error("Could not send the request to the server: {0}")]
    SendError(zmq::Error),

    #[error("Could not recieve a message from the server: {0}")]
    RecvError(zmq::Error),

    #[error("The server did not respond within {0} ms")]
    Timeout(i32),

    #[error("Could not serialize the request: {0}")]
    SerializationError(serde_json::Error),

    #[error("Could not deserialize the response from the server: {0}")]
    DeserializeError(serde_json::Error),

    #[error("The server responed with a message which was not valid UTF-8")]
    NonUtf8Response,

    #[error("The server could not classify the frame: {0}")]
    ServerError(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ClassifierClient {
    /// Create a new instance of the classifier client.
    ///
    /// This function will not block until the server connects.
    pub fn new(
        ctx: &zmq::Context,
        params: &NetParams,
        classifier_name: &str,
    ) -> Result<Self, ClassifierClientError> {
        // Create the socket options
        let socket_options = SocketOptions::requester(CLASSIFY_TIMEOUT_MS);

        // Connect the socket
        let socket = MonitoredSocket::new(
            ctx,
            zmq::REQ,
            socket_options,
            &params.classifier_endpoint,
        )
        .map_err(ClassifierClientError::SocketError)?;

        Ok(Self {
            socket,
            classifier_name: classifier_name.to_string(),
        })
    }
}

impl LightClassifier for ClassifierClient {
    type Error = ClassifierClientError;

    fn get_classification(
        &mut self,
        image: &CamImage,
        light: &TrafficLight,
    ) -> Result<LightState, Self::Error> {
        // If not connected return an error
        if !self.socket.connected() {
            return Err(ClassifierClientError::NotConnected);
        }

        // Build the request
        let request = ClassifyRequest {
            classifier_name: self.classifier_name.clone(),
            frame: image.to_cam_frame(),
            light_position_m: light.position_m,
        };

        // Serialize the request
        let request_str =
            serde_json::to_string(&request).map_err(ClassifierClientError::SerializationError)?;

        // Send the request
        self.socket
            .send(request_str.as_str(), 0)
            .map_err(ClassifierClientError::SendError)?;

        // Read the response
        let response_str = match self.socket.recv_string(0) {
            Ok(Ok(s)) => s,
            Ok(Err(_)) => return Err(ClassifierClientError::NonUtf8Response),
            Err(zmq::Error::EAGAIN) => {
                return Err(ClassifierClientError::Timeout(CLASSIFY_TIMEOUT_MS))
            }
            Err(e) => return Err(ClassifierClientError::RecvError(e)),
        };

        let response: ClassifyResponse = serde_json::from_str(&response_str)
            .map_err(ClassifierClientError::DeserializeError)?;

        match response {
            ClassifyResponse::State(s) => {
                trace!("Classifier server returned {:?}", s);
                Ok(s)
            }
            ClassifyResponse::Error(e) => Err(ClassifierClientError::ServerError(e)),
        }
    }
}
