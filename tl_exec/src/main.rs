//! Traffic light detector executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise session, logging and parameters
//!     - Wait for the base path from the planner
//!     - Build the detector and start the vehicle state client
//!     - Main loop, once per camera frame:
//!         - Run a detector cycle on the new frame
//!         - Publish the traffic waypoint if the cycle completed

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, info, trace, warn};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use structopt::StructOpt;

// Internal
use comms_if::net::NetParams;
use tl_lib::{
    cam_client::{CamClient, CamClientError},
    classifier_client::ClassifierClient,
    tl_detector::{
        ClassifierResolver, GroundTruthResolver, LightStateResolver, Params, TlDetector,
        TlDetectorError,
    },
    traffic_wp_server::TrafficWpServer,
    veh_client::VehClient,
    waypoint_client::WaypointClient,
};
use util::{
    host,
    logger::{logger_init, parse_level_filter, LevelFilter},
    session::Session,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// How often the cycle statistics are logged
const STATS_PERIOD: Duration = Duration::from_secs(10);

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Traffic light detector
#[derive(Debug, StructOpt)]
#[structopt(name = "tl_exec")]
struct Opts {
    /// Minimum log level (info, debug or trace)
    #[structopt(long, default_value = "info", parse(try_from_str = parse_level_filter))]
    log_level: LevelFilter,

    /// Use the self-reported light states instead of the classifier
    #[structopt(long)]
    use_truth: bool,

    /// Detector parameter file, relative to the params directory
    #[structopt(long, default_value = "tl_detector.toml")]
    params: String,
}

/// Counts of what happened to each frame
#[derive(Debug, Default)]
struct CycleStats {
    frames: u64,
    published: u64,
    bad_frames: u64,
    missing_pose: u64,
    invalid_pose: u64,
    classification_unavailable: u64,
    send_errors: u64,
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("tl_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(opts.log_level, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Traffic Light Detector\n");
    info!(
        "Running on: {:#?}",
        host::get_uname().wrap_err("Failed to get host information")?
    );
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI arguments: {:?}", opts);

    // ---- LOAD PARAMETERS ----

    let net_params: NetParams =
        util::params::load("net.toml").wrap_err("Could not load net params")?;

    let mut tld_params: Params = util::params::load(&opts.params)
        .wrap_err_with(|| format!("Could not load detector params from {}", opts.params))?;

    if opts.use_truth {
        tld_params.use_truth = true;
    }

    info!("Exec parameters loaded");

    // ---- INITIALISE NETWORK ----

    info!("Initialising network");

    let zmq_ctx = comms_if::net::zmq::Context::new();

    let mut waypoint_client = WaypointClient::new(&zmq_ctx, &net_params)
        .wrap_err("Failed to initialise WaypointClient")?;

    let mut cam_client =
        CamClient::new(&zmq_ctx, &net_params).wrap_err("Failed to initialise CamClient")?;
    info!("CamClient initialised");

    let mut tm_server = TrafficWpServer::new(&zmq_ctx, &net_params)
        .wrap_err("Failed to initialise TrafficWpServer")?;
    info!("TrafficWpServer initialised");

    // ---- WAIT FOR PATH ----

    info!("Waiting for the base path");

    let lane = waypoint_client
        .wait_for_lane(None)
        .wrap_err("Failed to receive the base path")?;
    drop(waypoint_client);

    info!("Base path received with {} waypoints", lane.waypoints.len());

    // ---- INITIALISE DETECTOR ----

    let resolver: Box<dyn LightStateResolver + Send> = if tld_params.use_truth {
        warn!("Using self-reported light states, this is only valid in simulation");
        Box::new(GroundTruthResolver)
    } else {
        let client = ClassifierClient::new(&zmq_ctx, &net_params, &tld_params.classifier_name)
            .wrap_err("Failed to initialise ClassifierClient")?;
        info!(
            "ClassifierClient initialised using the \"{}\" classifier",
            tld_params.classifier_name
        );
        Box::new(ClassifierResolver::new(client))
    };

    let mut tl_detector = TlDetector::new(tld_params, lane.waypoints, resolver)
        .wrap_err("Failed to initialise the traffic light detector")?;
    info!(
        "TlDetector init complete, {} stop lines on a {} waypoint path",
        tl_detector.stop_line_wps().len(),
        tl_detector.num_waypoints()
    );

    let veh_client = VehClient::new(&zmq_ctx, &net_params, tl_detector.registers())
        .wrap_err("Failed to initialise VehClient")?;
    info!("VehClient initialised");

    info!("Network initialisation complete");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    let mut stats = CycleStats::default();
    let mut last_stats = Instant::now();

    loop {
        if last_stats.elapsed() > STATS_PERIOD {
            stats.log(cam_client.is_connected());
            last_stats = Instant::now();
        }

        if !veh_client.is_running() {
            return Err(eyre!("The VehClient stopped receiving vehicle data"));
        }

        // ---- DATA INPUT ----

        let image = match cam_client.recieve_image() {
            Ok(Some(i)) => i,
            Ok(None) => continue,
            Err(e @ CamClientError::FrameError(_))
            | Err(e @ CamClientError::DeserializeError(_))
            | Err(e @ CamClientError::NonUtf8Message) => {
                warn!("Dropping camera frame: {}", e);
                stats.bad_frames += 1;
                continue;
            }
            Err(e) => return Err(e).wrap_err("An error occured while receiving camera frames"),
        };

        stats.frames += 1;

        // ---- DETECTOR PROCESSING ----

        let traffic_wp = match tl_detector.proc(Arc::new(image)) {
            Ok((wp, report)) => {
                trace!("TlDetector status: {:?}", report);
                wp
            }
            Err(TlDetectorError::MissingPose) => {
                debug!("No vehicle pose yet, nothing published");
                stats.missing_pose += 1;
                continue;
            }
            Err(e @ TlDetectorError::InvalidPose) => {
                warn!("Cycle aborted: {}", e);
                stats.invalid_pose += 1;
                continue;
            }
            Err(e @ TlDetectorError::ClassificationUnavailable(_)) => {
                warn!("Cycle aborted: {}", e);
                stats.classification_unavailable += 1;
                continue;
            }
        };

        // ---- OUTPUT ----

        match tm_server.send(traffic_wp) {
            Ok(()) => stats.published += 1,
            Err(e) => {
                warn!("Could not publish the traffic waypoint: {}", e);
                stats.send_errors += 1;
            }
        }
    }
}

impl CycleStats {
    fn log(&self, cam_connected: bool) {
        if !cam_connected {
            warn!("The camera stream is not connected");
        }

        info!(
            "{} frames, {} published, {} bad frames, aborted: {} no pose, {} invalid pose, {} \
            unclassified, {} send errors",
            self.frames,
            self.published,
            self.bad_frames,
            self.missing_pose,
            self.invalid_pose,
            self.classification_unavailable,
            self.send_errors
        );
    }
}
