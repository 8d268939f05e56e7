//! Utility library for the traffic light detector software

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod host;
pub mod kdtree;
pub mod logger;
pub mod maths;
pub mod params;
pub mod session;
pub mod time;
