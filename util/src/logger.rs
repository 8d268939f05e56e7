//! # Logging
//!
//! Sets up the `log` facade to write to stdout and to the session's log file. Each line carries
//! the seconds since the session started and a short coloured level tag. Debug and trace lines
//! also name the module they came from, and the thread if it isn't the main one.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use colored::{ColoredString, Colorize};
use log::{info, Level, Record};
use thiserror::Error;

use crate::session::{self, Session};

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Expected a log level of at least `INFO`, found `{0}`")]
    InvalidMinLogLevel(LevelFilter),

    #[error("Unrecognised log level name \"{0}\"")]
    UnknownLevelName(String),

    #[error("Error initialising the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("An error occured while setting up the logger: {0}")]
    FernInitError(log::SetLoggerError),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
///
/// `min_level` must be `Info` or more verbose, warnings are the only record of aborted detector
/// cycles. Can only be called once per process.
pub fn logger_init(min_level: LevelFilter, session: &Session) -> Result<(), LoggerInitError> {
    validate_min_level(min_level)?;

    let log_file =
        fern::log_file(&session.log_file_path).map_err(LoggerInitError::LogFileInitError)?;

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{:10.6} {}]{} {}",
                session::get_elapsed_seconds(),
                level_tag(record.level()),
                origin(record),
                message
            ))
        })
        .level(min_level)
        // zmq is noisy below info
        .level_for("zmq", LevelFilter::Info)
        .chain(std::io::stdout())
        .chain(log_file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    info!("    Session epoch: {}", session.epoch);
    info!("    Log level: {:?}", min_level);
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

/// Parse a log level name, as given on the command line, into a filter.
///
/// Names are case insensitive, for example `info`, `DEBUG` or `Trace`.
pub fn parse_level_filter(name: &str) -> Result<LevelFilter, LoggerInitError> {
    let level: LevelFilter = name
        .parse()
        .map_err(|_| LoggerInitError::UnknownLevelName(name.to_string()))?;

    validate_min_level(level)?;

    Ok(level)
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn validate_min_level(min_level: LevelFilter) -> Result<(), LoggerInitError> {
    match min_level < Level::Info {
        true => Err(LoggerInitError::InvalidMinLogLevel(min_level)),
        false => Ok(()),
    }
}

/// Where a debug or trace record came from, empty for less verbose records.
fn origin(record: &Record) -> String {
    if record.level() <= Level::Info {
        return String::new();
    }

    match std::thread::current().name() {
        Some("main") | None => format!(" {}:", record.target()),
        Some(thread) => format!(" {} ({}):", record.target(), thread),
    }
}

/// Three letter tag for a log level
fn level_tag(level: Level) -> ColoredString {
    match level {
        Level::Trace => "TRC".dimmed().italic(),
        Level::Debug => "DBG".dimmed(),
        Level::Info => "INF".normal(),
        Level::Warn => "WRN".yellow(),
        Level::Error => "ERR".red().bold(),
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_level_filter() {
        assert_eq!(parse_level_filter("info").unwrap(), LevelFilter::Info);
        assert_eq!(parse_level_filter("DEBUG").unwrap(), LevelFilter::Debug);
        assert_eq!(parse_level_filter("Trace").unwrap(), LevelFilter::Trace);

        assert!(matches!(
            parse_level_filter("warn"),
            Err(LoggerInitError::InvalidMinLogLevel(LevelFilter::Warn))
        ));
        assert!(matches!(
            parse_level_filter("off"),
            Err(LoggerInitError::InvalidMinLogLevel(LevelFilter::Off))
        ));
        assert!(matches!(
            parse_level_filter("loud"),
            Err(LoggerInitError::UnknownLevelName(_))
        ));
    }

    #[test]
    fn test_origin() {
        let target = "tl_lib::tl_detector";

        assert_eq!(
            origin(
                &Record::builder()
                    .args(format_args!("x"))
                    .level(Level::Info)
                    .target(target)
                    .build()
            ),
            ""
        );
        assert!(origin(
            &Record::builder()
                .args(format_args!("x"))
                .level(Level::Debug)
                .target(target)
                .build()
        )
        .starts_with(" tl_lib::tl_detector"));
    }
}
