//! The log sink.
//!
//! reef logs through `tracing`. [`init`] installs the subscriber for the
//! whole process: stdout always, plus a rolling file when the configuration
//! names a directory.
//!
//! ```rust,no_run
//! use reef::{config::Config, telemetry};
//!
//! let config = Config::default();
//! // Keep the guard alive for the life of the process: dropping it stops
//! // the background file writer.
//! let _guard = telemetry::init(&config.log).unwrap_or_else(|e| telemetry::fatal(e));
//! ```

use std::fmt::Display;

use tracing::error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation as AppenderRotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{LogConfig, Rotation};
use crate::error::Error;

impl From<Rotation> for AppenderRotation {
    fn from(r: Rotation) -> Self {
        match r {
            Rotation::Minutely => AppenderRotation::MINUTELY,
            Rotation::Hourly   => AppenderRotation::HOURLY,
            Rotation::Daily    => AppenderRotation::DAILY,
            Rotation::Never    => AppenderRotation::NEVER,
        }
    }
}

/// Installs the global subscriber. Returns the file writer's guard when file
/// output is on.
///
/// Fails if the level is not a valid filter, the log directory cannot be
/// created, or a subscriber is already installed.
pub fn init(config: &LogConfig) -> Result<Option<WorkerGuard>, Error> {
    let filter = EnvFilter::try_new(&config.level)
        .map_err(|e| Error::Log(format!("invalid level `{}`: {e}", config.level)))?;
    let stdout = tracing_subscriber::fmt::layer();

    let Some(dir) = &config.directory else {
        tracing_subscriber::registry()
            .with(filter)
            .with(stdout)
            .try_init()
            .map_err(|e| Error::Log(e.to_string()))?;
        return Ok(None);
    };

    std::fs::create_dir_all(dir)?;
    let appender = RollingFileAppender::builder()
        .rotation(config.rotation.into())
        .filename_prefix(&config.file_prefix)
        .build(dir)
        .map_err(|e| Error::Log(format!("cannot open log file in {}: {e}", dir.display())))?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout)
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(writer))
        .try_init()
        .map_err(|e| Error::Log(e.to_string()))?;

    Ok(Some(guard))
}

/// Logs `msg` at error level and terminates the process with exit code 1.
pub fn fatal(msg: impl Display) -> ! {
    error!("fatal: {msg}");
    eprintln!("fatal: {msg}");
    std::process::exit(1)
}
