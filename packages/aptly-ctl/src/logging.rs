//! Logging setup and top-level error reporting.
//!
//! A [`Logging`] value is built once in `main` from the command line and then
//! handed to whatever needs to know how verbose the run is.

use std::process::ExitCode;

use tracing::{Level, debug, error};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _};

use crate::Error;

/// Levels selected by repeating `-v`.
pub const VERBOSITY: [Level; 3] = [Level::WARN, Level::INFO, Level::DEBUG];

/// Log targets belonging to the clients themselves.
const APP_TARGETS: [&str; 2] = ["aptly_ctl", "didww_aptly_ctl"];

/// HTTP stack targets raised when request tracing is on.
const HTTP_TARGETS: [&str; 3] = ["reqwest", "hyper_util", "hyper"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Logging {
    level: Level,
    trace_http: bool,
}

impl Logging {
    /// From a `-v` count. The highest verbosity also traces HTTP requests.
    pub fn from_verbosity(count: u8) -> Self {
        let index = usize::from(count).min(VERBOSITY.len() - 1);
        Self {
            level: VERBOSITY[index],
            trace_http: index == VERBOSITY.len() - 1,
        }
    }

    /// From a level name: `debug`, `info`, `warning`, `error` or `critical`.
    pub fn from_level_name(name: &str) -> Result<Self, Error> {
        let level = match name.to_lowercase().as_str() {
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" | "warning" => Level::WARN,
            "error" | "critical" => Level::ERROR,
            _ => return Err(Error::validation(format!("Invalid log level: {name}"))),
        };
        Ok(Self {
            level,
            trace_http: false,
        })
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn is_debug(&self) -> bool {
        self.level >= Level::DEBUG
    }

    /// Filter directives for this configuration. `RUST_LOG` is appended, so it
    /// can still raise or lower individual targets.
    pub fn directives(&self) -> String {
        let level = self.level.as_str().to_lowercase();
        let mut directives = vec![String::from("warn")];
        directives.extend(APP_TARGETS.iter().map(|target| format!("{target}={level}")));
        if self.trace_http {
            directives.extend(HTTP_TARGETS.iter().map(|target| format!("{target}=trace")));
        }
        if let Ok(extra) = std::env::var(EnvFilter::DEFAULT_ENV)
            && !extra.trim().is_empty()
        {
            directives.push(extra);
        }
        directives.join(",")
    }

    /// Install the global subscriber. Logs go to stderr so they never mix
    /// with command output.
    pub fn init(&self) -> Result<(), Error> {
        let filter = EnvFilter::try_new(self.directives())
            .map_err(|err| Error::validation(format!("invalid log filter: {err}")))?;
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(self.is_debug())
                    .with_file(self.trace_http)
                    .with_line_number(self.trace_http)
                    .without_time(),
            )
            .with(filter)
            .try_init()
            .map_err(|err| Error::validation(format!("could not initialize logging: {err}")))
    }

    /// Log an error the way the clients report failures, and pick the exit
    /// code for it.
    pub fn report(&self, err: &Error) -> ExitCode {
        match err.api_error() {
            Some(api) if api.is_page_not_found() => error!(
                "API responded with '{}'. Check configured API url and run command with -vv to see failed request details.",
                api.message
            ),
            _ => error!("{err}"),
        }
        if self.is_debug() {
            debug!("{err:?}");
        }
        ExitCode::from(err.exit_code())
    }
}
