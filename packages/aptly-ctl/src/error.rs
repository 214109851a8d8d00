use thiserror::Error;

use crate::{api::ApiError, config::ConfigError, pubspec::PubSpecError};

/// Exit code for usage and validation errors.
pub const EXIT_VALIDATION: u8 = 1;

/// Exit code for configuration errors.
pub const EXIT_CONFIG: u8 = 127;

/// Exit code for API, domain and transport errors.
pub const EXIT_API: u8 = 128;

/// Every error the clients can end a run with.
///
/// Each variant maps to exactly one process exit code, see
/// [`Error::exit_code`].
#[derive(Debug, Error)]
pub enum Error {
    /// An argument failed validation before any request was made.
    #[error("{0}")]
    Validation(String),

    /// A PUB_SPEC argument could not be parsed.
    #[error("PUB_SPEC '{text}' invalid. See 'publish' subcommand --help")]
    PubSpec {
        text: String,
        #[source]
        source: PubSpecError,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The API answered with a non-2xx status.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// An API error a handler translated into something the user can act on.
    #[error("{message}")]
    Domain {
        message: String,
        #[source]
        source: Option<ApiError>,
    },

    /// A 2xx response whose body wasn't what the API documents.
    #[error("could not parse API response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The request never produced a response (connection refused, DNS, etc.).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn pub_spec(text: impl Into<String>, source: PubSpecError) -> Self {
        Self::PubSpec {
            text: text.into(),
            source,
        }
    }

    /// Wrap an API error as a domain error, keeping the server message.
    pub fn domain(source: ApiError) -> Self {
        Self::Domain {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// The API error behind this error, if there is one.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(error) => Some(error),
            Self::Domain { source, .. } => source.as_ref(),
            _ => None,
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::PubSpec { .. } => EXIT_VALIDATION,
            Self::Config(_) => EXIT_CONFIG,
            Self::Api(_) | Self::Domain { .. } | Self::Decode(_) | Self::Transport(_) => EXIT_API,
        }
    }
}
