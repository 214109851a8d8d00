//! Compact identifiers for published repositories.
//!
//! Aptly addresses a publish by its prefix and distribution. On the command
//! line both are written as a single `prefix/distribution` token, where the
//! prefix (and its slash) may be left out for the default prefix:
//!
//! ```text
//! stable                  -> prefix ".", distribution "stable"
//! nightly/bionic          -> prefix "nightly", distribution "bionic"
//! s3:bucket:ubuntu/dev/xenial -> prefix "s3:bucket:ubuntu/dev", distribution "xenial"
//! ```
//!
//! The split happens on the last slash, because prefixes can contain slashes
//! but distributions cannot.

use std::{fmt, str::FromStr};

use thiserror::Error;

/// The prefix Aptly publishes to when none is given.
pub const DEFAULT_PREFIX: &str = ".";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PubSpecError {
    #[error("distribution is empty")]
    EmptyDistribution,
    #[error("{part} {value:?} contains {found:?}")]
    InvalidCharacter {
        part: &'static str,
        value: String,
        found: char,
    },
}

/// A publish endpoint: prefix plus distribution.
///
/// Field order matters: ordering compares the prefix first, then the
/// distribution.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PubSpec {
    prefix: String,
    distribution: String,
}

impl PubSpec {
    /// Build a spec from explicit parts. An empty prefix means [`DEFAULT_PREFIX`].
    pub fn new(
        prefix: impl Into<String>,
        distribution: impl Into<String>,
    ) -> Result<Self, PubSpecError> {
        let mut prefix = prefix.into();
        let distribution = distribution.into();
        if distribution.is_empty() {
            return Err(PubSpecError::EmptyDistribution);
        }
        if prefix.is_empty() {
            prefix = String::from(DEFAULT_PREFIX);
        }
        check_part("prefix", &prefix)?;
        check_part("distribution", &distribution)?;
        Ok(Self {
            prefix,
            distribution,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn distribution(&self) -> &str {
        &self.distribution
    }

    /// The prefix as Aptly expects it in an API path segment.
    ///
    /// The default prefix becomes `:.`; otherwise underscores are doubled and
    /// slashes turned into underscores.
    pub fn api_prefix(&self) -> String {
        if self.prefix == DEFAULT_PREFIX {
            return String::from(":.");
        }
        self.prefix.replace('_', "__").replace('/', "_")
    }
}

fn check_part(part: &'static str, value: &str) -> Result<(), PubSpecError> {
    match value.chars().find(|c| c.is_whitespace() || *c == '=') {
        Some(found) => Err(PubSpecError::InvalidCharacter {
            part,
            value: value.to_string(),
            found,
        }),
        None => Ok(()),
    }
}

impl FromStr for PubSpec {
    type Err = PubSpecError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text.rsplit_once('/') {
            Some((prefix, distribution)) => Self::new(prefix, distribution),
            None => Self::new(DEFAULT_PREFIX, text),
        }
    }
}

impl fmt::Display for PubSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prefix == DEFAULT_PREFIX {
            f.write_str(&self.distribution)
        } else {
            write!(f, "{}/{}", self.prefix, self.distribution)
        }
    }
}
