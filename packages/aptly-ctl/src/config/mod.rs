//! Client configuration.
//!
//! Configuration is read once at startup from a TOML file made of profiles,
//! then adjusted by `-C key=value` overrides from the command line:
//!
//! ```toml
//! [[profile]]
//! name = "prod"
//! url = "http://aptly.example.com:8090/"
//!
//! [profile.signing]
//! passphrase_file = "/etc/aptly/passphrase"
//! batch = true
//! ```
//!
//! After construction the [`Config`] is never modified; handlers borrow it.

use std::{
    io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::pubspec::{PubSpec, PubSpecError};

pub mod signing;

pub use signing::{SigningConfig, SigningOptions, SigningRule, SigningSettings};
use signing::CompiledRule;

/// API URL used when no configuration file exists.
pub const DEFAULT_URL: &str = "http://localhost:8090/";

/// Name of the profile used when no configuration file exists.
pub const DEFAULT_PROFILE_NAME: &str = "default";

/// Name of the configuration file in the per-user and system locations.
pub const CONFIG_FILE_NAME: &str = "aptly-ctl.conf";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("no profiles defined in {0:?}")]
    NoProfiles(PathBuf),
    #[error("profile {0:?} not found")]
    ProfileNotFound(String),
    #[error("invalid config key override {0:?}, expected KEY=VALUE")]
    OverrideSyntax(String),
    #[error("cannot override config key {key:?}: {message}")]
    Override { key: String, message: String },
    #[error("invalid signing rule entry {entry:?}: {source}")]
    SigningRule {
        entry: String,
        #[source]
        source: PubSpecError,
    },
    #[error("signing config for {target:?} sets neither passphrase nor passphrase_file")]
    MissingPassphrase { target: String },
    #[error("invalid API url {url:?}: {source}")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Layout of the configuration file.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub profile: Vec<Profile>,
}

/// One profile: an API endpoint plus its signing defaults.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub signing: SigningSettings,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signing_rules: Vec<SigningRule>,
}

impl Default for Profile {
    fn default() -> Self {
        Profile {
            name: String::from(DEFAULT_PROFILE_NAME),
            url: String::from(DEFAULT_URL),
            signing: SigningSettings::default(),
            signing_rules: Vec::new(),
        }
    }
}

impl Profile {
    /// Apply one `key=value` override. Keys are dotted paths into the
    /// profile, e.g. `url` or `signing.gpgkey`.
    pub fn with_override(self, assignment: &str) -> Result<Profile, ConfigError> {
        let (key, raw) = assignment
            .split_once('=')
            .filter(|(key, _)| !key.is_empty())
            .ok_or_else(|| ConfigError::OverrideSyntax(assignment.to_string()))?;
        let fail = |message: String| ConfigError::Override {
            key: key.to_string(),
            message,
        };

        let document = toml::Value::try_from(&self).map_err(|err| fail(err.to_string()))?;
        let typed = parse_override_value(raw);
        let is_text = typed.is_str();
        match assign(document.clone(), key, typed) {
            Ok(profile) => Ok(profile),
            // `12345678` reads as an integer but is also a valid key id.
            Err(message) if !is_text => {
                assign(document, key, toml::Value::String(raw.to_string()))
                    .map_err(|_| fail(message))
            }
            Err(message) => Err(fail(message)),
        }
    }
}

/// Set the dotted `key` in a serialized profile and read the profile back.
fn assign(mut document: toml::Value, key: &str, value: toml::Value) -> Result<Profile, String> {
    let mut table = document
        .as_table_mut()
        .ok_or_else(|| String::from("profile is not a table"))?;
    let mut path = key.split('.').peekable();
    while let Some(segment) = path.next() {
        if path.peek().is_none() {
            table.insert(segment.to_string(), value);
            break;
        }
        table = table
            .entry(segment.to_string())
            .or_insert_with(|| toml::Value::Table(toml::Table::new()))
            .as_table_mut()
            .ok_or_else(|| format!("{segment:?} is not a table"))?;
    }
    document
        .try_into::<Profile>()
        .map_err(|err| err.message().to_string())
}

/// Values are read as TOML where possible (`true`, `3`), otherwise as strings.
fn parse_override_value(raw: &str) -> toml::Value {
    toml::from_str::<toml::Table>(&format!("value = {raw}"))
        .ok()
        .and_then(|mut table| table.remove("value"))
        .unwrap_or_else(|| toml::Value::String(raw.to_string()))
}

/// Process-wide configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub profile: Profile,
    pub url: Url,
    rules: Vec<CompiledRule>,
}

impl Config {
    /// Load the configuration the general client runs with.
    ///
    /// - `path`: explicit config file; when absent the per-user file and then
    ///   the system file are tried, and the built-in default profile is used
    ///   if neither exists.
    /// - `profile`: profile name, or zero-based index.
    /// - `overrides`: `key=value` assignments applied to the chosen profile.
    #[instrument(skip(overrides))]
    pub fn load(
        path: Option<&Path>,
        profile: &str,
        overrides: &[String],
    ) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => Some(path.to_path_buf()),
            None => default_paths().into_iter().find(|path| path.is_file()),
        };

        let selected = match path {
            Some(path) => {
                debug!(?path, "reading config file");
                let contents = std::fs::read_to_string(&path).map_err(|source| {
                    ConfigError::Read {
                        path: path.clone(),
                        source,
                    }
                })?;
                let file = toml::from_str::<ConfigFile>(&contents).map_err(|source| {
                    ConfigError::Parse {
                        path: path.clone(),
                        source,
                    }
                })?;
                if file.profile.is_empty() {
                    return Err(ConfigError::NoProfiles(path));
                }
                select_profile(file.profile, profile)?
            }
            None => {
                debug!("no config file found, using built-in defaults");
                Profile::default()
            }
        };

        let profile = overrides
            .iter()
            .try_fold(selected, |profile, assignment| profile.with_override(assignment))?;
        Self::from_profile(profile)
    }

    /// Build a configuration directly from a profile.
    pub fn from_profile(profile: Profile) -> Result<Self, ConfigError> {
        let url = parse_url(&profile.url)?;
        let rules = profile
            .signing_rules
            .iter()
            .map(CompiledRule::compile)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(profile = ?profile.name, %url, rules = rules.len(), "configuration ready");
        Ok(Self {
            profile,
            url,
            rules,
        })
    }

    /// Signing parameters for a publish.
    pub fn signing_for(&self, spec: &PubSpec) -> Result<SigningConfig, ConfigError> {
        let settings = signing::resolve(&self.profile.signing, &self.rules, spec);
        SigningConfig::from_settings(settings, &spec.to_string())
    }

    /// The profile-wide signing parameters, ignoring publish rules.
    pub fn profile_signing(&self) -> Result<SigningConfig, ConfigError> {
        SigningConfig::from_settings(self.profile.signing.clone(), &self.profile.name)
    }
}

/// Config file locations, in lookup order.
pub fn default_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".config").join(CONFIG_FILE_NAME));
    }
    paths.push(Path::new("/etc").join(CONFIG_FILE_NAME));
    paths
}

/// Pick a profile by name, falling back to a zero-based index.
fn select_profile(mut profiles: Vec<Profile>, selector: &str) -> Result<Profile, ConfigError> {
    if let Some(position) = profiles.iter().position(|p| p.name == selector) {
        return Ok(profiles.swap_remove(position));
    }
    selector
        .parse::<usize>()
        .ok()
        .and_then(|index| profiles.into_iter().nth(index))
        .ok_or_else(|| ConfigError::ProfileNotFound(selector.to_string()))
}

/// Parse the API URL, making sure relative joins land under its path.
fn parse_url(raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw).map_err(|source| ConfigError::Url {
        url: raw.to_string(),
        source,
    })?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
