//! GPG signing parameters and their per-publish resolution.
//!
//! Signing itself happens on the Aptly server; the client only tells the
//! server which key and passphrase to use. A profile carries a default set of
//! parameters, and `[[profile.signing_rules]]` entries override them for
//! specific publishes:
//!
//! ```toml
//! [profile.signing]
//! passphrase_file = "/etc/aptly/passphrase"
//! batch = true
//!
//! [[profile.signing_rules]]
//! publishes = ["stable", "nightly/*"]
//! gpgkey = "B2C3D4E5"
//! ```

use std::{collections::BTreeMap, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::pubspec::{DEFAULT_PREFIX, PubSpec};

use super::ConfigError;

/// Key prefix the API client expects signing options under.
pub const SIGNING_OPTION_PREFIX: &str = "sign_";

/// Signing parameters as written in the configuration file.
///
/// Every field is optional so that rules only need to name what they change.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SigningSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpgkey: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyring: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_keyring: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passphrase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passphrase_file: Option<String>,
}

impl SigningSettings {
    /// Layer `other` on top of `self`; fields set in `other` win.
    pub fn merge(&self, other: &SigningSettings) -> SigningSettings {
        SigningSettings {
            skip: other.skip.or(self.skip),
            batch: other.batch.or(self.batch),
            gpgkey: other.gpgkey.clone().or_else(|| self.gpgkey.clone()),
            keyring: other.keyring.clone().or_else(|| self.keyring.clone()),
            secret_keyring: other
                .secret_keyring
                .clone()
                .or_else(|| self.secret_keyring.clone()),
            passphrase: other.passphrase.clone().or_else(|| self.passphrase.clone()),
            passphrase_file: other
                .passphrase_file
                .clone()
                .or_else(|| self.passphrase_file.clone()),
        }
    }
}

/// A publish-specific override, as written in the configuration file.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(from = "SigningRuleEntry")]
pub struct SigningRule {
    /// PUB_SPECs this rule applies to; `prefix/*` matches every
    /// distribution under a prefix.
    pub publishes: Vec<String>,
    #[serde(flatten)]
    pub settings: SigningSettings,
}

/// The file layout of a rule. `flatten` cannot reject unknown keys, so the
/// settings fields are spelled out here.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SigningRuleEntry {
    publishes: Vec<String>,
    skip: Option<bool>,
    batch: Option<bool>,
    gpgkey: Option<String>,
    keyring: Option<String>,
    secret_keyring: Option<String>,
    passphrase: Option<String>,
    passphrase_file: Option<String>,
}

impl From<SigningRuleEntry> for SigningRule {
    fn from(entry: SigningRuleEntry) -> Self {
        SigningRule {
            publishes: entry.publishes,
            settings: SigningSettings {
                skip: entry.skip,
                batch: entry.batch,
                gpgkey: entry.gpgkey,
                keyring: entry.keyring,
                secret_keyring: entry.secret_keyring,
                passphrase: entry.passphrase,
                passphrase_file: entry.passphrase_file,
            },
        }
    }
}

/// One entry of a rule's `publishes` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleTarget {
    Exact(PubSpec),
    Prefix(String),
}

impl RuleTarget {
    fn matches(&self, spec: &PubSpec) -> Option<Specificity> {
        match self {
            RuleTarget::Exact(target) if target == spec => Some(Specificity::Exact),
            RuleTarget::Prefix(prefix) if prefix == spec.prefix() => Some(Specificity::Prefix),
            _ => None,
        }
    }
}

impl FromStr for RuleTarget {
    type Err = ConfigError;

    fn from_str(entry: &str) -> Result<Self, Self::Err> {
        if let Some(prefix) = entry.strip_suffix("/*") {
            let prefix = if prefix.is_empty() { DEFAULT_PREFIX } else { prefix };
            // Validate the prefix the same way a full spec would be.
            let spec = PubSpec::new(prefix, "*").map_err(|source| ConfigError::SigningRule {
                entry: entry.to_string(),
                source,
            })?;
            return Ok(RuleTarget::Prefix(spec.prefix().to_string()));
        }
        entry
            .parse()
            .map(RuleTarget::Exact)
            .map_err(|source| ConfigError::SigningRule {
                entry: entry.to_string(),
                source,
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Specificity {
    Prefix,
    Exact,
}

/// A rule with its targets parsed.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    targets: Vec<RuleTarget>,
    settings: SigningSettings,
}

impl CompiledRule {
    pub fn compile(rule: &SigningRule) -> Result<Self, ConfigError> {
        let targets = rule
            .publishes
            .iter()
            .map(|entry| entry.parse())
            .collect::<Result<Vec<RuleTarget>, _>>()?;
        Ok(Self {
            targets,
            settings: rule.settings.clone(),
        })
    }

    fn specificity(&self, spec: &PubSpec) -> Option<Specificity> {
        self.targets.iter().filter_map(|t| t.matches(spec)).max()
    }
}

/// Pick the settings for `spec`: the first exact rule, else the first prefix
/// rule, layered over the profile default.
pub fn resolve(
    defaults: &SigningSettings,
    rules: &[CompiledRule],
    spec: &PubSpec,
) -> SigningSettings {
    let mut best: Option<(Specificity, &CompiledRule)> = None;
    for rule in rules {
        if let Some(specificity) = rule.specificity(spec)
            && best.is_none_or(|(current, _)| specificity > current)
        {
            best = Some((specificity, rule));
        }
    }
    match best {
        Some((_, rule)) => defaults.merge(&rule.settings),
        None => defaults.clone(),
    }
}

/// A value in the flat signing option set.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum SigningValue {
    Flag(bool),
    Text(String),
}

/// Flat, prefixed signing options, e.g. `sign_gpgkey`.
pub type SigningOptions = BTreeMap<String, SigningValue>;

/// Fully resolved signing parameters for one API call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SigningConfig {
    pub skip: bool,
    pub batch: bool,
    pub gpgkey: Option<String>,
    pub keyring: Option<String>,
    pub secret_keyring: Option<String>,
    pub passphrase: Option<String>,
    pub passphrase_file: Option<String>,
}

impl SigningConfig {
    /// Turn resolved settings into a usable config.
    ///
    /// `target` names what the config is for, and only shows up in the error
    /// when neither a passphrase nor a passphrase file is configured.
    pub fn from_settings(settings: SigningSettings, target: &str) -> Result<Self, ConfigError> {
        let config = SigningConfig {
            skip: settings.skip.unwrap_or(false),
            batch: settings.batch.unwrap_or(false),
            gpgkey: settings.gpgkey,
            keyring: settings.keyring,
            secret_keyring: settings.secret_keyring,
            passphrase: settings.passphrase,
            passphrase_file: settings.passphrase_file,
        };
        if !config.skip && config.passphrase.is_none() && config.passphrase_file.is_none() {
            return Err(ConfigError::MissingPassphrase {
                target: target.to_string(),
            });
        }
        Ok(config)
    }

    /// Signing disabled.
    pub fn skipped() -> Self {
        SigningConfig {
            skip: true,
            ..Default::default()
        }
    }

    /// Flatten into an option set with every key prefixed by `prefix`.
    ///
    /// With `skip` set only the skip flag is emitted.
    pub fn as_options(&self, prefix: &str) -> SigningOptions {
        let key = |name: &str| format!("{prefix}{name}");
        let mut options = SigningOptions::new();
        options.insert(key("skip"), SigningValue::Flag(self.skip));
        if self.skip {
            return options;
        }
        options.insert(key("batch"), SigningValue::Flag(self.batch));
        let texts = [
            ("gpgkey", &self.gpgkey),
            ("keyring", &self.keyring),
            ("secret_keyring", &self.secret_keyring),
            ("passphrase", &self.passphrase),
            ("passphrase_file", &self.passphrase_file),
        ];
        for (name, value) in texts {
            if let Some(value) = value {
                options.insert(key(name), SigningValue::Text(value.clone()));
            }
        }
        options
    }
}
