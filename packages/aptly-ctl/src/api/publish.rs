use std::{fmt, str::FromStr};

use bon::Builder;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{
    Error, PubSpec,
    config::{SigningOptions, signing::SigningValue},
    pubspec::PubSpecError,
};

use super::{Client, segment};

/// What a publish is built from.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Local,
    Snapshot,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Local => f.write_str("local"),
            SourceKind::Snapshot => f.write_str("snapshot"),
        }
    }
}

/// A local repo or snapshot contributing packages to a publish.
///
/// On the command line this is written `name=component`; the component may be
/// left out, in which case Aptly takes the source's default component.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Source {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(
        rename = "Component",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub component: Option<String>,
}

impl FromStr for Source {
    type Err = Error;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let (name, component) = token.split_once('=').unwrap_or((token, ""));
        if name.is_empty() {
            return Err(Error::validation(format!(
                "source '{token}' invalid, expected 'name=component' or 'name'"
            )));
        }
        Ok(Source {
            name: name.to_string(),
            component: (!component.is_empty()).then(|| component.to_string()),
        })
    }
}

/// A published repository as the API reports it.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct PublishedRepo {
    pub prefix: String,
    pub distribution: String,
    pub storage: String,
    pub source_kind: String,
    pub label: String,
    pub origin: String,
    pub architectures: Vec<String>,
    pub sources: Vec<Source>,
    pub acquire_by_hash: bool,
    pub not_automatic: String,
    pub but_automatic_upgrades: String,
}

impl PublishedRepo {
    /// The spec that addresses this publish, storage included.
    pub fn pub_spec(&self) -> Result<PubSpec, PubSpecError> {
        if self.storage.is_empty() {
            PubSpec::new(self.prefix.as_str(), self.distribution.as_str())
        } else {
            PubSpec::new(
                format!("{}:{}", self.storage, self.prefix),
                self.distribution.as_str(),
            )
        }
    }
}

/// Aptly's `Signing` object.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct Signing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch: Option<bool>,
    #[serde(rename = "GpgKey", default, skip_serializing_if = "Option::is_none")]
    pub gpg_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyring: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_keyring: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passphrase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passphrase_file: Option<String>,
}

impl Signing {
    /// Collect the options stored under `prefix` into a `Signing` object.
    ///
    /// Options with other prefixes, unknown names, or the wrong value type are
    /// ignored.
    pub fn from_options(options: &SigningOptions, prefix: &str) -> Self {
        let mut signing = Signing::default();
        for (key, value) in options {
            let Some(name) = key.strip_prefix(prefix) else {
                continue;
            };
            match (name, value) {
                ("skip", SigningValue::Flag(flag)) => signing.skip = Some(*flag),
                ("batch", SigningValue::Flag(flag)) => signing.batch = Some(*flag),
                ("gpgkey", SigningValue::Text(text)) => signing.gpg_key = Some(text.clone()),
                ("keyring", SigningValue::Text(text)) => signing.keyring = Some(text.clone()),
                ("secret_keyring", SigningValue::Text(text)) => {
                    signing.secret_keyring = Some(text.clone())
                }
                ("passphrase", SigningValue::Text(text)) => signing.passphrase = Some(text.clone()),
                ("passphrase_file", SigningValue::Text(text)) => {
                    signing.passphrase_file = Some(text.clone())
                }
                _ => debug!(?key, ?value, "ignoring signing option"),
            }
        }
        signing
    }
}

/// The parts of a new publish that aren't its address or signing.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Builder)]
#[serde(rename_all = "PascalCase")]
pub struct NewPublish {
    pub source_kind: SourceKind,
    pub sources: Vec<Source>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub architectures: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default)]
    #[builder(default)]
    pub force_overwrite: bool,
}

/// Body of `POST /api/publish/:prefix`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct CreatePublishRequest {
    pub distribution: String,
    #[serde(flatten)]
    pub publish: NewPublish,
    pub signing: Signing,
}

/// Body of `PUT /api/publish/:prefix/:distribution`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct UpdatePublishRequest {
    #[serde(default)]
    pub force_overwrite: bool,
    pub signing: Signing,
}

impl Client {
    #[instrument(skip(self))]
    pub async fn publish_list(&self) -> Result<Vec<PublishedRepo>, Error> {
        self.send(self.get("publish")?).await
    }

    /// Publish `publish` at `spec`, signing with the options under `prefix`.
    #[instrument(skip(self, signing))]
    pub async fn publish_create(
        &self,
        spec: &PubSpec,
        publish: NewPublish,
        signing: &SigningOptions,
        prefix: &str,
    ) -> Result<PublishedRepo, Error> {
        let request = CreatePublishRequest {
            distribution: spec.distribution().to_string(),
            publish,
            signing: Signing::from_options(signing, prefix),
        };
        let path = format!("publish/{}", segment(&spec.api_prefix()));
        self.send(self.post(&path)?.json(&request)).await
    }

    /// Re-publish a local repo, or re-sign a snapshot publish, at `spec`.
    #[instrument(skip(self, signing))]
    pub async fn publish_update(
        &self,
        spec: &PubSpec,
        force_overwrite: bool,
        signing: &SigningOptions,
        prefix: &str,
    ) -> Result<PublishedRepo, Error> {
        let request = UpdatePublishRequest {
            force_overwrite,
            signing: Signing::from_options(signing, prefix),
        };
        self.send(self.put(&publish_path(spec))?.json(&request))
            .await
    }

    #[instrument(skip(self))]
    pub async fn publish_drop(&self, spec: &PubSpec, force: bool) -> Result<(), Error> {
        let mut request = self.delete(&publish_path(spec))?;
        if force {
            request = request.query(&[("force", "1")]);
        }
        self.execute(request).await.map(drop)
    }
}

fn publish_path(spec: &PubSpec) -> String {
    format!(
        "publish/{}/{}",
        segment(&spec.api_prefix()),
        segment(spec.distribution())
    )
}
