use bon::Builder;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::Error;

use super::{Client, segment};

/// A local repository.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct LocalRepo {
    pub name: String,
    pub comment: String,
    pub default_distribution: String,
    pub default_component: String,
}

/// Body of `POST /api/repos`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Builder)]
#[serde(rename_all = "PascalCase")]
pub struct CreateRepoRequest {
    #[builder(into)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_distribution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_component: Option<String>,
}

/// Body for adding or removing packages by key.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct PackageRefsRequest {
    pub package_refs: Vec<String>,
}

/// A package as listed with `format=details`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct PackageDetails {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Package")]
    pub package: String,
    #[serde(rename = "Version")]
    pub version: String,
    #[serde(rename = "Architecture")]
    pub architecture: String,
}

impl Client {
    #[instrument(skip(self))]
    pub async fn repo_list(&self) -> Result<Vec<LocalRepo>, Error> {
        self.send(self.get("repos")?).await
    }

    #[instrument(skip(self))]
    pub async fn repo_show(&self, name: &str) -> Result<LocalRepo, Error> {
        self.send(self.get(&format!("repos/{}", segment(name)))?)
            .await
    }

    #[instrument(skip(self))]
    pub async fn repo_create(&self, request: &CreateRepoRequest) -> Result<LocalRepo, Error> {
        self.send(self.post("repos")?.json(request)).await
    }

    /// Delete a local repo. Without `force` Aptly refuses repos that are
    /// published or have snapshots.
    #[instrument(skip(self))]
    pub async fn repo_delete(&self, name: &str, force: bool) -> Result<(), Error> {
        let mut request = self.delete(&format!("repos/{}", segment(name)))?;
        if force {
            request = request.query(&[("force", "1")]);
        }
        self.execute(request).await.map(drop)
    }

    /// Keys of the packages in a repo, optionally filtered by an Aptly
    /// package query.
    #[instrument(skip(self))]
    pub async fn repo_packages(&self, name: &str, query: Option<&str>) -> Result<Vec<String>, Error> {
        let mut request = self.get(&format!("repos/{}/packages", segment(name)))?;
        if let Some(query) = query {
            request = request.query(&[("q", query)]);
        }
        self.send(request).await
    }

    #[instrument(skip(self))]
    pub async fn repo_packages_detailed(
        &self,
        name: &str,
        query: Option<&str>,
    ) -> Result<Vec<PackageDetails>, Error> {
        let mut request = self
            .get(&format!("repos/{}/packages", segment(name)))?
            .query(&[("format", "details")]);
        if let Some(query) = query {
            request = request.query(&[("q", query)]);
        }
        self.send(request).await
    }

    #[instrument(skip(self))]
    pub async fn repo_add_packages(
        &self,
        name: &str,
        package_refs: Vec<String>,
    ) -> Result<LocalRepo, Error> {
        let request = self
            .post(&format!("repos/{}/packages", segment(name)))?
            .json(&PackageRefsRequest { package_refs });
        self.send(request).await
    }

    #[instrument(skip(self))]
    pub async fn repo_remove_packages(
        &self,
        name: &str,
        package_refs: Vec<String>,
    ) -> Result<LocalRepo, Error> {
        let request = self
            .delete(&format!("repos/{}/packages", segment(name)))?
            .json(&PackageRefsRequest { package_refs });
        self.send(request).await
    }
}
