use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::Error;

use super::{Client, segment};

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct Snapshot {
    pub name: String,
    pub description: String,
    pub created_at: String,
}

/// Body of `POST /api/repos/:name/snapshots`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct CreateSnapshotRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Client {
    #[instrument(skip(self))]
    pub async fn snapshot_list(&self) -> Result<Vec<Snapshot>, Error> {
        self.send(self.get("snapshots")?).await
    }

    #[instrument(skip(self))]
    pub async fn snapshot_show(&self, name: &str) -> Result<Snapshot, Error> {
        self.send(self.get(&format!("snapshots/{}", segment(name)))?)
            .await
    }

    /// Snapshot the current contents of local repo `repo`.
    #[instrument(skip(self))]
    pub async fn snapshot_create_from_repo(
        &self,
        repo: &str,
        name: &str,
        description: Option<String>,
    ) -> Result<Snapshot, Error> {
        let request = self
            .post(&format!("repos/{}/snapshots", segment(repo)))?
            .json(&CreateSnapshotRequest {
                name: name.to_string(),
                description,
            });
        self.send(request).await
    }

    /// Delete a snapshot. Without `force` Aptly refuses snapshots that are
    /// published or were used to create other snapshots.
    #[instrument(skip(self))]
    pub async fn snapshot_delete(&self, name: &str, force: bool) -> Result<(), Error> {
        let mut request = self.delete(&format!("snapshots/{}", segment(name)))?;
        if force {
            request = request.query(&[("force", "1")]);
        }
        self.execute(request).await.map(drop)
    }
}
