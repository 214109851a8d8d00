use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard},
};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use axum_test::TestServer;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::{
    api::{
        Client, Version,
        publish::{CreatePublishRequest, PublishedRepo, Source, UpdatePublishRequest},
        repo::{CreateRepoRequest, LocalRepo, PackageDetails, PackageRefsRequest},
        snapshot::{CreateSnapshotRequest, Snapshot},
    },
    config::{Config, Profile, SigningSettings},
};

/// Passphrase file configured by [`FakeAptly::config`].
pub const PASSPHRASE_FILE: &str = "/etc/aptly/test-passphrase";

/// Version reported by `GET /api/version`.
pub const SERVER_VERSION: &str = "1.5.0";

/// Everything the fake server knows, plus a record of the mutating calls it
/// received.
#[derive(Debug, Default)]
pub struct FakeState {
    pub publishes: Vec<PublishedRepo>,
    pub repos: Vec<LocalRepo>,
    /// Package keys per local repo.
    pub packages: BTreeMap<String, Vec<String>>,
    pub snapshots: Vec<Snapshot>,

    /// Unescaped prefix and body of every accepted publish.
    pub created: Vec<(String, CreatePublishRequest)>,
    /// Unescaped prefix, distribution and body of every accepted update.
    pub updated: Vec<(String, String, UpdatePublishRequest)>,
    /// Unescaped prefix, distribution and force flag of every accepted drop.
    pub dropped: Vec<(String, String, bool)>,
}

type Shared = Arc<Mutex<FakeState>>;

/// A fake Aptly server listening on a local port.
pub struct FakeAptly {
    /// The test server; usable directly as a client for raw requests.
    pub http: TestServer,

    /// The root URL of the server, as it would appear in a profile.
    pub url: Url,

    state: Shared,
}

impl FakeAptly {
    /// A server with no publishes, repos or snapshots.
    pub fn new() -> Self {
        Self::with_state(FakeState::default())
    }

    pub fn with_state(state: FakeState) -> Self {
        let state = Arc::new(Mutex::new(state));
        let http = TestServer::builder()
            .http_transport()
            .build(router(state.clone()))
            .expect("create test server");
        let url = http.server_url("/").expect("construct server base url");
        FakeAptly { http, url, state }
    }

    /// A config pointing at this server that signs with a passphrase file.
    pub fn config(&self) -> Config {
        Config::from_profile(Profile {
            name: String::from("test"),
            url: self.url.to_string(),
            signing: SigningSettings {
                batch: Some(true),
                passphrase_file: Some(String::from(PASSPHRASE_FILE)),
                ..Default::default()
            },
            ..Default::default()
        })
        .expect("valid test config")
    }

    pub fn client(&self) -> Client {
        Client::new(self.url.clone()).expect("build client")
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake state lock")
    }
}

/// A published repo as the API would list it.
///
/// Sources are written like on the command line: `name=component` or `name`.
pub fn published(
    prefix: &str,
    distribution: &str,
    source_kind: &str,
    sources: &[&str],
) -> PublishedRepo {
    PublishedRepo {
        prefix: prefix.to_string(),
        distribution: distribution.to_string(),
        source_kind: source_kind.to_string(),
        architectures: vec![String::from("amd64")],
        sources: sources
            .iter()
            .map(|token| token.parse::<Source>().expect("valid source"))
            .collect(),
        ..Default::default()
    }
}

fn router(state: Shared) -> Router {
    let api = Router::new()
        .route("/version", get(version))
        .route("/publish", get(publish_list))
        .route("/publish/{prefix}", post(publish_create))
        .route(
            "/publish/{prefix}/{distribution}",
            put(publish_update).delete(publish_drop),
        )
        .route("/repos", get(repo_list).post(repo_create))
        .route("/repos/{name}", get(repo_show).delete(repo_delete))
        .route(
            "/repos/{name}/packages",
            get(repo_packages)
                .post(repo_add_packages)
                .delete(repo_remove_packages),
        )
        .route("/repos/{name}/snapshots", post(snapshot_create))
        .route("/snapshots", get(snapshot_list))
        .route("/snapshots/{name}", get(snapshot_show).delete(snapshot_delete));

    Router::new()
        .nest("/api", api)
        .fallback(|| async { (StatusCode::NOT_FOUND, "404 page not found") })
        .with_state(state)
}

/// An error body the way Aptly writes it.
fn error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

fn lock(state: &Shared) -> MutexGuard<'_, FakeState> {
    state.lock().expect("fake state lock")
}

/// Reverse the prefix escaping clients apply in publish URLs.
fn unescape_prefix(escaped: &str) -> String {
    let prefix = escaped.replace('_', "/").replace("//", "_");
    match prefix.strip_prefix(':') {
        Some(rest) => rest.to_string(),
        None => prefix,
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ForceQuery {
    force: Option<String>,
}

impl ForceQuery {
    fn is_set(&self) -> bool {
        self.force.as_deref() == Some("1")
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct PackagesQuery {
    q: Option<String>,
    format: Option<String>,
}

async fn version() -> Json<Version> {
    Json(Version {
        version: String::from(SERVER_VERSION),
    })
}

async fn publish_list(State(state): State<Shared>) -> Json<Vec<PublishedRepo>> {
    Json(lock(&state).publishes.clone())
}

async fn publish_create(
    State(state): State<Shared>,
    Path(prefix): Path<String>,
    Json(request): Json<CreatePublishRequest>,
) -> Response {
    let prefix = unescape_prefix(&prefix);
    let mut state = lock(&state);
    if state
        .publishes
        .iter()
        .any(|p| p.prefix == prefix && p.distribution == request.distribution)
    {
        return error(
            StatusCode::BAD_REQUEST,
            format!(
                "prefix/distribution {prefix}/{} already used by another published repo",
                request.distribution
            ),
        );
    }

    let publish = PublishedRepo {
        prefix: prefix.clone(),
        distribution: request.distribution.clone(),
        source_kind: request.publish.source_kind.to_string(),
        label: request.publish.label.clone().unwrap_or_default(),
        origin: request.publish.origin.clone().unwrap_or_default(),
        architectures: request.publish.architectures.clone(),
        sources: request.publish.sources.clone(),
        ..Default::default()
    };
    state.publishes.push(publish.clone());
    state.created.push((prefix, request));
    (StatusCode::CREATED, Json(publish)).into_response()
}

fn publish_position(state: &FakeState, prefix: &str, distribution: &str) -> Result<usize, Response> {
    state
        .publishes
        .iter()
        .position(|p| p.prefix == prefix && p.distribution == distribution)
        .ok_or_else(|| {
            error(
                StatusCode::NOT_FOUND,
                format!("published repo with prefix/distribution {prefix}/{distribution} not found"),
            )
        })
}

async fn publish_update(
    State(state): State<Shared>,
    Path((prefix, distribution)): Path<(String, String)>,
    Json(request): Json<UpdatePublishRequest>,
) -> Response {
    let prefix = unescape_prefix(&prefix);
    let mut state = lock(&state);
    let position = match publish_position(&state, &prefix, &distribution) {
        Ok(position) => position,
        Err(response) => return response,
    };
    let publish = state.publishes[position].clone();
    state.updated.push((prefix, distribution, request));
    Json(publish).into_response()
}

async fn publish_drop(
    State(state): State<Shared>,
    Path((prefix, distribution)): Path<(String, String)>,
    Query(query): Query<ForceQuery>,
) -> Response {
    let prefix = unescape_prefix(&prefix);
    let mut state = lock(&state);
    let position = match publish_position(&state, &prefix, &distribution) {
        Ok(position) => position,
        Err(response) => return response,
    };
    state.publishes.remove(position);
    state.dropped.push((prefix, distribution, query.is_set()));
    Json(json!({})).into_response()
}

fn repo_not_found(name: &str) -> Response {
    error(
        StatusCode::NOT_FOUND,
        format!("local repo with name {name} not found"),
    )
}

async fn repo_list(State(state): State<Shared>) -> Json<Vec<LocalRepo>> {
    Json(lock(&state).repos.clone())
}

async fn repo_show(State(state): State<Shared>, Path(name): Path<String>) -> Response {
    match lock(&state).repos.iter().find(|r| r.name == name) {
        Some(repo) => Json(repo.clone()).into_response(),
        None => repo_not_found(&name),
    }
}

async fn repo_create(
    State(state): State<Shared>,
    Json(request): Json<CreateRepoRequest>,
) -> Response {
    let mut state = lock(&state);
    if state.repos.iter().any(|r| r.name == request.name) {
        return error(
            StatusCode::CONFLICT,
            format!("local repo with name {} already exists", request.name),
        );
    }
    let repo = LocalRepo {
        name: request.name,
        comment: request.comment.unwrap_or_default(),
        default_distribution: request.default_distribution.unwrap_or_default(),
        default_component: request.default_component.unwrap_or_default(),
    };
    state.repos.push(repo.clone());
    (StatusCode::CREATED, Json(repo)).into_response()
}

async fn repo_delete(State(state): State<Shared>, Path(name): Path<String>) -> Response {
    let mut state = lock(&state);
    let Some(position) = state.repos.iter().position(|r| r.name == name) else {
        return repo_not_found(&name);
    };
    state.repos.remove(position);
    state.packages.remove(&name);
    Json(json!({})).into_response()
}

/// Split a package key such as `Pamd64 nginx 1.14.0 a1b2c3d4`.
fn package_details(key: &str) -> PackageDetails {
    let mut parts = key.split_whitespace();
    let architecture = parts
        .next()
        .map(|arch| arch.trim_start_matches('P').to_string())
        .unwrap_or_default();
    PackageDetails {
        key: key.to_string(),
        package: parts.next().unwrap_or_default().to_string(),
        version: parts.next().unwrap_or_default().to_string(),
        architecture,
    }
}

async fn repo_packages(
    State(state): State<Shared>,
    Path(name): Path<String>,
    Query(query): Query<PackagesQuery>,
) -> Response {
    let state = lock(&state);
    if !state.repos.iter().any(|r| r.name == name) {
        return repo_not_found(&name);
    }
    let keys = state
        .packages
        .get(&name)
        .into_iter()
        .flatten()
        .filter(|key| {
            query
                .q
                .as_deref()
                .is_none_or(|q| package_details(key).package == q)
        })
        .cloned()
        .collect::<Vec<_>>();
    match query.format.as_deref() {
        Some("details") => Json(keys.iter().map(|key| package_details(key)).collect::<Vec<_>>())
            .into_response(),
        _ => Json(keys).into_response(),
    }
}

async fn repo_add_packages(
    State(state): State<Shared>,
    Path(name): Path<String>,
    Json(request): Json<PackageRefsRequest>,
) -> Response {
    let mut state = lock(&state);
    let Some(repo) = state.repos.iter().find(|r| r.name == name).cloned() else {
        return repo_not_found(&name);
    };
    let keys = state.packages.entry(name).or_default();
    for key in request.package_refs {
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    Json(repo).into_response()
}

async fn repo_remove_packages(
    State(state): State<Shared>,
    Path(name): Path<String>,
    Json(request): Json<PackageRefsRequest>,
) -> Response {
    let mut state = lock(&state);
    let Some(repo) = state.repos.iter().find(|r| r.name == name).cloned() else {
        return repo_not_found(&name);
    };
    let keys = state.packages.entry(name).or_default();
    keys.retain(|key| !request.package_refs.contains(key));
    Json(repo).into_response()
}

async fn snapshot_create(
    State(state): State<Shared>,
    Path(repo): Path<String>,
    Json(request): Json<CreateSnapshotRequest>,
) -> Response {
    let mut state = lock(&state);
    if !state.repos.iter().any(|r| r.name == repo) {
        return repo_not_found(&repo);
    }
    if state.snapshots.iter().any(|s| s.name == request.name) {
        return error(
            StatusCode::BAD_REQUEST,
            format!("snapshot with name {} already exists", request.name),
        );
    }
    let snapshot = Snapshot {
        name: request.name,
        description: request
            .description
            .unwrap_or_else(|| format!("Snapshot from local repo [{repo}]")),
        created_at: String::from("2024-01-15T10:00:00Z"),
    };
    state.snapshots.push(snapshot.clone());
    (StatusCode::CREATED, Json(snapshot)).into_response()
}

fn snapshot_not_found(name: &str) -> Response {
    error(
        StatusCode::NOT_FOUND,
        format!("snapshot with name {name} not found"),
    )
}

async fn snapshot_list(State(state): State<Shared>) -> Json<Vec<Snapshot>> {
    Json(lock(&state).snapshots.clone())
}

async fn snapshot_show(State(state): State<Shared>, Path(name): Path<String>) -> Response {
    match lock(&state).snapshots.iter().find(|s| s.name == name) {
        Some(snapshot) => Json(snapshot.clone()).into_response(),
        None => snapshot_not_found(&name),
    }
}

async fn snapshot_delete(State(state): State<Shared>, Path(name): Path<String>) -> Response {
    let mut state = lock(&state);
    let Some(position) = state.snapshots.iter().position(|s| s.name == name) else {
        return snapshot_not_found(&name);
    };
    state.snapshots.remove(position);
    Json(json!({})).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_unescaping() {
        assert_eq!(unescape_prefix(":."), ".");
        assert_eq!(unescape_prefix("nightly"), "nightly");
        assert_eq!(unescape_prefix("a__b_c"), "a_b/c");
    }
}
