//! Component model: datasources, preprocessors and analyses.
//!
//! Components are supplied by an external plugin collaborator; this module
//! defines the closed interfaces the engine consumes. A datasource extracts
//! raw data (from a local working copy or a hosted API), a preprocessor
//! transforms the assembled record, and an analysis turns the final record
//! into an artifact.

mod adapters;
mod set;

pub use adapters::{FnAnalysis, FnDatasource, FnPreprocessor};
pub use set::ComponentSet;

use crate::viz::VizContext;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

/// The record threaded through the pipeline, keyed by datasource name.
pub type Record = serde_json::Map<String, Value>;

/// Where a datasource reads its data from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DatasourceKind {
    /// Operates on a local working copy of the repository.
    RepositoryLocal,
    /// Calls a remote service API directly; no clone needed.
    HostedApi,
}

/// Identity of a remote repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId {
    /// The owning account or organization.
    pub owner: String,
    /// The repository name.
    pub name: String,
}

impl RepoId {
    /// Creates a repository identity.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// The `owner/name` key used for cache and lock namespacing.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// The HTTPS remote URL of the repository.
    #[must_use]
    pub fn remote_url(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.name)
    }
}

impl std::fmt::Display for RepoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// An opaque access token.
///
/// The secret never appears in `Debug` output and the type deliberately
/// implements neither `Display` nor serde traits, so it cannot leak into
/// logs or serialized artifacts by accident.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wraps a secret token.
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// The raw secret, for embedding into clone URLs and API requests.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Execution context handed to a datasource fetch.
///
/// The variant matches the datasource's [`kind`](Datasource::kind):
/// repository-local datasources read the working copy, hosted-api
/// datasources talk to the remote service.
#[derive(Debug, Clone)]
pub enum FetchContext {
    /// Context for a [`DatasourceKind::RepositoryLocal`] fetch.
    RepositoryLocal {
        /// Path to the materialized working copy.
        working_copy: PathBuf,
    },
    /// Context for a [`DatasourceKind::HostedApi`] fetch.
    HostedApi {
        /// The repository being analyzed.
        repo: RepoId,
        /// Access token, if the caller supplied one.
        credential: Option<Credential>,
        /// Shared HTTP client for API calls.
        client: reqwest::Client,
    },
}

/// A data-extraction component.
#[async_trait]
pub trait Datasource: Send + Sync {
    /// The datasource name; doubles as its key in the assembled record.
    fn name(&self) -> &str;

    /// Whether this datasource needs a working copy or a remote API.
    fn kind(&self) -> DatasourceKind;

    /// Cache TTL for this datasource's results.
    ///
    /// `None` means the engine default applies.
    fn ttl(&self) -> Option<Duration> {
        None
    }

    /// Executes the fetch.
    async fn fetch(&self, ctx: FetchContext) -> anyhow::Result<Value>;
}

/// A record transformation component.
///
/// Each transform receives the current record and returns a full
/// replacement; there is no partial merging.
#[async_trait]
pub trait Preprocessor: Send + Sync {
    /// The preprocessor name.
    fn name(&self) -> &str;

    /// Datasource names this preprocessor needs in the record.
    fn depends_on(&self) -> Vec<String> {
        Vec::new()
    }

    /// The preprocessor's configuration object.
    fn config(&self) -> Value {
        Value::Null
    }

    /// Transforms the record.
    async fn transform(&self, record: Record, config: &Value) -> anyhow::Result<Record>;
}

/// The terminal pipeline component.
#[async_trait]
pub trait Analysis: Send + Sync {
    /// The analysis name.
    fn name(&self) -> &str;

    /// Datasource names this analysis needs in the record.
    fn depends_on(&self) -> Vec<String>;

    /// Names of preprocessors to skip for this analysis.
    fn ignore_preprocessors(&self) -> Vec<String> {
        Vec::new()
    }

    /// The analysis's configuration object.
    fn config(&self) -> Value {
        Value::Null
    }

    /// Computes the final artifact from the transformed record.
    async fn compute(
        &self,
        record: Record,
        config: &Value,
        viz: &VizContext,
    ) -> anyhow::Result<Value>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_id_key_and_url() {
        let repo = RepoId::new("acme", "widgets");
        assert_eq!(repo.key(), "acme/widgets");
        assert_eq!(repo.remote_url(), "https://github.com/acme/widgets");
    }

    #[test]
    fn test_credential_debug_is_redacted() {
        let credential = Credential::new("hunter2");
        let debug = format!("{credential:?}");
        assert!(!debug.contains("hunter2"));
        assert_eq!(debug, "Credential(***)");
    }

    #[test]
    fn test_datasource_kind_serde_names() {
        let local = serde_json::to_string(&DatasourceKind::RepositoryLocal).unwrap();
        let hosted = serde_json::to_string(&DatasourceKind::HostedApi).unwrap();
        assert_eq!(local, "\"repository-local\"");
        assert_eq!(hosted, "\"hosted-api\"");
    }
}
