//! The acquisition and analysis engine.
//!
//! Owns the shared coordination state (cache, lock registry, freshness
//! tracker, working-copy manager) and drives complete analysis runs:
//! dependency resolution, working-copy materialization, concurrent
//! single-flight datasource acquisition and pipeline execution.
//!
//! All state is constructed per engine instance; multiple independent
//! engines can coexist in one process.

mod config;

pub use config::EngineConfig;

use crate::cache::TtlCache;
use crate::checkout::CheckoutManager;
use crate::components::{
    Analysis, ComponentSet, Credential, Datasource, DatasourceKind, FetchContext, Preprocessor,
    RepoId,
};
use crate::errors::RepoflowError;
use crate::freshness::FreshnessTracker;
use crate::locks::LockRegistry;
use crate::pipeline;
use crate::resolve::required_datasources;
use crate::viz::VizContext;
use futures::future::join_all;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// The repository analysis engine.
pub struct Engine {
    config: EngineConfig,
    cache: TtlCache<Value>,
    locks: LockRegistry,
    checkouts: CheckoutManager,
    client: reqwest::Client,
}

impl Engine {
    /// Creates an engine with freshly constructed coordination state.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let locks = LockRegistry::new(config.lock_timeout());
        let freshness = Arc::new(FreshnessTracker::new(config.stale_window()));
        let checkouts = CheckoutManager::new(
            config.workspace_root.clone(),
            locks.clone(),
            freshness,
        );
        Self {
            config,
            cache: TtlCache::new(),
            locks,
            checkouts,
            client: reqwest::Client::new(),
        }
    }

    /// The engine's result cache.
    #[must_use]
    pub fn cache(&self) -> &TtlCache<Value> {
        &self.cache
    }

    /// The engine's lock registry.
    #[must_use]
    pub fn locks(&self) -> &LockRegistry {
        &self.locks
    }

    /// The engine's working-copy manager.
    #[must_use]
    pub fn checkouts(&self) -> &CheckoutManager {
        &self.checkouts
    }

    /// Runs a complete analysis for `repo`.
    ///
    /// Resolves the datasources the analysis and preprocessors need,
    /// materializes the working copy if any of them is repository-local,
    /// acquires all datasources concurrently, and runs the pipeline.
    pub async fn analyze(
        &self,
        repo: &RepoId,
        components: &ComponentSet,
        preprocessors: &[Arc<dyn Preprocessor>],
        analysis: &dyn Analysis,
        credential: Option<&Credential>,
    ) -> Result<Value, RepoflowError> {
        let run_id = Uuid::new_v4();
        info!(
            repo = %repo,
            analysis = analysis.name(),
            run = %run_id,
            "starting analysis run"
        );

        let names = required_datasources(preprocessors, analysis);
        debug!(run = %run_id, datasources = ?names, "resolved datasource dependencies");

        let mut datasources = Vec::with_capacity(names.len());
        for name in &names {
            let datasource = components.datasource(name).ok_or_else(|| {
                RepoflowError::ComponentNotFound {
                    kind: "datasource",
                    name: name.clone(),
                }
            })?;
            datasources.push(datasource);
        }

        let needs_working_copy = datasources
            .iter()
            .any(|d| d.kind() == DatasourceKind::RepositoryLocal);
        let working_copy = if needs_working_copy {
            Some(self.checkouts.ensure(&repo.remote_url(), credential).await?)
        } else {
            None
        };

        let holder = run_id.to_string();
        let fetches = datasources.iter().map(|datasource| {
            let holder = holder.as_str();
            let working_copy = working_copy.as_deref();
            async move {
                let result = self
                    .acquire_as(holder, datasource.as_ref(), repo, working_copy, credential)
                    .await;
                (datasource.name().to_string(), result)
            }
        });

        let mut results = Vec::with_capacity(names.len());
        for (name, outcome) in join_all(fetches).await {
            results.push((name, outcome?));
        }

        let viz = VizContext::new();
        let artifact = pipeline::run(results, preprocessors, analysis, &viz).await?;
        info!(run = %run_id, "analysis run complete");
        Ok(artifact)
    }

    /// Acquires one datasource's result with single-flight semantics.
    ///
    /// For N concurrent callers on the same key, exactly one executes the
    /// underlying fetch; the rest wait and reuse the cached result.
    /// Repository-local datasources read `working_copy`, which must already
    /// be materialized.
    pub async fn acquire(
        &self,
        datasource: &dyn Datasource,
        repo: &RepoId,
        working_copy: Option<&Path>,
        credential: Option<&Credential>,
    ) -> Result<Value, RepoflowError> {
        self.acquire_as(
            &Uuid::new_v4().to_string(),
            datasource,
            repo,
            working_copy,
            credential,
        )
        .await
    }

    async fn acquire_as(
        &self,
        holder: &str,
        datasource: &dyn Datasource,
        repo: &RepoId,
        working_copy: Option<&Path>,
        credential: Option<&Credential>,
    ) -> Result<Value, RepoflowError> {
        let key = format!("{}/{}", repo.key(), datasource.name());
        loop {
            if let Some(value) = self.cache.load(&key) {
                debug!(key = %key, "cache hit");
                return Ok(value);
            }
            if let Some(_guard) = self.locks.try_lock(&key, holder) {
                // Another holder may have stored between our cache check
                // and taking the lock.
                if let Some(value) = self.cache.load(&key) {
                    return Ok(value);
                }
                debug!(key = %key, "executing datasource fetch");
                let ctx = self.fetch_context(datasource, repo, working_copy, credential)?;
                let value = datasource.fetch(ctx).await.map_err(|source| {
                    RepoflowError::Acquisition {
                        datasource: datasource.name().to_string(),
                        source,
                    }
                })?;
                let ttl = datasource.ttl().unwrap_or_else(|| self.config.default_ttl());
                self.cache.store(key, value.clone(), ttl);
                return Ok(value);
            }
            self.locks.wait_for_unlock(&key).await;
        }
    }

    fn fetch_context(
        &self,
        datasource: &dyn Datasource,
        repo: &RepoId,
        working_copy: Option<&Path>,
        credential: Option<&Credential>,
    ) -> Result<FetchContext, RepoflowError> {
        match datasource.kind() {
            DatasourceKind::RepositoryLocal => {
                let working_copy = working_copy.ok_or_else(|| {
                    RepoflowError::Internal(format!(
                        "repository-local datasource '{}' requires a working copy",
                        datasource.name()
                    ))
                })?;
                Ok(FetchContext::RepositoryLocal {
                    working_copy: working_copy.to_path_buf(),
                })
            }
            DatasourceKind::HostedApi => Ok(FetchContext::HostedApi {
                repo: repo.clone(),
                credential: credential.cloned(),
                client: self.client.clone(),
            }),
        }
    }

    /// Forgets everything the engine holds for `owner/name`.
    ///
    /// Invalidates every cache entry under the repository's key prefix and
    /// deletes its working copy, waiting out any in-flight lock first.
    /// Unrelated repositories are untouched.
    pub async fn cleanup(&self, owner: &str, name: &str) -> Result<(), RepoflowError> {
        let repo = RepoId::new(owner, name);
        let prefix = repo.key();
        for key in self.cache.keys(Some(&prefix)) {
            self.cache.delete(&key);
        }
        self.checkouts.remove(&repo.remote_url()).await?;
        info!(repo = %prefix, "cleaned up cached results and working copy");
        Ok(())
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .finish()
    }
}
