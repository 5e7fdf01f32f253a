//! # Repoflow
//!
//! An engine for acquiring data about code repositories and running it
//! through configurable analysis pipelines.
//!
//! Repoflow coordinates the expensive parts of repository analysis so that
//! concurrent or closely-spaced requests do not repeat work:
//!
//! - **Single-flight acquisition**: at most one fetch per datasource key is
//!   in flight at any time; concurrent requesters wait and reuse the result
//! - **TTL caching**: datasource results are memoized with per-entry expiry
//! - **Working-copy management**: local clones are created once, refreshed
//!   by fast-forward pull only when stale, and shared between requests
//! - **Sequential pipelines**: acquired data flows through preprocessors in
//!   declared order into a terminal analysis
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use repoflow::prelude::*;
//!
//! let engine = Engine::new(EngineConfig::default());
//! let components = ComponentSet::new();
//! // ... register datasources, preprocessors and analyses ...
//!
//! let repo = RepoId::new("acme", "widgets");
//! let artifact = engine
//!     .analyze(&repo, &components, &preprocessors, analysis.as_ref(), None)
//!     .await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cache;
pub mod checkout;
pub mod components;
pub mod engine;
pub mod errors;
pub mod freshness;
pub mod locks;
pub mod observability;
pub mod pipeline;
pub mod resolve;
pub mod viz;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cache::TtlCache;
    pub use crate::checkout::CheckoutManager;
    pub use crate::components::{
        Analysis, ComponentSet, Credential, Datasource, DatasourceKind,
        FetchContext, FnAnalysis, FnDatasource, FnPreprocessor, Preprocessor,
        Record, RepoId,
    };
    pub use crate::engine::{Engine, EngineConfig};
    pub use crate::errors::RepoflowError;
    pub use crate::freshness::FreshnessTracker;
    pub use crate::locks::{LockGuard, LockRegistry};
    pub use crate::resolve::required_datasources;
    pub use crate::viz::{LineSeries, VizContext};
}
