//! Closure-based component implementations.
//!
//! Handy for embedders that do not want to define a struct per component,
//! and for tests.

use super::{Analysis, Datasource, DatasourceKind, FetchContext, Preprocessor, Record};
use crate::viz::VizContext;
use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::marker::PhantomData;
use std::time::Duration;

/// A datasource backed by an async closure.
pub struct FnDatasource<F, Fut> {
    name: String,
    kind: DatasourceKind,
    ttl: Option<Duration>,
    func: F,
    _phantom: PhantomData<fn() -> Fut>,
}

impl<F, Fut> FnDatasource<F, Fut>
where
    F: Fn(FetchContext) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Value>> + Send,
{
    /// Creates a closure-backed datasource.
    pub fn new(name: impl Into<String>, kind: DatasourceKind, func: F) -> Self {
        Self {
            name: name.into(),
            kind,
            ttl: None,
            func,
            _phantom: PhantomData,
        }
    }

    /// Sets an explicit cache TTL.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

#[async_trait]
impl<F, Fut> Datasource for FnDatasource<F, Fut>
where
    F: Fn(FetchContext) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Value>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> DatasourceKind {
        self.kind
    }

    fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    async fn fetch(&self, ctx: FetchContext) -> anyhow::Result<Value> {
        (self.func)(ctx).await
    }
}

impl<F, Fut> std::fmt::Debug for FnDatasource<F, Fut> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnDatasource")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

/// A preprocessor backed by an async closure.
pub struct FnPreprocessor<F, Fut> {
    name: String,
    depends_on: Vec<String>,
    config: Value,
    func: F,
    _phantom: PhantomData<fn() -> Fut>,
}

impl<F, Fut> FnPreprocessor<F, Fut>
where
    F: Fn(Record, Value) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Record>> + Send,
{
    /// Creates a closure-backed preprocessor.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            depends_on: Vec::new(),
            config: Value::Null,
            func,
            _phantom: PhantomData,
        }
    }

    /// Sets the declared datasource dependencies.
    #[must_use]
    pub fn with_depends_on(mut self, depends_on: Vec<String>) -> Self {
        self.depends_on = depends_on;
        self
    }

    /// Sets the configuration object.
    #[must_use]
    pub fn with_config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }
}

#[async_trait]
impl<F, Fut> Preprocessor for FnPreprocessor<F, Fut>
where
    F: Fn(Record, Value) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Record>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn depends_on(&self) -> Vec<String> {
        self.depends_on.clone()
    }

    fn config(&self) -> Value {
        self.config.clone()
    }

    async fn transform(&self, record: Record, config: &Value) -> anyhow::Result<Record> {
        (self.func)(record, config.clone()).await
    }
}

impl<F, Fut> std::fmt::Debug for FnPreprocessor<F, Fut> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnPreprocessor")
            .field("name", &self.name)
            .field("depends_on", &self.depends_on)
            .finish()
    }
}

/// An analysis backed by an async closure.
pub struct FnAnalysis<F, Fut> {
    name: String,
    depends_on: Vec<String>,
    ignore_preprocessors: Vec<String>,
    config: Value,
    func: F,
    _phantom: PhantomData<fn() -> Fut>,
}

impl<F, Fut> FnAnalysis<F, Fut>
where
    F: Fn(Record, Value, VizContext) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Value>> + Send,
{
    /// Creates a closure-backed analysis.
    pub fn new(name: impl Into<String>, depends_on: Vec<String>, func: F) -> Self {
        Self {
            name: name.into(),
            depends_on,
            ignore_preprocessors: Vec::new(),
            config: Value::Null,
            func,
            _phantom: PhantomData,
        }
    }

    /// Sets the preprocessors this analysis opts out of.
    #[must_use]
    pub fn with_ignore_preprocessors(mut self, names: Vec<String>) -> Self {
        self.ignore_preprocessors = names;
        self
    }

    /// Sets the configuration object.
    #[must_use]
    pub fn with_config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }
}

#[async_trait]
impl<F, Fut> Analysis for FnAnalysis<F, Fut>
where
    F: Fn(Record, Value, VizContext) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Value>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn depends_on(&self) -> Vec<String> {
        self.depends_on.clone()
    }

    fn ignore_preprocessors(&self) -> Vec<String> {
        self.ignore_preprocessors.clone()
    }

    fn config(&self) -> Value {
        self.config.clone()
    }

    async fn compute(
        &self,
        record: Record,
        config: &Value,
        viz: &VizContext,
    ) -> anyhow::Result<Value> {
        (self.func)(record, config.clone(), viz.clone()).await
    }
}

impl<F, Fut> std::fmt::Debug for FnAnalysis<F, Fut> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnAnalysis")
            .field("name", &self.name)
            .field("depends_on", &self.depends_on)
            .finish()
    }
}
