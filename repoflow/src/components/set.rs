//! Name-indexed collection of registered components.

use super::{Analysis, Datasource, Preprocessor};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// The components available to the engine, indexed by name.
///
/// Populated by the plugin collaborator (or directly by embedders); the
/// engine only reads from it. Registering a component under an
/// already-taken name replaces the previous one.
#[derive(Default)]
pub struct ComponentSet {
    datasources: RwLock<HashMap<String, Arc<dyn Datasource>>>,
    preprocessors: RwLock<HashMap<String, Arc<dyn Preprocessor>>>,
    analyses: RwLock<HashMap<String, Arc<dyn Analysis>>>,
}

impl ComponentSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a datasource under its own name.
    pub fn register_datasource(&self, datasource: Arc<dyn Datasource>) {
        let name = datasource.name().to_string();
        self.datasources.write().insert(name, datasource);
    }

    /// Registers a preprocessor under its own name.
    pub fn register_preprocessor(&self, preprocessor: Arc<dyn Preprocessor>) {
        let name = preprocessor.name().to_string();
        self.preprocessors.write().insert(name, preprocessor);
    }

    /// Registers an analysis under its own name.
    pub fn register_analysis(&self, analysis: Arc<dyn Analysis>) {
        let name = analysis.name().to_string();
        self.analyses.write().insert(name, analysis);
    }

    /// Looks up a datasource by name.
    #[must_use]
    pub fn datasource(&self, name: &str) -> Option<Arc<dyn Datasource>> {
        self.datasources.read().get(name).cloned()
    }

    /// Looks up a preprocessor by name.
    #[must_use]
    pub fn preprocessor(&self, name: &str) -> Option<Arc<dyn Preprocessor>> {
        self.preprocessors.read().get(name).cloned()
    }

    /// Looks up an analysis by name.
    #[must_use]
    pub fn analysis(&self, name: &str) -> Option<Arc<dyn Analysis>> {
        self.analyses.read().get(name).cloned()
    }

    /// Lists registered datasource names, sorted.
    pub fn list_datasources(&self) -> Vec<String> {
        Self::sorted_names(&self.datasources.read())
    }

    /// Lists registered preprocessor names, sorted.
    pub fn list_preprocessors(&self) -> Vec<String> {
        Self::sorted_names(&self.preprocessors.read())
    }

    /// Lists registered analysis names, sorted.
    pub fn list_analyses(&self) -> Vec<String> {
        Self::sorted_names(&self.analyses.read())
    }

    fn sorted_names<T: ?Sized>(map: &HashMap<String, Arc<T>>) -> Vec<String> {
        let mut names: Vec<String> = map.keys().cloned().collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for ComponentSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentSet")
            .field("datasources", &self.list_datasources())
            .field("preprocessors", &self.list_preprocessors())
            .field("analyses", &self.list_analyses())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{DatasourceKind, FnDatasource};
    use serde_json::json;

    fn sample_datasource(name: &str) -> Arc<dyn Datasource> {
        Arc::new(FnDatasource::new(name, DatasourceKind::HostedApi, |_ctx| async {
            Ok(json!(null))
        }))
    }

    #[test]
    fn test_register_and_lookup() {
        let set = ComponentSet::new();
        set.register_datasource(sample_datasource("issues"));

        assert!(set.datasource("issues").is_some());
        assert!(set.datasource("milestones").is_none());
    }

    #[test]
    fn test_list_is_sorted() {
        let set = ComponentSet::new();
        set.register_datasource(sample_datasource("milestones"));
        set.register_datasource(sample_datasource("issues"));

        assert_eq!(set.list_datasources(), vec!["issues", "milestones"]);
    }

    #[test]
    fn test_reregistration_replaces() {
        let set = ComponentSet::new();
        set.register_datasource(sample_datasource("issues"));
        set.register_datasource(sample_datasource("issues"));

        assert_eq!(set.list_datasources().len(), 1);
    }
}
