//! Datasource dependency resolution.

use crate::components::{Analysis, Preprocessor};
use std::collections::HashSet;
use std::sync::Arc;

/// Computes the datasource names an analysis run needs.
///
/// The result is the union of the analysis's declared dependencies and
/// each preprocessor's, deduplicated. Pure function, no I/O. The order is
/// stable with respect to insertion (analysis first, then preprocessors in
/// the given order) so logs and tests are reproducible.
#[must_use]
pub fn required_datasources(
    preprocessors: &[Arc<dyn Preprocessor>],
    analysis: &dyn Analysis,
) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for name in analysis.depends_on() {
        if seen.insert(name.clone()) {
            names.push(name);
        }
    }
    for preprocessor in preprocessors {
        for name in preprocessor.depends_on() {
            if seen.insert(name.clone()) {
                names.push(name);
            }
        }
    }
    names
}
