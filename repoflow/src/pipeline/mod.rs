//! Sequential pipeline execution.
//!
//! Collected datasource results are folded into a record keyed by
//! datasource name, threaded through the preprocessors in declared order,
//! and handed to the terminal analysis together with its configuration and
//! a visualization context.

use crate::components::{Analysis, Preprocessor, Record};
use crate::errors::RepoflowError;
use crate::viz::VizContext;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Folds `(name, result)` pairs into a record.
///
/// Names are expected to be unique by convention; on collision the last
/// write wins.
#[must_use]
pub fn assemble_record(results: Vec<(String, Value)>) -> Record {
    let mut record = Record::new();
    for (name, value) in results {
        record.insert(name, value);
    }
    record
}

/// Runs the pipeline: preprocessors in order, then the analysis.
///
/// Preprocessors named in the analysis's `ignore_preprocessors` list are
/// skipped. Each remaining transform fully replaces the record; an error
/// from any stage aborts the pipeline and no artifact is produced.
pub async fn run(
    results: Vec<(String, Value)>,
    preprocessors: &[Arc<dyn Preprocessor>],
    analysis: &dyn Analysis,
    viz: &VizContext,
) -> Result<Value, RepoflowError> {
    let mut record = assemble_record(results);

    let ignored: HashSet<String> = analysis.ignore_preprocessors().into_iter().collect();
    for preprocessor in preprocessors {
        if ignored.contains(preprocessor.name()) {
            debug!(preprocessor = preprocessor.name(), "skipped by analysis");
            continue;
        }
        let config = preprocessor.config();
        record = preprocessor
            .transform(record, &config)
            .await
            .map_err(|source| RepoflowError::Preprocessor {
                name: preprocessor.name().to_string(),
                source,
            })?;
    }

    let config = analysis.config();
    analysis
        .compute(record, &config, viz)
        .await
        .map_err(|source| RepoflowError::Analysis {
            name: analysis.name().to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{FnAnalysis, FnPreprocessor};
    use serde_json::json;

    fn appending_preprocessor(name: &str, marker: &str) -> Arc<dyn Preprocessor> {
        let marker = marker.to_string();
        Arc::new(FnPreprocessor::new(name, move |mut record: Record, _config| {
            let marker = marker.clone();
            async move {
                let trace = record
                    .get("trace")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                record.insert("trace".to_string(), json!(format!("{trace}{marker}")));
                Ok(record)
            }
        }))
    }

    fn trace_analysis() -> Arc<dyn Analysis> {
        Arc::new(FnAnalysis::new("trace", Vec::new(), |record: Record, _config, _viz| async move {
            Ok(record.get("trace").cloned().unwrap_or(Value::Null))
        }))
    }

    #[test]
    fn test_assemble_record_last_write_wins() {
        let record = assemble_record(vec![
            ("a".to_string(), json!(1)),
            ("a".to_string(), json!(2)),
            ("b".to_string(), json!(3)),
        ]);

        assert_eq!(record.get("a"), Some(&json!(2)));
        assert_eq!(record.get("b"), Some(&json!(3)));
    }

    #[tokio::test]
    async fn test_preprocessors_apply_in_declared_order() {
        let preprocessors = vec![
            appending_preprocessor("p1", "1"),
            appending_preprocessor("p2", "2"),
        ];
        let analysis = trace_analysis();

        let artifact = run(Vec::new(), &preprocessors, analysis.as_ref(), &VizContext::default())
            .await
            .unwrap();

        // p2 sees p1's output, not the other way around.
        assert_eq!(artifact, json!("12"));
    }

    #[tokio::test]
    async fn test_ignored_preprocessors_are_skipped() {
        let preprocessors = vec![
            appending_preprocessor("p1", "1"),
            appending_preprocessor("p2", "2"),
        ];
        let analysis: Arc<dyn Analysis> = Arc::new(
            FnAnalysis::new("trace", Vec::new(), |record: Record, _config, _viz| async move {
                Ok(record.get("trace").cloned().unwrap_or(Value::Null))
            })
            .with_ignore_preprocessors(vec!["p1".to_string()]),
        );

        let artifact = run(Vec::new(), &preprocessors, analysis.as_ref(), &VizContext::default())
            .await
            .unwrap();

        assert_eq!(artifact, json!("2"));
    }

    #[tokio::test]
    async fn test_preprocessor_error_aborts_pipeline() {
        let failing: Arc<dyn Preprocessor> = Arc::new(FnPreprocessor::new(
            "boom",
            |_record: Record, _config| async { anyhow::bail!("transform failed") },
        ));
        let analysis = trace_analysis();

        let err = run(Vec::new(), &[failing], analysis.as_ref(), &VizContext::default())
            .await
            .unwrap_err();

        assert!(matches!(err, RepoflowError::Preprocessor { ref name, .. } if name == "boom"));
    }

    #[tokio::test]
    async fn test_analysis_error_surfaces() {
        let analysis: Arc<dyn Analysis> = Arc::new(FnAnalysis::new(
            "boom",
            Vec::new(),
            |_record: Record, _config, _viz| async { anyhow::bail!("compute failed") },
        ));

        let err = run(Vec::new(), &[], analysis.as_ref(), &VizContext::default())
            .await
            .unwrap_err();

        assert!(matches!(err, RepoflowError::Analysis { ref name, .. } if name == "boom"));
    }

    #[tokio::test]
    async fn test_analysis_receives_assembled_record() {
        let analysis: Arc<dyn Analysis> = Arc::new(FnAnalysis::new(
            "echo",
            Vec::new(),
            |record: Record, _config, _viz| async move { Ok(Value::Object(record)) },
        ));

        let artifact = run(
            vec![("issues".to_string(), json!([1, 2, 3]))],
            &[],
            analysis.as_ref(),
            &VizContext::default(),
        )
        .await
        .unwrap();

        assert_eq!(artifact, json!({"issues": [1, 2, 3]}));
    }
}
