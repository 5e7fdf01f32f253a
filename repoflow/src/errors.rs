//! Error types for the repoflow engine.
//!
//! The taxonomy distinguishes configuration errors (a request names a
//! component that does not exist), acquisition failures (one datasource's
//! fetch, clone or pull failed) and pipeline failures (a preprocessor or
//! the terminal analysis returned an error). Component implementations
//! report failures as [`anyhow::Error`]; the engine wraps them here.

use thiserror::Error;

/// The main error type for repoflow operations.
#[derive(Debug, Error)]
pub enum RepoflowError {
    /// A request named a component that is not registered.
    ///
    /// This is a fatal configuration error for the request.
    #[error("no {kind} named '{name}' is registered")]
    ComponentNotFound {
        /// The component category ("datasource", "preprocessor", "analysis").
        kind: &'static str,
        /// The unresolved name.
        name: String,
    },

    /// A datasource fetch failed.
    ///
    /// Nothing is cached for the datasource's key; other datasources of the
    /// same run are unaffected.
    #[error("datasource '{datasource}' failed: {source}")]
    Acquisition {
        /// The datasource name.
        datasource: String,
        /// The underlying fetch error.
        source: anyhow::Error,
    },

    /// A git subprocess exited unsuccessfully.
    ///
    /// The detail text is scrubbed of any embedded credential before it is
    /// stored here.
    #[error("git {op} failed: {detail}")]
    Git {
        /// The git operation ("clone", "pull").
        op: &'static str,
        /// Credential-scrubbed subprocess output.
        detail: String,
    },

    /// A preprocessor failed; the pipeline is aborted.
    #[error("preprocessor '{name}' failed: {source}")]
    Preprocessor {
        /// The preprocessor name.
        name: String,
        /// The underlying transform error.
        source: anyhow::Error,
    },

    /// The terminal analysis failed; no artifact is produced.
    #[error("analysis '{name}' failed: {source}")]
    Analysis {
        /// The analysis name.
        name: String,
        /// The underlying compute error.
        source: anyhow::Error,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A generic internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_not_found_display() {
        let err = RepoflowError::ComponentNotFound {
            kind: "datasource",
            name: "issues".to_string(),
        };
        assert_eq!(err.to_string(), "no datasource named 'issues' is registered");
    }

    #[test]
    fn test_acquisition_wraps_source() {
        let err = RepoflowError::Acquisition {
            datasource: "commits".to_string(),
            source: anyhow::anyhow!("boom"),
        };
        assert!(err.to_string().contains("commits"));
        assert!(err.to_string().contains("boom"));
    }
}
