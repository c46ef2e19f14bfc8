//! Error kinds raised while building and optimizing an allocation.
use thiserror::Error;

/// Every variant is fatal for the run: nothing is retried, and mutations
/// already applied to the process are kept.
#[derive(Error, Debug)]
pub enum OptError {
    /// The deadline is too tight for the performance model, or there is
    /// nothing to allocate.
    #[error("infeasible problem: {0}")]
    Infeasibility(String),
    /// Malformed oracle output or input description.
    #[error("parse error: {0}")]
    Parse(String),
    /// The simulator returned a runtime that contradicts the allocation.
    #[error("inconsistent oracle result: {0}")]
    Consistency(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{context}: {source}")]
    Yaml {
        context: String,
        #[source]
        source: serde_yaml::Error,
    },
}

pub type OptResult<T> = Result<T, OptError>;

impl OptError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        OptError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn yaml(context: impl Into<String>, source: serde_yaml::Error) -> Self {
        OptError::Yaml {
            context: context.into(),
            source,
        }
    }
}
