// src/core/errors.rs
use thiserror::Error;

/// Errors raised while building or querying explanations.
///
/// Every variant is raised synchronously by the call that detects the
/// problem. Nothing here is transient, so nothing is retried.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ExplainError {
    /// A feature map could not be built from the declared transforms, or an
    /// explanation option contradicts the map.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Attribution array dimensions disagree with the feature map or with the
    /// declared instance count.
    #[error("Shape mismatch in {context}: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// What was being compared (e.g. "attribution feature dimension").
        context: String,
        expected: usize,
        actual: usize,
    },

    /// The query needs a component this explanation does not carry.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Attribution values that cannot be ranked (NaN or infinite).
    #[error("Invalid attribution: {0}")]
    InvalidAttribution(String),

    /// An external attribution source or dashboard reported a failure.
    #[error("Source error: {0}")]
    Source(String),

    #[error("Ndarray error: {0}")]
    Ndarray(#[from] ndarray::ShapeError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ExplainError {
    pub(crate) fn shape(context: impl Into<String>, expected: usize, actual: usize) -> Self {
        ExplainError::ShapeMismatch {
            context: context.into(),
            expected,
            actual,
        }
    }
}

// Convenience type alias for Result
pub type Result<T> = std::result::Result<T, ExplainError>;
