//! Error types for cross-section analysis

use thiserror::Error;

use crate::analysis::Stage;

/// Main error type for section analysis
#[derive(Error, Debug)]
pub enum SectionError {
    #[error("{requested} results need the {missing} analysis - run it first")]
    StageNotComplete { requested: Stage, missing: Stage },

    #[error("Composite section: {0}")]
    CompositeAmbiguity(String),

    #[error("Attempting to get a composite only property from a geometric analysis: {0}")]
    CompositeOnly(String),

    #[error("Invalid element {element}: {reason}")]
    InvalidMesh { element: usize, reason: String },

    #[error("Invalid mesh: {0}")]
    MeshValidity(String),

    #[error("Singular stiffness matrix: {0}")]
    SingularMatrix(String),

    #[error("{solver} did not converge after {iterations} iterations (residual {residual:e})")]
    ConvergenceFailed {
        solver: String,
        iterations: usize,
        residual: f64,
    },

    #[error("Numerical failure: {0}")]
    NumericalFailure(String),

    #[error("Time limit of {limit_ms} ms exceeded before the {stage} solve")]
    TimeLimitExceeded { stage: Stage, limit_ms: u128 },

    #[error("Invalid material: {0}")]
    InvalidMaterial(String),

    #[error("Material '{0}' not found in section")]
    MaterialNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for section operations
pub type SectionResult<T> = Result<T, SectionError>;
