//! Error types for the sqlgate validation pipeline.
//!
//! All fallible operations in sqlgate return `SqlgateResult<T>`.  The
//! pipeline itself converts most failures into BLOCK verdicts (fail closed);
//! only malformed invocations and configuration mistakes surface as errors.

use thiserror::Error;

/// The unified error type for the sqlgate crates.
#[derive(Debug, Error)]
pub enum SqlgateError {
    /// The registry holds no contract for the requested template id.
    ///
    /// An ungoverned template must never execute — the pipeline converts
    /// this into an immediate BLOCK verdict.
    #[error("no contract registered for template '{template_id}'")]
    ContractNotFound { template_id: String },

    /// A template's declared contract failed an internal consistency check.
    #[error("contract violation for template '{template_id}': {reason}")]
    ContractViolation { template_id: String, reason: String },

    /// The registry lookup or the external SQL renderer failed or timed out.
    ///
    /// Always treated as BLOCKING — upstream failure never defaults to ALLOW.
    #[error("upstream unavailable: {reason}")]
    UpstreamUnavailable { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// The caller invoked the pipeline with a syntactically incomplete
    /// request (missing template id, tenant id, …).
    ///
    /// This is a programming error in the caller, reported as a fault
    /// distinct from a BLOCK verdict.
    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },
}

/// Convenience alias used throughout the sqlgate crates.
pub type SqlgateResult<T> = Result<T, SqlgateError>;
