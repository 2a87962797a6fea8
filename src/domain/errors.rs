//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these. Every variant is terminal
//! for the request that raised it; nothing is retried internally.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Missing or rejected bearer token.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Free-tier generation limit reached.
    #[error("Free AI uses exhausted. Upgrade to Premium for unlimited scheduling.")]
    QuotaExceeded { limit: u32 },

    #[error("{0}")]
    InvalidInput(String),

    /// Collaborator not configured or not reachable.
    #[error("{0}")]
    UpstreamUnavailable(String),

    /// Collaborator answered, but with an error status.
    #[error("AI request failed: {0}")]
    Upstream(String),

    /// Collaborator returned non-JSON or JSON without a usable shape.
    #[error("{0}")]
    MalformedResponse(String),

    #[error("Repository error: {0}")]
    Repo(String),
}
