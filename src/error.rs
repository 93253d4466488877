use thiserror::Error;

/// Failure modes of a single metric extraction.
///
/// Both variants count toward a clip's consecutive-error counter; neither is
/// retried within a pass.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The URL does not match any recognized pattern for the platform.
    #[error("unsupported or malformed URL: {0}")]
    Validation(String),

    /// Network failure or an unexpected provider response shape.
    #[error("upstream failure: {0}")]
    Upstream(String),
}

impl From<reqwest::Error> for ExtractError {
    fn from(e: reqwest::Error) -> Self {
        Self::Upstream(e.to_string())
    }
}

/// Outcome of requesting a reconciliation pass.
#[derive(Debug, Error)]
pub enum PassError {
    /// Another pass holds the run lock.
    #[error("a reconciliation pass is already running")]
    AlreadyRunning,

    /// The pass failed at the top level (e.g. the clip listing read failed).
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}
