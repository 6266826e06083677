//! Error types for the recommendation engine

use thiserror::Error;

/// Errors produced by the recommendation and summary engines
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// The sub-category window reaches further back than the available history
    #[error("not enough data for {sub_category}: window needs {required_days} day(s) of history")]
    InsufficientData {
        sub_category: String,
        required_days: u32,
    },

    /// A single config item could not be computed
    #[error("{item} computation failed: {reason}")]
    MetricComputation { item: String, reason: String },

    /// Unsupported summarize type or malformed flag
    #[error("invalid summarize request: {0}")]
    InvalidScopeRequest(String),

    /// The workload source has nothing for the requested scope
    #[error("no data available for {0}")]
    UpstreamDataUnavailable(String),

    /// A container was handed to the computer without any intervals
    #[error("container {0} has no interval data")]
    NoIntervalData(String),

    #[error("unknown notification code {0}")]
    UnknownNotificationCode(u32),

    #[error("invalid {entity}: missing required field `{field}`")]
    MissingField {
        entity: &'static str,
        field: &'static str,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("workload source error: {0}")]
    Source(String),

    #[error("aggregation task failed: {0}")]
    Task(String),
}

/// Convenience alias used throughout the engine
pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    /// True for errors caused by the caller's request rather than the engine
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidScopeRequest(_) | EngineError::MissingField { .. }
        )
    }
}

impl From<tokio::task::JoinError> for EngineError {
    fn from(err: tokio::task::JoinError) -> Self {
        EngineError::Task(err.to_string())
    }
}
