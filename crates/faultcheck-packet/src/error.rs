use thiserror::Error;

/// Errors surfaced by the fault controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FaultError {
    /// No packet was ever recorded for the identifier.
    #[error("no packet recorded for stream '{identifier}'")]
    NotFound { identifier: String },
    /// A configuration argument is out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl FaultError {
    pub(crate) fn not_found(identifier: &str) -> Self {
        FaultError::NotFound {
            identifier: identifier.to_string(),
        }
    }
}
