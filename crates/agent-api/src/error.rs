use thiserror::Error;

/// Failure of a capability call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AgentError {
    /// Parameters did not satisfy the method's argument schema.
    #[error("{message}")]
    Validation {
        message: String,
        method: String,
        /// JSON pointer of the offending field
        path: String,
        /// Schema keyword that failed
        code: String,
        description: String,
    },
    /// Any other failure while executing the method.
    #[error("{message}")]
    Execution { message: String },
}

impl AgentError {
    pub fn execution(message: impl Into<String>) -> Self {
        AgentError::Execution {
            message: message.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, AgentError::Validation { .. })
    }
}
