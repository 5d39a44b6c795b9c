use agent_api::AgentError;
use data_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{0}")]
    Kms(#[from] keystore::Error),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unsupported(String),
    #[error("{0}")]
    InvalidArgument(String),
}

impl From<Error> for AgentError {
    fn from(err: Error) -> Self {
        AgentError::execution(err.to_string())
    }
}
