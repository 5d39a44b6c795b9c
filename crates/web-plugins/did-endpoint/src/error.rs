use agent_api::AgentError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum Error {
    #[error("Agent not available")]
    AgentNotAvailable,
    #[error(transparent)]
    Agent(#[from] AgentError),
    #[error("unreadable identifier: {0}")]
    MalformedIdentifier(#[from] serde_json::Error),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match self {
            Error::AgentNotAvailable => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::NOT_FOUND,
        };

        tracing::debug!("no DID document served: {self}");
        (status, self.to_string()).into_response()
    }
}
