use agent_api::AgentError;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

/// Failures surfaced by the agent routes.
#[derive(Debug, Error)]
pub(crate) enum Error {
    #[error("Agent not available")]
    AgentNotAvailable,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("{0}")]
    MalformedBody(String),
    #[error(transparent)]
    Agent(#[from] AgentError),
}

impl Error {
    pub(crate) fn status(&self) -> StatusCode {
        match self {
            Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::Agent(AgentError::Validation { .. }) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub(crate) fn json(&self) -> Json<Value> {
        match self {
            Error::Agent(AgentError::Validation {
                message,
                method,
                path,
                code,
                description,
            }) => Json(json!({
                "name": "ValidationError",
                "message": message,
                "method": method,
                "path": path,
                "code": code,
                "description": description,
            })),
            _ => Json(json!({ "error": self.to_string() })),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();

        match status {
            StatusCode::UNAUTHORIZED => {
                (status, [(header::WWW_AUTHENTICATE, "Bearer")], self.json()).into_response()
            }
            _ => {
                if status.is_server_error() {
                    tracing::error!("{self}");
                }
                (status, self.json()).into_response()
            }
        }
    }
}
