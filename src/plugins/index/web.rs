use axum::{
    extract::{Extension, State},
    http::StatusCode,
    routing::get,
    Router,
};
use remote_agent::RequestAgent;
use serde_json::json;
use std::sync::Arc;

pub(crate) fn routes(provider: Arc<str>) -> Router {
    Router::new() //
        .route("/", get(index))
        .with_state(provider)
}

/// DID of the `default` identifier, created on first call.
async fn index(
    State(provider): State<Arc<str>>,
    agent: Option<Extension<RequestAgent>>,
) -> Result<String, (StatusCode, String)> {
    let Some(Extension(RequestAgent(agent))) = agent else {
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Agent not available".to_owned(),
        ));
    };

    let identifier = agent
        .execute(
            "didManagerGetOrCreate",
            json!({ "alias": "default", "provider": &*provider }),
        )
        .await
        .map_err(|err| {
            tracing::error!("could not get the default identifier: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        })?;

    identifier["did"]
        .as_str()
        .map(str::to_owned)
        .ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "identifier without a DID".to_owned(),
        ))
}
