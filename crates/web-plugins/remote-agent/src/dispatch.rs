use axum::{
    body::Bytes,
    extract::Extension,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
    auth::{bearer_auth, ApiKey},
    context::RequestAgent,
    error::Error,
};

#[derive(Clone, Debug, Default)]
pub struct AgentRouterOptions {
    /// Prefix of every method route, e.g. `/api`
    pub base_path: String,
    /// Methods to expose, one `POST {base_path}/{method}` route each
    pub exposed_methods: Vec<String>,
    /// Bearer token required on every method route
    pub api_key: Option<String>,
}

/// Routes executing agent methods by name.
///
/// Only the exposed methods execute. Any other `POST` under the base path
/// answers 404, after authentication like the exposed ones.
pub fn routes(options: &AgentRouterOptions) -> Router {
    let base_path = options.base_path.trim_end_matches('/');
    let mut router = Router::new();

    for method in &options.exposed_methods {
        tracing::debug!("initializing agent method {method}");

        let name: Arc<str> = Arc::from(method.as_str());
        router = router.route(
            &format!("{base_path}/{method}"),
            post(move |agent: Option<Extension<RequestAgent>>, body: Bytes| async move {
                execute(&name, agent, body).await
            }),
        );
    }

    // Static method paths take precedence over the wildcard
    router = router.route(
        &format!("{base_path}/*method"),
        post(|| async { StatusCode::NOT_FOUND }),
    );

    match &options.api_key {
        Some(api_key) => router.route_layer(middleware::from_fn_with_state(
            ApiKey::new(api_key),
            bearer_auth,
        )),
        None => router,
    }
}

async fn execute(method: &str, agent: Option<Extension<RequestAgent>>, body: Bytes) -> Response {
    let Some(Extension(RequestAgent(agent))) = agent else {
        return Error::AgentNotAvailable.into_response();
    };

    let params = match parse_params(&body) {
        Ok(params) => params,
        Err(err) => return err.into_response(),
    };

    match agent.execute(method, params).await {
        Ok(result) => Json(result).into_response(),
        Err(err) => Error::from(err).into_response(),
    }
}

fn parse_params(body: &[u8]) -> Result<Value, Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(json!({}));
    }

    serde_json::from_slice(body).map_err(|err| Error::MalformedBody(err.to_string()))
}
