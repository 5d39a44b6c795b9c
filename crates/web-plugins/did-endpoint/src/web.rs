use agent_api::Agent;
use axum::{
    extract::{Extension, Path, State},
    http::{header, HeaderMap},
    response::Json,
    routing::get,
    Router,
};
use data_store::Identifier;
use identity_agent::document::did_document;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use remote_agent::RequestAgent;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{error::Error, plugin::DidEndpointOptions};

/// Characters `encodeURIComponent` leaves alone.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub(crate) fn routes(options: Arc<DidEndpointOptions>) -> Router {
    Router::new()
        .route("/.well-known/did.json", get(host_diddoc))
        .route("/:path/did.json", get(path_diddoc))
        .with_state(options)
}

/// DID document of `did:web:<host>`.
async fn host_diddoc(
    State(options): State<Arc<DidEndpointOptions>>,
    agent: Option<Extension<RequestAgent>>,
    headers: HeaderMap,
) -> Result<Json<Value>, Error> {
    let Some(Extension(RequestAgent(agent))) = agent else {
        return Err(Error::AgentNotAvailable);
    };
    let alias = host_alias(&headers);

    let identifier = if options.create_missing_identifier {
        lookup(
            agent.as_ref(),
            "didManagerGetOrCreate",
            json!({ "alias": alias, "provider": "did:web" }),
        )
        .await?
    } else {
        lookup(
            agent.as_ref(),
            "didManagerGet",
            json!({ "did": format!("did:web:{alias}") }),
        )
        .await?
    };

    Ok(Json(did_document(&identifier, &options.services)))
}

/// DID document of `did:web:<host>:<path>`.
///
/// Only existing identifiers are served here.
async fn path_diddoc(
    State(options): State<Arc<DidEndpointOptions>>,
    agent: Option<Extension<RequestAgent>>,
    headers: HeaderMap,
    Path(path): Path<String>,
) -> Result<Json<Value>, Error> {
    let Some(Extension(RequestAgent(agent))) = agent else {
        return Err(Error::AgentNotAvailable);
    };
    let did = format!("did:web:{}:{path}", host_alias(&headers));

    let identifier = lookup(agent.as_ref(), "didManagerGet", json!({ "did": did })).await?;

    Ok(Json(did_document(&identifier, &options.services)))
}

fn host_alias(headers: &HeaderMap) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    utf8_percent_encode(host, URI_COMPONENT).to_string()
}

async fn lookup(agent: &dyn Agent, method: &str, params: Value) -> Result<Identifier, Error> {
    let identifier = agent.execute(method, params).await?;
    Ok(serde_json::from_value(identifier)?)
}
