use agent_api::AgentSchema;
use axum::{
    extract::{Extension, State},
    http::{header, HeaderMap, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::{context::RequestAgent, error::Error};

#[derive(Clone, Debug, Default)]
pub struct ApiSchemaOptions {
    /// Path the agent methods are served under, e.g. `/api`
    pub base_path: String,
    /// Methods to describe; all available methods when `None`
    pub exposed_methods: Option<Vec<String>>,
    /// HTTP authentication scheme advertised for the methods, e.g. `bearer`
    pub security_scheme: Option<String>,
    pub api_name: Option<String>,
    pub api_version: Option<String>,
}

/// Serves the OpenAPI description at `{base_path}/json`.
pub fn routes(options: ApiSchemaOptions) -> Router {
    let path = format!("{}/json", options.base_path.trim_end_matches('/'));

    Router::new()
        .route(&path, get(api_schema))
        .route(&format!("{path}/"), get(api_schema))
        .with_state(Arc::new(options))
}

async fn api_schema(
    State(options): State<Arc<ApiSchemaOptions>>,
    agent: Option<Extension<RequestAgent>>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    let Some(Extension(RequestAgent(agent))) = agent else {
        return Error::AgentNotAvailable.into_response();
    };

    let methods = match &options.exposed_methods {
        Some(methods) => methods.clone(),
        None => agent.available_methods(),
    };

    let mut document = open_api_schema(
        &agent.schema(),
        &methods,
        options.api_name.as_deref().unwrap_or("Agent"),
        options
            .api_version
            .as_deref()
            .unwrap_or(env!("CARGO_PKG_VERSION")),
    );

    // Derived per request so the document is right behind any hostname
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .or_else(|| uri.authority().map(|authority| authority.as_str()))
        .unwrap_or_default();
    document["servers"] = json!([{ "url": format!("https://{host}{}", options.base_path) }]);

    if let Some(scheme) = &options.security_scheme {
        document["components"]["securitySchemes"] = json!({
            "auth": { "type": "http", "scheme": scheme }
        });
        document["security"] = json!([{ "auth": [] }]);
    }

    Json(document).into_response()
}

fn open_api_schema(schema: &AgentSchema, methods: &[String], title: &str, version: &str) -> Value {
    let mut paths = Map::new();

    for method in methods {
        let Some(method_schema) = schema.get(method) else {
            tracing::warn!("no schema for method {method}, leaving it out");
            continue;
        };

        paths.insert(
            format!("/{method}"),
            json!({
                "post": {
                    "operationId": method,
                    "description": method_schema.description,
                    "requestBody": {
                        "content": {
                            "application/json": { "schema": method_schema.arguments }
                        }
                    },
                    "responses": {
                        "200": {
                            "description": method_schema.description,
                            "content": {
                                "application/json": { "schema": method_schema.returns }
                            }
                        }
                    }
                }
            }),
        );
    }

    json!({
        "openapi": "3.0.0",
        "info": { "title": title, "version": version },
        "components": { "schemas": {} },
        "paths": paths,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{with_request_agent, RequestAgentOptions};
    use agent_api::tests::StubAgent;
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use tower::util::ServiceExt;

    fn options() -> ApiSchemaOptions {
        ApiSchemaOptions {
            base_path: "/api".to_owned(),
            ..Default::default()
        }
    }

    fn app(options: ApiSchemaOptions) -> Router {
        let source = RequestAgentOptions {
            agent: Some(Arc::new(StubAgent::new())),
            agent_factory: None,
        };
        with_request_agent(routes(options), source).unwrap()
    }

    fn request(path: &str) -> Request<Body> {
        Request::builder()
            .method(Method::GET)
            .uri(path)
            .header(header::HOST, "example.com")
            .body(Body::empty())
            .unwrap()
    }

    async fn fetch(app: Router, path: &str) -> (StatusCode, Value) {
        let response = app.oneshot(request(path)).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();

        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn server_url_follows_host_and_base_path() {
        let (status, document) = fetch(app(options()), "/api/json/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(document["servers"][0]["url"], "https://example.com/api");
        assert_eq!(document["info"]["title"], "Agent");
        assert!(document.get("security").is_none());
    }

    #[tokio::test]
    async fn describes_all_available_methods_by_default() {
        let (_, document) = fetch(app(options()), "/api/json").await;

        let paths = document["paths"].as_object().unwrap();
        assert_eq!(paths.len(), 3);
        assert_eq!(paths["/strict"]["post"]["operationId"], "strict");
        assert_eq!(
            paths["/strict"]["post"]["requestBody"]["content"]["application/json"]["schema"]
                ["required"],
            json!(["did"])
        );
    }

    #[tokio::test]
    async fn describes_only_exposed_methods() {
        let options = ApiSchemaOptions {
            exposed_methods: Some(vec!["echo".to_owned(), "unknown".to_owned()]),
            ..options()
        };
        let (_, document) = fetch(app(options), "/api/json/").await;

        let paths = document["paths"].as_object().unwrap();
        assert_eq!(paths.keys().collect::<Vec<_>>(), vec!["/echo"]);
    }

    #[tokio::test]
    async fn injects_security_scheme() {
        let options = ApiSchemaOptions {
            security_scheme: Some("bearer".to_owned()),
            api_name: Some("Identity Agent".to_owned()),
            api_version: Some("1.2.3".to_owned()),
            ..options()
        };
        let (_, document) = fetch(app(options), "/api/json/").await;

        assert_eq!(
            document["components"]["securitySchemes"]["auth"],
            json!({ "type": "http", "scheme": "bearer" })
        );
        assert_eq!(document["security"], json!([{ "auth": [] }]));
        assert_eq!(
            document["info"],
            json!({ "title": "Identity Agent", "version": "1.2.3" })
        );
    }

    #[tokio::test]
    async fn missing_agent_is_an_internal_error() {
        let (status, body) = fetch(routes(options()), "/api/json/").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Agent not available" }));
    }
}
