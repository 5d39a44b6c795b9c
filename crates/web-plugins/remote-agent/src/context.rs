use agent_api::{Agent, AgentError};
use axum::{
    body::Body,
    extract::State,
    http::{request::Parts, Request},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use futures::future::BoxFuture;
use std::sync::Arc;
use thiserror::Error;

use crate::error::Error;

/// Builds an agent for one request.
///
/// Ambient configuration (store bindings, secrets) is captured by the
/// closure when it is created; the request parts are passed for
/// per-request selection.
pub type AgentFactory = Arc<
    dyn Fn(&Parts) -> BoxFuture<'static, Result<Arc<dyn Agent>, AgentError>> + Send + Sync,
>;

/// Where the request agent comes from.
///
/// A fixed agent takes precedence over the factory.
#[derive(Clone, Default)]
pub struct RequestAgentOptions {
    pub agent: Option<Arc<dyn Agent>>,
    pub agent_factory: Option<AgentFactory>,
}

/// Agent attached to a request by [`with_request_agent`].
#[derive(Clone)]
pub struct RequestAgent(pub Arc<dyn Agent>);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContextError {
    #[error("an agent or an agent factory is required")]
    MissingAgentSource,
}

#[derive(Clone)]
enum AgentSource {
    Fixed(Arc<dyn Agent>),
    Factory(AgentFactory),
}

impl TryFrom<RequestAgentOptions> for AgentSource {
    type Error = ContextError;

    fn try_from(options: RequestAgentOptions) -> Result<Self, Self::Error> {
        match options {
            RequestAgentOptions {
                agent: Some(agent), ..
            } => Ok(AgentSource::Fixed(agent)),
            RequestAgentOptions {
                agent_factory: Some(factory),
                ..
            } => Ok(AgentSource::Factory(factory)),
            _ => Err(ContextError::MissingAgentSource),
        }
    }
}

/// Wrap `router` so that every request carries a [`RequestAgent`].
///
/// Fails when neither an agent nor a factory is configured, so a
/// misconfigured server never starts serving.
pub fn with_request_agent(
    router: Router,
    options: RequestAgentOptions,
) -> Result<Router, ContextError> {
    let source = AgentSource::try_from(options)?;
    Ok(router.layer(middleware::from_fn_with_state(source, attach_agent)))
}

async fn attach_agent(
    State(source): State<AgentSource>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();

    let agent = match &source {
        AgentSource::Fixed(agent) => agent.clone(),
        AgentSource::Factory(factory) => match factory(&parts).await {
            Ok(agent) => agent,
            Err(err) => {
                tracing::error!("failed to build request agent: {err}");
                return Error::Agent(err).into_response();
            }
        },
    };

    parts.extensions.insert(RequestAgent(agent));
    next.run(Request::from_parts(parts, body)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_api::tests::StubAgent;
    use axum::{
        extract::Extension,
        http::{Method, StatusCode},
        routing::get,
    };
    use futures::FutureExt;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::util::ServiceExt;

    fn probe() -> Router {
        Router::new().route(
            "/probe",
            get(|agent: Option<Extension<RequestAgent>>| async move {
                match agent {
                    Some(Extension(RequestAgent(agent))) => agent.available_methods().join(","),
                    None => "none".to_owned(),
                }
            }),
        )
    }

    fn factory<F>(build: F) -> AgentFactory
    where
        F: Fn(&Parts) -> BoxFuture<'static, Result<Arc<dyn Agent>, AgentError>>
            + Send
            + Sync
            + 'static,
    {
        Arc::new(build)
    }

    fn request() -> Request<Body> {
        Request::builder()
            .method(Method::GET)
            .uri("/probe")
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn missing_agent_source_is_a_configuration_error() {
        let err = with_request_agent(probe(), RequestAgentOptions::default()).unwrap_err();
        assert_eq!(err, ContextError::MissingAgentSource);
    }

    #[tokio::test]
    async fn attaches_fixed_agent() {
        let options = RequestAgentOptions {
            agent: Some(Arc::new(StubAgent::new())),
            agent_factory: None,
        };
        let app = with_request_agent(probe(), options).unwrap();

        let response = app.oneshot(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"echo,fail,strict");
    }

    #[tokio::test]
    async fn invokes_factory_once_per_request() {
        let invocations = Arc::new(AtomicUsize::new(0));
        let counter = invocations.clone();

        let options = RequestAgentOptions {
            agent: None,
            agent_factory: Some(factory(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Ok(Arc::new(StubAgent::new()) as Arc<dyn Agent>) }.boxed()
            })),
        };
        let app = with_request_agent(probe(), options).unwrap();

        let response = app.clone().oneshot(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let response = app.oneshot(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        assert_eq!(invocations.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn factory_failure_is_an_internal_error() {
        let options = RequestAgentOptions {
            agent: None,
            agent_factory: Some(factory(|_| {
                async { Err(AgentError::execution("store unreachable")) }.boxed()
            })),
        };
        let app = with_request_agent(probe(), options).unwrap();

        let response = app.oneshot(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "store unreachable");
    }
}
