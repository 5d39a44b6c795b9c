use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::error::Error;

/// Token expected in `Authorization: Bearer <token>`.
#[derive(Clone)]
pub(crate) struct ApiKey(Arc<str>);

impl ApiKey {
    pub(crate) fn new(key: &str) -> Self {
        Self(Arc::from(key))
    }

    fn matches(&self, token: &str) -> bool {
        token.as_bytes().ct_eq(self.0.as_bytes()).into()
    }
}

/// Rejects requests without the configured bearer token.
pub(crate) async fn bearer_auth(
    State(api_key): State<ApiKey>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim());

    match token {
        Some(token) if api_key.matches(token) => next.run(request).await,
        _ => {
            tracing::debug!("rejected {} {}: bad bearer token", request.method(), request.uri());
            Error::Unauthorized.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compares_whole_token() {
        let key = ApiKey::new("secret");

        assert!(key.matches("secret"));
        assert!(!key.matches("secre"));
        assert!(!key.matches("secret2"));
        assert!(!key.matches(""));
    }
}
