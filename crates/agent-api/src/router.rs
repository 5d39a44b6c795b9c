use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::{collections::BTreeMap, future::Future, sync::Arc};

use crate::{validate, Agent, AgentError, AgentSchema, MethodSchema};

type MethodHandler<S> =
    Arc<dyn Fn(Arc<S>, Value) -> BoxFuture<'static, Result<Value, AgentError>> + Send + Sync>;

struct Route<S> {
    schema: MethodSchema,
    handler: MethodHandler<S>,
}

impl<S> Clone for Route<S> {
    fn clone(&self) -> Self {
        Self {
            schema: self.schema.clone(),
            handler: self.handler.clone(),
        }
    }
}

/// Registry of typed method handlers sharing a state `S`.
pub struct MethodRouter<S> {
    routes: BTreeMap<String, Route<S>>,
}

impl<S> Clone for MethodRouter<S> {
    fn clone(&self) -> Self {
        Self {
            routes: self.routes.clone(),
        }
    }
}

impl<S> Default for MethodRouter<S>
where
    S: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> MethodRouter<S>
where
    S: Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            routes: BTreeMap::new(),
        }
    }

    /// Register `handler` under `name`.
    ///
    /// Parameters are decoded into `A` after schema validation; a decoding
    /// failure is reported as a validation error as well.
    pub fn route<A, R, E, F, Fut>(mut self, name: &str, schema: MethodSchema, handler: F) -> Self
    where
        A: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        E: Into<AgentError> + Send + 'static,
        F: Fn(Arc<S>, A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
    {
        let method = name.to_owned();
        let handler = Arc::new(handler);

        let erased: MethodHandler<S> = Arc::new(
            move |state: Arc<S>, params: Value| -> BoxFuture<'static, Result<Value, AgentError>> {
                let handler = handler.clone();
                let method = method.clone();

                Box::pin(async move {
                    let args: A = serde_json::from_value(params).map_err(|err| {
                        AgentError::Validation {
                            message: format!("invalid arguments for {method}: {err}"),
                            method: method.clone(),
                            path: String::new(),
                            code: "type".to_owned(),
                            description: err.to_string(),
                        }
                    })?;

                    let output = handler(state, args).await.map_err(Into::into)?;

                    serde_json::to_value(output).map_err(|err| AgentError::execution(err.to_string()))
                })
            },
        );

        self.routes.insert(
            name.to_owned(),
            Route {
                schema,
                handler: erased,
            },
        );
        self
    }

    /// Take over all routes of `other`, replacing same-named ones.
    pub fn merge(mut self, other: Self) -> Self {
        self.routes.extend(other.routes);
        self
    }

    pub fn methods(&self) -> Vec<String> {
        self.routes.keys().cloned().collect()
    }

    pub fn schema(&self) -> AgentSchema {
        self.routes
            .iter()
            .map(|(name, route)| (name.clone(), route.schema.clone()))
            .collect()
    }
}

/// [`Agent`] executing the methods of a [`MethodRouter`] against a state.
pub struct MethodAgent<S> {
    state: Arc<S>,
    router: Arc<MethodRouter<S>>,
}

impl<S> MethodAgent<S>
where
    S: Send + Sync + 'static,
{
    pub fn new(state: Arc<S>, router: Arc<MethodRouter<S>>) -> Self {
        Self { state, router }
    }

    pub fn state(&self) -> &Arc<S> {
        &self.state
    }
}

#[async_trait]
impl<S> Agent for MethodAgent<S>
where
    S: Send + Sync + 'static,
{
    async fn execute(&self, method: &str, params: Value) -> Result<Value, AgentError> {
        let route = self
            .router
            .routes
            .get(method)
            .ok_or_else(|| AgentError::execution(format!("method {method} is not available")))?;

        if let Err(violation) = validate::validate(&route.schema.arguments, &params) {
            tracing::debug!("rejected arguments for {method}: {violation:?}");

            return Err(AgentError::Validation {
                message: format!(
                    "invalid arguments for {method}: {} {}",
                    violation.path, violation.description
                ),
                method: method.to_owned(),
                path: violation.path,
                code: violation.code.to_owned(),
                description: violation.description,
            });
        }

        let handler = route.handler.clone();
        handler(self.state.clone(), params).await
    }

    fn available_methods(&self) -> Vec<String> {
        self.router.methods()
    }

    fn schema(&self) -> AgentSchema {
        self.router.schema()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counter {
        value: AtomicUsize,
    }

    #[derive(Deserialize)]
    struct AddArgs {
        amount: usize,
    }

    async fn add(state: Arc<Counter>, args: AddArgs) -> Result<usize, AgentError> {
        Ok(state.value.fetch_add(args.amount, Ordering::SeqCst) + args.amount)
    }

    async fn fail(_: Arc<Counter>, _: Value) -> Result<(), AgentError> {
        Err(AgentError::execution("store unavailable"))
    }

    fn agent() -> MethodAgent<Counter> {
        let router = MethodRouter::new()
            .route(
                "add",
                MethodSchema::new(
                    "Increment the counter",
                    json!({
                        "type": "object",
                        "required": ["amount"],
                        "properties": { "amount": { "type": "integer" } }
                    }),
                    json!({ "type": "integer" }),
                ),
                add,
            )
            .route("fail", MethodSchema::default(), fail);

        MethodAgent::new(Arc::new(Counter::default()), Arc::new(router))
    }

    #[tokio::test]
    async fn executes_typed_handlers() {
        let agent = agent();

        assert_eq!(agent.execute("add", json!({ "amount": 2 })).await, Ok(json!(2)));
        assert_eq!(agent.execute("add", json!({ "amount": 3 })).await, Ok(json!(5)));
    }

    #[tokio::test]
    async fn schema_violation_is_a_validation_error() {
        let err = agent()
            .execute("add", json!({ "amount": "two" }))
            .await
            .unwrap_err();

        match err {
            AgentError::Validation {
                method, path, code, ..
            } => {
                assert_eq!(method, "add");
                assert_eq!(path, "/amount");
                assert_eq!(code, "type");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn undecodable_arguments_are_a_validation_error() {
        // Passes the schema, but does not fit into `usize`
        let err = agent()
            .execute("add", json!({ "amount": -1 }))
            .await
            .unwrap_err();

        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn handler_failures_and_unknown_methods_are_execution_errors() {
        let agent = agent();

        assert_eq!(
            agent.execute("fail", json!({})).await,
            Err(AgentError::execution("store unavailable"))
        );
        assert!(matches!(
            agent.execute("missing", json!({})).await,
            Err(AgentError::Execution { .. })
        ));
    }

    #[test]
    fn lists_methods_and_schemas() {
        let agent = agent();

        assert_eq!(agent.available_methods(), vec!["add", "fail"]);
        assert_eq!(agent.schema()["add"].description, "Increment the counter");
    }
}
