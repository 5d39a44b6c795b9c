use agent_api::{Agent, AgentError, MethodAgent, MethodRouter};
use data_store::KvStore;
use kv_store::KvNamespace;
use std::sync::Arc;

use crate::{methods, AgentContext, AgentOptions};

/// Key under which the identity state document is stored.
pub const STATE_KEY: &str = "identity-state";

/// Builds agents over a key-value namespace.
///
/// Each call to [`create`](Self::create) loads the identity state anew, so
/// an agent reflects every write completed before it was created.
#[derive(Clone)]
pub struct KvAgentFactory {
    namespace: Arc<dyn KvNamespace>,
    options: AgentOptions,
    router: Arc<MethodRouter<AgentContext>>,
}

impl KvAgentFactory {
    pub fn new(namespace: Arc<dyn KvNamespace>, options: AgentOptions) -> Self {
        Self {
            namespace,
            options,
            router: Arc::new(methods::router()),
        }
    }

    pub async fn create(&self) -> Result<Arc<dyn Agent>, AgentError> {
        let store = KvStore::from_key(self.namespace.clone(), STATE_KEY)
            .await
            .map_err(|err| {
                tracing::error!("could not load identity state: {err}");
                AgentError::execution(err.to_string())
            })?;

        let context = AgentContext::new(&store, &self.options);
        Ok(Arc::new(MethodAgent::new(Arc::new(context), self.router.clone())))
    }
}
