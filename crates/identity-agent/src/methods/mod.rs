mod data_store;
mod did_manager;
mod key_manager;
mod resolver;

use agent_api::MethodRouter;

use crate::AgentContext;

/// All capabilities of the local identity agent.
pub fn router() -> MethodRouter<AgentContext> {
    MethodRouter::new()
        .merge(did_manager::routes())
        .merge(key_manager::routes())
        .merge(resolver::routes())
        .merge(data_store::routes())
}
