//! Capability contract between the HTTP layer and an identity agent.
//!
//! An [`Agent`] executes named methods on JSON parameters and describes
//! each method with a [`MethodSchema`]. [`MethodRouter`] and [`MethodAgent`]
//! turn a set of typed async handlers into such an agent.

mod error;
mod router;
mod schema;
pub mod validate;


pub use error::AgentError;
pub use router::{MethodAgent, MethodRouter};
pub use schema::{AgentSchema, MethodSchema};

use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait Agent: Send + Sync {
    /// Run `method` with `params`.
    async fn execute(&self, method: &str, params: Value) -> Result<Value, AgentError>;

    /// Names of all methods this agent can execute.
    fn available_methods(&self) -> Vec<String>;

    /// Schemas of the available methods.
    fn schema(&self) -> AgentSchema;
}
