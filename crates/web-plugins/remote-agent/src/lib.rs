//! HTTP exposure of an [`agent_api::Agent`].
//!
//! [`with_request_agent`] attaches an agent to every request. The method
//! routes ([`agent_routes`]) and the schema routes ([`schema_routes`]) run
//! the attached agent; [`RemoteAgentPlugin`] bundles both for the server.

mod auth;
mod context;
mod dispatch;
mod error;
mod schema;

pub mod plugin;

pub use context::{with_request_agent, AgentFactory, ContextError, RequestAgent, RequestAgentOptions};
pub use dispatch::{routes as agent_routes, AgentRouterOptions};
pub use plugin::{RemoteAgentOptions, RemoteAgentPlugin};
pub use schema::{routes as schema_routes, ApiSchemaOptions};
