//! Identity agent backed by a key-value namespace.
//!
//! Every capability runs against an [`AgentContext`], a set of views over
//! one loaded identity state. [`KvAgentFactory`] binds a fresh context to
//! the namespace for each request.

mod context;
pub mod document;
mod error;
mod factory;
mod methods;
pub mod providers;

pub use context::{AgentContext, AgentOptions};
pub use error::Error;
pub use factory::{KvAgentFactory, STATE_KEY};
pub use methods::router;
