mod error;

pub mod plugin;
pub mod web;

// Re-exports
pub use plugin::{DidEndpoint, DidEndpointOptions};
