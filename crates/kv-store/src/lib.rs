mod file;
mod memory;


pub use file::FileNamespace;
pub use memory::MemoryNamespace;

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by key-value namespace backends.
#[derive(Debug, Error)]
pub enum KvError {
    #[error("invalid key: {0}")]
    InvalidKey(String),
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// A flat string-to-string namespace.
///
/// Implementations only need to provide whole-value reads and writes;
/// callers own any structure stored under a key.
#[async_trait]
pub trait KvNamespace: Send + Sync {
    /// Read the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, KvError>;

    /// Replace the value stored under `key`.
    async fn put(&self, key: &str, value: String) -> Result<(), KvError>;
}

/// Keys are used as file names by some backends, so only a
/// conservative character set is accepted.
pub(crate) fn ensure_valid_key(key: &str) -> Result<(), KvError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if valid {
        Ok(())
    } else {
        Err(KvError::InvalidKey(key.to_owned()))
    }
}
