use async_trait::async_trait;
use dashmap::DashMap;

use crate::{ensure_valid_key, KvError, KvNamespace};

/// In-process namespace. State lives as long as the instance.
#[derive(Debug, Default)]
pub struct MemoryNamespace {
    entries: DashMap<String, String>,
}

impl MemoryNamespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate the namespace, e.g. to seed test fixtures.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[async_trait]
impl KvNamespace for MemoryNamespace {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        ensure_valid_key(key)?;
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn put(&self, key: &str, value: String) -> Result<(), KvError> {
        ensure_valid_key(key)?;
        self.entries.insert(key.to_owned(), value);
        Ok(())
    }
}
