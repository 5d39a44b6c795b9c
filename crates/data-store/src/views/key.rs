use std::sync::Arc;

use crate::{cache::JsonCache, model::ManagedKeyInfo, StoreError};

/// View over the `keys` table.
#[derive(Clone)]
pub struct KeyStore {
    cache: Arc<JsonCache>,
}

impl KeyStore {
    pub fn new(cache: Arc<JsonCache>) -> Self {
        Self { cache }
    }

    pub async fn import(&self, key: ManagedKeyInfo) -> Result<(), StoreError> {
        self.cache
            .update(move |state| {
                state.keys.insert(key.kid.clone(), key);
            })
            .await
    }

    pub async fn get(&self, kid: &str) -> Option<ManagedKeyInfo> {
        self.cache.read(|state| state.keys.get(kid).cloned()).await
    }

    pub async fn delete(&self, kid: &str) -> Result<bool, StoreError> {
        self.cache
            .update(|state| state.keys.remove(kid).is_some())
            .await
    }

    pub async fn list(&self) -> Vec<ManagedKeyInfo> {
        self.cache
            .read(|state| state.keys.values().cloned().collect())
            .await
    }
}
