use std::sync::Arc;

use crate::{cache::JsonCache, model::ManagedPrivateKey, StoreError};

/// View over the `privateKeys` table. Stores records as given; encryption
/// is up to the key management system.
#[derive(Clone)]
pub struct PrivateKeyStore {
    cache: Arc<JsonCache>,
}

impl PrivateKeyStore {
    pub fn new(cache: Arc<JsonCache>) -> Self {
        Self { cache }
    }

    pub async fn import(&self, key: ManagedPrivateKey) -> Result<(), StoreError> {
        self.cache
            .update(move |state| {
                state.private_keys.insert(key.alias.clone(), key);
            })
            .await
    }

    pub async fn get(&self, alias: &str) -> Option<ManagedPrivateKey> {
        self.cache
            .read(|state| state.private_keys.get(alias).cloned())
            .await
    }

    pub async fn delete(&self, alias: &str) -> Result<bool, StoreError> {
        self.cache
            .update(|state| state.private_keys.remove(alias).is_some())
            .await
    }

    pub async fn list(&self) -> Vec<ManagedPrivateKey> {
        self.cache
            .read(|state| state.private_keys.values().cloned().collect())
            .await
    }
}
