use std::sync::Arc;

use crate::{cache::JsonCache, model::Identifier, StoreError};

/// Filter for listing identifiers. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct IdentifierFilter {
    pub alias: Option<String>,
    pub provider: Option<String>,
}

impl IdentifierFilter {
    fn matches(&self, identifier: &Identifier) -> bool {
        let alias_matches = self
            .alias
            .as_ref()
            .map_or(true, |alias| identifier.alias.as_ref() == Some(alias));
        let provider_matches = self
            .provider
            .as_ref()
            .map_or(true, |provider| &identifier.provider == provider);

        alias_matches && provider_matches
    }
}

/// View over the `dids` table.
///
/// Importing an identifier also records its keys in the `keys` table.
#[derive(Clone)]
pub struct DidStore {
    cache: Arc<JsonCache>,
}

impl DidStore {
    pub fn new(cache: Arc<JsonCache>) -> Self {
        Self { cache }
    }

    pub async fn import(&self, identifier: Identifier) -> Result<(), StoreError> {
        self.cache
            .update(move |state| {
                for key in &identifier.keys {
                    state.keys.insert(key.kid.clone(), key.clone());
                }
                state.dids.insert(identifier.did.clone(), identifier);
            })
            .await
    }

    pub async fn get(&self, did: &str) -> Option<Identifier> {
        self.cache.read(|state| state.dids.get(did).cloned()).await
    }

    pub async fn get_by_alias(&self, alias: &str, provider: Option<&str>) -> Option<Identifier> {
        let filter = IdentifierFilter {
            alias: Some(alias.to_owned()),
            provider: provider.map(str::to_owned),
        };

        self.list(&filter).await.into_iter().next()
    }

    pub async fn list(&self, filter: &IdentifierFilter) -> Vec<Identifier> {
        self.cache
            .read(|state| {
                state
                    .dids
                    .values()
                    .filter(|identifier| filter.matches(identifier))
                    .cloned()
                    .collect()
            })
            .await
    }

    /// Remove an identifier with its keys and their private halves, in a
    /// single write. Returns whether it existed.
    pub async fn delete(&self, did: &str) -> Result<bool, StoreError> {
        self.cache
            .update(|state| match state.dids.remove(did) {
                Some(identifier) => {
                    for key in &identifier.keys {
                        state.keys.remove(&key.kid);
                        state.private_keys.remove(&key.kid);
                    }
                    true
                }
                None => false,
            })
            .await
    }
}
