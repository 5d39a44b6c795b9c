use async_trait::async_trait;
use kv_store::KvNamespace;
use std::sync::Arc;

use crate::{
    cache::{JsonCache, StateListener},
    state::IdentityState,
    views::{DataStore, DidStore, KeyStore, PrivateKeyStore},
    StoreError,
};

/// Identity state bound to one key of a key-value namespace.
///
/// The handle loads the document once on construction and afterwards only
/// writes: every state change reported by its cache replaces the whole
/// persisted document.
#[derive(Clone)]
pub struct KvStore {
    cache: Arc<JsonCache>,
}

/// Sole writer of the persisted document.
struct KvWriter {
    namespace: Arc<dyn KvNamespace>,
    key: String,
}

impl KvStore {
    /// Bind to `key` in `namespace` and load its current content.
    ///
    /// A missing key or malformed content yields an empty state; backend
    /// failures are returned.
    pub async fn from_key(
        namespace: Arc<dyn KvNamespace>,
        key: impl Into<String>,
    ) -> Result<Self, StoreError> {
        let writer = KvWriter {
            namespace,
            key: key.into(),
        };
        let state = writer.load().await?;

        Ok(Self {
            cache: Arc::new(JsonCache::new(state, Arc::new(writer))),
        })
    }

    pub fn cache(&self) -> Arc<JsonCache> {
        self.cache.clone()
    }

    pub fn did_store(&self) -> DidStore {
        DidStore::new(self.cache())
    }

    pub fn key_store(&self) -> KeyStore {
        KeyStore::new(self.cache())
    }

    pub fn private_key_store(&self) -> PrivateKeyStore {
        PrivateKeyStore::new(self.cache())
    }

    pub fn data_store(&self) -> DataStore {
        DataStore::new(self.cache())
    }
}

impl KvWriter {
    async fn load(&self) -> Result<IdentityState, StoreError> {
        let raw = self
            .namespace
            .get(&self.key)
            .await?
            .unwrap_or_else(|| "{}".to_owned());

        Ok(IdentityState::from_json(&raw))
    }

    async fn save(&self, new_state: &IdentityState) -> Result<(), StoreError> {
        let document = new_state.to_json()?;
        self.namespace.put(&self.key, document).await?;

        tracing::debug!("persisted identity state under key {}", self.key);
        Ok(())
    }
}

#[async_trait]
impl StateListener for KvWriter {
    async fn state_changed(
        &self,
        _old_state: &IdentityState,
        new_state: &IdentityState,
    ) -> Result<(), StoreError> {
        self.save(new_state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::{Identifier, Key, KeyType, ManagedPrivateKey},
        state::TABLE_NAMES,
    };
    use kv_store::{tests::FlakyNamespace, MemoryNamespace};
    use serde_json::{json, Value};

    const STATE_KEY: &str = "identity-state";

    fn key(kid: &str) -> Key {
        Key {
            kid: kid.to_owned(),
            kms: "local".to_owned(),
            key_type: KeyType::Ed25519,
            public_key_hex: kid.to_owned(),
            meta: None,
        }
    }

    fn identifier(did: &str, alias: &str, kid: &str) -> Identifier {
        Identifier {
            did: did.to_owned(),
            alias: Some(alias.to_owned()),
            provider: "did:key".to_owned(),
            controller_key_id: Some(kid.to_owned()),
            keys: vec![key(kid)],
            services: vec![],
        }
    }

    #[tokio::test]
    async fn missing_key_loads_empty_state() {
        let namespace = Arc::new(MemoryNamespace::new());
        let store = KvStore::from_key(namespace, STATE_KEY).await.unwrap();

        assert!(store.cache().snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn malformed_document_loads_empty_state() {
        let namespace = Arc::new(MemoryNamespace::with_entries([(STATE_KEY, "{oops")]));
        let store = KvStore::from_key(namespace, STATE_KEY).await.unwrap();

        assert!(store.cache().snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn partial_document_keeps_populated_tables() {
        let raw = json!({
            "privateKeys": {
                "k1": { "alias": "k1", "privateKeyHex": "00", "type": "Ed25519" }
            }
        });
        let namespace = Arc::new(MemoryNamespace::with_entries([(STATE_KEY, raw.to_string())]));
        let store = KvStore::from_key(namespace, STATE_KEY).await.unwrap();

        let state = store.cache().snapshot().await;
        assert_eq!(state.private_keys.len(), 1);
        assert!(state.dids.is_empty());
        assert!(state.credentials.is_empty());
    }

    #[tokio::test]
    async fn mutations_survive_reload() {
        let namespace = Arc::new(MemoryNamespace::new());
        let store = KvStore::from_key(namespace.clone(), STATE_KEY)
            .await
            .unwrap();

        store
            .did_store()
            .import(identifier("did:key:z6Mk1", "default", "aa"))
            .await
            .unwrap();
        store
            .private_key_store()
            .import(ManagedPrivateKey {
                alias: "aa".to_owned(),
                private_key_hex: "secret".to_owned(),
                key_type: KeyType::Ed25519,
            })
            .await
            .unwrap();
        store
            .data_store()
            .save_credential(json!({
                "@context": ["https://www.w3.org/2018/credentials/v1"],
                "type": ["VerifiableCredential"],
                "issuer": { "id": "did:key:z6Mk1" },
                "issuanceDate": "2024-01-01T00:00:00Z",
                "credentialSubject": { "id": "did:example:bob", "name": "Bob" }
            }))
            .await
            .unwrap();

        let saved = store.cache().snapshot().await;

        // Fresh handle over the same namespace, as on a new request
        let reloaded = KvStore::from_key(namespace, STATE_KEY).await.unwrap();
        let reloaded = reloaded.cache().snapshot().await;

        assert_eq!(reloaded.dids, saved.dids);
        assert_eq!(reloaded.keys, saved.keys);
        assert_eq!(reloaded.private_keys, saved.private_keys);
        assert_eq!(reloaded.credentials, saved.credentials);
        assert_eq!(reloaded.claims, saved.claims);
        assert_eq!(reloaded.presentations, saved.presentations);
        assert_eq!(reloaded.messages, saved.messages);
        assert_eq!(reloaded.keys.len(), 1);
        assert_eq!(reloaded.claims.len(), 1);
    }

    #[tokio::test]
    async fn each_mutation_writes_the_whole_document_once() {
        let namespace = FlakyNamespace::new(MemoryNamespace::new());
        let store = KvStore::from_key(Arc::new(namespace.clone()), STATE_KEY)
            .await
            .unwrap();

        store.key_store().import(key("aa")).await.unwrap();
        assert_eq!(namespace.writes(), 1);

        store.key_store().import(key("bb")).await.unwrap();
        assert_eq!(namespace.writes(), 2);

        let raw = namespace.get(STATE_KEY).await.unwrap().unwrap();
        let document: Value = serde_json::from_str(&raw).unwrap();
        for name in TABLE_NAMES {
            assert!(document.get(name).is_some(), "table {name}");
        }
        assert_eq!(document["keys"].as_object().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn backend_failures_propagate() {
        let namespace = FlakyNamespace::new(MemoryNamespace::new());

        namespace.fail_reads(true);
        assert!(matches!(
            KvStore::from_key(Arc::new(namespace.clone()), STATE_KEY).await,
            Err(StoreError::Backend(_))
        ));

        namespace.fail_reads(false);
        let store = KvStore::from_key(Arc::new(namespace.clone()), STATE_KEY)
            .await
            .unwrap();

        namespace.fail_writes(true);
        assert!(matches!(
            store.key_store().import(key("aa")).await,
            Err(StoreError::Backend(_))
        ));
        assert!(store.key_store().get("aa").await.is_none());
    }
}
