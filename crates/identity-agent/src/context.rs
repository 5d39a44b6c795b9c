use data_store::{DataStore, DidStore, KeyStore, KvStore};
use keystore::{KeyEncryption, LocalKms};
use std::{collections::BTreeMap, sync::Arc};

use crate::{
    providers::{IdentifierProvider, KeyDidProvider, WebDidProvider},
    Error,
};

/// Settings shared by every agent instance.
#[derive(Clone)]
pub struct AgentOptions {
    /// Encryption applied to private keys before they are stored.
    pub encryption: Arc<dyn KeyEncryption>,
    /// Provider used when a call names none.
    pub default_provider: String,
}

/// State the capability handlers run against: views over one loaded
/// identity state plus the key management system.
pub struct AgentContext {
    pub(crate) dids: DidStore,
    pub(crate) keys: KeyStore,
    pub(crate) data: DataStore,
    pub(crate) kms: LocalKms,
    providers: BTreeMap<&'static str, Arc<dyn IdentifierProvider>>,
    default_provider: String,
}

impl AgentContext {
    pub fn new(store: &KvStore, options: &AgentOptions) -> Self {
        let providers: [Arc<dyn IdentifierProvider>; 2] =
            [Arc::new(KeyDidProvider), Arc::new(WebDidProvider)];

        Self {
            dids: store.did_store(),
            keys: store.key_store(),
            data: store.data_store(),
            kms: LocalKms::new(store.private_key_store(), options.encryption.clone()),
            providers: providers
                .into_iter()
                .map(|provider| (provider.name(), provider))
                .collect(),
            default_provider: options.default_provider.clone(),
        }
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.providers.keys().map(|name| name.to_string()).collect()
    }

    pub(crate) fn default_provider(&self) -> &str {
        &self.default_provider
    }

    /// Provider called `name`, or the default one.
    pub(crate) fn provider(&self, name: Option<&str>) -> Result<Arc<dyn IdentifierProvider>, Error> {
        let name = name.unwrap_or(&self.default_provider);

        self.providers
            .get(name)
            .cloned()
            .ok_or_else(|| Error::Unsupported(format!("identifier provider {name} is not available")))
    }

    /// Only the local kms is available.
    pub(crate) fn check_kms(&self, kms: Option<&str>) -> Result<(), Error> {
        match kms {
            None | Some(LocalKms::NAME) => Ok(()),
            Some(other) => Err(Error::InvalidArgument(format!(
                "key management system {other} is not available"
            ))),
        }
    }
}
