//! Identity state persisted as one JSON document.
//!
//! The document is loaded once per [`KvStore`] handle and fully rewritten on
//! every mutation. Typed views ([`DidStore`], [`KeyStore`],
//! [`PrivateKeyStore`], [`DataStore`]) share the handle's [`JsonCache`] and
//! route their changes through its single [`StateListener`].

mod cache;
mod kv;
mod model;
mod state;
mod views;

pub use cache::{JsonCache, StateListener};
pub use kv::KvStore;
pub use model::{
    ClaimEntry, CredentialEntry, Identifier, Key, KeyType, ManagedKeyInfo, ManagedPrivateKey,
    Message, PresentationEntry, Service,
};
pub use state::{IdentityState, Table, TABLE_NAMES};
pub use views::{DataStore, DidStore, IdentifierFilter, KeyStore, PrivateKeyStore};

use kv_store::KvError;
use thiserror::Error;

/// Errors raised while reading or writing the identity state.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend failure: {0}")]
    Backend(#[from] KvError),
    #[error("could not serialize state: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}
