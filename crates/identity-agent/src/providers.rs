use async_trait::async_trait;
use data_store::{Identifier, KeyType};
use keystore::LocalKms;
use multibase::Base;

use crate::Error;

/// Multicodec prefix of an Ed25519 public key.
const ED25519_PUB_CODEC: [u8; 2] = [0xed, 0x01];

/// Creates identifiers of one DID method.
#[async_trait]
pub trait IdentifierProvider: Send + Sync {
    /// Provider name, e.g. `did:key`.
    fn name(&self) -> &'static str;

    /// Generate keys with `kms` and derive a new identifier from them.
    async fn create_identifier(
        &self,
        kms: &LocalKms,
        alias: Option<&str>,
    ) -> Result<Identifier, Error>;
}

/// `did:key` identifiers over a single Ed25519 key.
pub struct KeyDidProvider;

#[async_trait]
impl IdentifierProvider for KeyDidProvider {
    fn name(&self) -> &'static str {
        "did:key"
    }

    async fn create_identifier(
        &self,
        kms: &LocalKms,
        alias: Option<&str>,
    ) -> Result<Identifier, Error> {
        let key = kms.create_key(KeyType::Ed25519).await?;
        let public_key = hex::decode(&key.public_key_hex).map_err(|err| {
            Error::InvalidArgument(format!("kms returned an undecodable public key: {err}"))
        })?;

        Ok(Identifier {
            did: did_key(&public_key),
            alias: alias.map(str::to_owned),
            provider: self.name().to_owned(),
            controller_key_id: Some(key.kid.clone()),
            keys: vec![key],
            services: vec![],
        })
    }
}

/// `did:web` identifiers. The alias is the (percent-encoded) host and
/// becomes the method-specific id.
pub struct WebDidProvider;

#[async_trait]
impl IdentifierProvider for WebDidProvider {
    fn name(&self) -> &'static str {
        "did:web"
    }

    async fn create_identifier(
        &self,
        kms: &LocalKms,
        alias: Option<&str>,
    ) -> Result<Identifier, Error> {
        let alias = alias.filter(|alias| !alias.is_empty()).ok_or_else(|| {
            Error::InvalidArgument("did:web identifiers require an alias".to_owned())
        })?;

        let key = kms.create_key(KeyType::Ed25519).await?;

        Ok(Identifier {
            did: format!("did:web:{alias}"),
            alias: Some(alias.to_owned()),
            provider: self.name().to_owned(),
            controller_key_id: Some(key.kid.clone()),
            keys: vec![key],
            services: vec![],
        })
    }
}

/// `did:key` of an Ed25519 public key.
pub fn did_key(public_key: &[u8]) -> String {
    let mut bytes = ED25519_PUB_CODEC.to_vec();
    bytes.extend_from_slice(public_key);

    format!("did:key:{}", multibase::encode(Base::Base58Btc, bytes))
}

/// Ed25519 public key encoded in a `did:key`, if it holds one.
pub fn did_key_public_key(did: &str) -> Option<Vec<u8>> {
    let encoded = did.strip_prefix("did:key:")?;
    let (base, bytes) = multibase::decode(encoded).ok()?;

    match (base, bytes.strip_prefix(&ED25519_PUB_CODEC[..])) {
        (Base::Base58Btc, Some(public_key)) if public_key.len() == 32 => Some(public_key.to_vec()),
        _ => None,
    }
}
