use data_store::{KeyType, ManagedKeyInfo, ManagedPrivateKey, PrivateKeyStore};
use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;
use serde_json::json;
use std::sync::Arc;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroizing;

use crate::{encryptor::KeyEncryption, Error, ErrorKind};

/// Key management system holding private keys in the identity state.
///
/// Key ids are the hex-encoded public keys. Private material is encrypted
/// with the configured [`KeyEncryption`] before it reaches the store.
#[derive(Clone)]
pub struct LocalKms {
    private_keys: PrivateKeyStore,
    encryption: Arc<dyn KeyEncryption>,
}

impl LocalKms {
    /// Name under which this KMS is registered.
    pub const NAME: &'static str = "local";

    pub fn new(private_keys: PrivateKeyStore, encryption: Arc<dyn KeyEncryption>) -> Self {
        Self {
            private_keys,
            encryption,
        }
    }

    /// Generate a fresh key pair and store its private half.
    pub async fn create_key(&self, key_type: KeyType) -> Result<ManagedKeyInfo, Error> {
        let secret = match key_type {
            KeyType::Ed25519 => Zeroizing::new(SigningKey::generate(&mut OsRng).to_bytes()),
            KeyType::X25519 => Zeroizing::new(StaticSecret::random_from_rng(OsRng).to_bytes()),
            other => return Err(unsupported(other)),
        };

        self.import_key(key_type, secret.as_slice()).await
    }

    /// Store existing private key material and return its public info.
    pub async fn import_key(
        &self,
        key_type: KeyType,
        private_key: &[u8],
    ) -> Result<ManagedKeyInfo, Error> {
        let public_key = public_key(key_type, private_key)?;
        let kid = hex::encode(public_key);

        let sealed = self.encryption.encrypt(private_key).await?;
        self.private_keys
            .import(ManagedPrivateKey {
                alias: kid.clone(),
                private_key_hex: hex::encode(sealed),
                key_type,
            })
            .await?;

        tracing::debug!("stored {} private key {kid}", key_type.as_str());

        Ok(ManagedKeyInfo {
            kid: kid.clone(),
            kms: Self::NAME.to_owned(),
            key_type,
            public_key_hex: kid,
            meta: Some(json!({ "algorithms": algorithms(key_type) })),
        })
    }

    /// Drop the private key of `kid`. Returns whether one was held.
    pub async fn delete_key(&self, kid: &str) -> Result<bool, Error> {
        Ok(self.private_keys.delete(kid).await?)
    }

    /// Sign `data` with the private key of `kid`.
    ///
    /// Only Ed25519 keys sign; `algorithm`, when given, must be `EdDSA` or
    /// `Ed25519`.
    pub async fn sign(
        &self,
        kid: &str,
        data: &[u8],
        algorithm: Option<&str>,
    ) -> Result<Vec<u8>, Error> {
        let record = self.private_keys.get(kid).await.ok_or_else(|| {
            Error::msg(ErrorKind::KeyNotFound, format!("no private key for {kid}"))
        })?;

        if record.key_type != KeyType::Ed25519 {
            return Err(unsupported(record.key_type));
        }
        if let Some(algorithm) = algorithm.filter(|alg| !matches!(*alg, "EdDSA" | "Ed25519")) {
            return Err(Error::msg(
                ErrorKind::Unsupported,
                format!("algorithm {algorithm} is not available for Ed25519 keys"),
            ));
        }

        let sealed = hex::decode(&record.private_key_hex)?;
        let secret = Zeroizing::new(self.encryption.decrypt(&sealed).await?);
        let signing_key = SigningKey::from_bytes(&*secret_bytes(&secret)?);

        Ok(signing_key.sign(data).to_bytes().to_vec())
    }
}

/// Algorithms a key of the given type can be used with.
pub fn algorithms(key_type: KeyType) -> Vec<&'static str> {
    match key_type {
        KeyType::Ed25519 => vec!["EdDSA", "Ed25519"],
        KeyType::X25519 => vec!["ECDH", "ECDH-ES", "ECDH-1PU"],
        _ => vec![],
    }
}

fn public_key(key_type: KeyType, private_key: &[u8]) -> Result<[u8; 32], Error> {
    let secret = secret_bytes(private_key)?;

    match key_type {
        KeyType::Ed25519 => Ok(SigningKey::from_bytes(&*secret).verifying_key().to_bytes()),
        KeyType::X25519 => Ok(PublicKey::from(&StaticSecret::from(*secret)).to_bytes()),
        other => Err(unsupported(other)),
    }
}

fn secret_bytes(private_key: &[u8]) -> Result<Zeroizing<[u8; 32]>, Error> {
    let bytes: [u8; 32] = private_key.try_into().map_err(|_| {
        Error::msg(
            ErrorKind::MalformedKey,
            format!("private key must be 32 bytes, got {}", private_key.len()),
        )
    })?;

    Ok(Zeroizing::new(bytes))
}

fn unsupported(key_type: KeyType) -> Error {
    Error::msg(
        ErrorKind::Unsupported,
        format!("{} keys are not managed by the local kms", key_type.as_str()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NoEncryption, SecretBox};
    use data_store::KvStore;
    use ed25519_dalek::{Signature, Verifier, VerifyingKey};
    use kv_store::MemoryNamespace;

    async fn kms(encryption: Arc<dyn KeyEncryption>) -> (LocalKms, KvStore) {
        let store = KvStore::from_key(Arc::new(MemoryNamespace::new()), "identity-state")
            .await
            .unwrap();

        (LocalKms::new(store.private_key_store(), encryption), store)
    }

    #[tokio::test]
    async fn ed25519_signature_verifies() {
        let (kms, _) = kms(Arc::new(NoEncryption)).await;

        let key = kms.create_key(KeyType::Ed25519).await.unwrap();
        let signature = kms.sign(&key.kid, b"hello", None).await.unwrap();

        let public: [u8; 32] = hex::decode(&key.public_key_hex)
            .unwrap()
            .try_into()
            .unwrap();
        let verifying_key = VerifyingKey::from_bytes(&public).unwrap();
        let signature = Signature::from_slice(&signature).unwrap();

        assert!(verifying_key.verify(b"hello", &signature).is_ok());
    }

    #[tokio::test]
    async fn private_keys_are_stored_encrypted() {
        let secret_box = SecretBox::from_hex(&"42".repeat(32)).unwrap();
        let (kms, store) = kms(Arc::new(secret_box)).await;

        let private_key = [7u8; 32];
        let key = kms.import_key(KeyType::Ed25519, &private_key).await.unwrap();

        let record = store.private_key_store().get(&key.kid).await.unwrap();
        assert_ne!(record.private_key_hex, hex::encode(private_key));

        // Still usable for signing once decrypted
        assert!(kms.sign(&key.kid, b"data", Some("EdDSA")).await.is_ok());
    }

    #[tokio::test]
    async fn x25519_keys_do_not_sign() {
        let (kms, _) = kms(Arc::new(NoEncryption)).await;

        let key = kms.create_key(KeyType::X25519).await.unwrap();
        assert_eq!(key.key_type, KeyType::X25519);

        let err = kms.sign(&key.kid, b"data", None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
    }

    #[tokio::test]
    async fn signing_with_unknown_or_deleted_key_fails() {
        let (kms, _) = kms(Arc::new(NoEncryption)).await;

        let key = kms.create_key(KeyType::Ed25519).await.unwrap();
        assert!(kms.delete_key(&key.kid).await.unwrap());
        assert!(!kms.delete_key(&key.kid).await.unwrap());

        let err = kms.sign(&key.kid, b"data", None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::KeyNotFound);
    }

    #[tokio::test]
    async fn unsupported_algorithm_is_rejected() {
        let (kms, _) = kms(Arc::new(NoEncryption)).await;
        let key = kms.create_key(KeyType::Ed25519).await.unwrap();

        let err = kms.sign(&key.kid, b"data", Some("ES256K")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
    }

    #[tokio::test]
    async fn secp256k1_generation_is_unsupported() {
        let (kms, _) = kms(Arc::new(NoEncryption)).await;

        let err = kms.create_key(KeyType::Secp256k1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
    }
}
