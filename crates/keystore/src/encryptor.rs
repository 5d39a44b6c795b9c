use async_trait::async_trait;
use chacha20poly1305::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    XChaCha20Poly1305, XNonce,
};
use zeroize::Zeroizing;

use crate::{Error, ErrorKind};

const NONCE_LEN: usize = 24;

/// Abstract interface for key encryption backends.
#[async_trait]
pub trait KeyEncryption: Send + Sync {
    /// Encrypt plaintext key material.
    async fn encrypt(&self, key_material: &[u8]) -> Result<Vec<u8>, Error>;

    /// Decrypt encrypted key material.
    async fn decrypt(&self, encrypted_key: &[u8]) -> Result<Vec<u8>, Error>;
}

/// Stores key material as is.
pub struct NoEncryption;

#[async_trait]
impl KeyEncryption for NoEncryption {
    async fn encrypt(&self, key_material: &[u8]) -> Result<Vec<u8>, Error> {
        Ok(key_material.to_vec())
    }

    async fn decrypt(&self, encrypted_key: &[u8]) -> Result<Vec<u8>, Error> {
        Ok(encrypted_key.to_vec())
    }
}

/// Symmetric encryption of key material with XChaCha20-Poly1305.
///
/// Output layout is the random 24-byte nonce followed by the ciphertext.
pub struct SecretBox {
    secret: Zeroizing<Vec<u8>>,
}

impl SecretBox {
    /// Build from a 32-byte secret given as 64 hex characters.
    pub fn from_hex(secret: &str) -> Result<Self, Error> {
        let secret = Zeroizing::new(hex::decode(secret.trim())?);

        if secret.len() != 32 {
            return Err(Error::msg(
                ErrorKind::MalformedKey,
                format!("secret box key must be 32 bytes, got {}", secret.len()),
            ));
        }

        Ok(Self { secret })
    }

    fn cipher(&self) -> Result<XChaCha20Poly1305, Error> {
        XChaCha20Poly1305::new_from_slice(&self.secret)
            .map_err(|_| Error::msg(ErrorKind::MalformedKey, "invalid secret box key length"))
    }
}

#[async_trait]
impl KeyEncryption for SecretBox {
    async fn encrypt(&self, key_material: &[u8]) -> Result<Vec<u8>, Error> {
        let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher()?
            .encrypt(&nonce, key_material)
            .map_err(|_| Error::msg(ErrorKind::EncryptionFailure, "could not seal key material"))?;

        let mut sealed = nonce.to_vec();
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    async fn decrypt(&self, encrypted_key: &[u8]) -> Result<Vec<u8>, Error> {
        if encrypted_key.len() <= NONCE_LEN {
            return Err(Error::msg(
                ErrorKind::DecryptionFailure,
                "sealed key material is too short",
            ));
        }

        let (nonce, ciphertext) = encrypted_key.split_at(NONCE_LEN);
        self.cipher()?
            .decrypt(XNonce::from_slice(nonce), ciphertext)
            .map_err(|_| Error::msg(ErrorKind::DecryptionFailure, "could not open key material"))
    }
}
