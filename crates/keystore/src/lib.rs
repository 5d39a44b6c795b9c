//! Local key management for the identity agent.
//!
//! [`LocalKms`] generates Ed25519 and X25519 keys, signs with Ed25519 keys
//! and stores private material through a [`KeyEncryption`] backend in the
//! `privateKeys` table of the identity state.

mod encryptor;
mod error;
mod kms;

pub use encryptor::{KeyEncryption, NoEncryption, SecretBox};
pub use error::{Error, ErrorKind};
pub use kms::{algorithms, LocalKms};
