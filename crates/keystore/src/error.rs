use core::fmt::{Debug, Display};
use std::error::Error as StdError;

use data_store::StoreError;

/// Kind of error that can occur during key management operations.
#[derive(thiserror::Error, Debug, Copy, Clone, Eq, PartialEq)]
pub enum ErrorKind {
    /// The error was caused by reading or writing the identity state.
    #[error("Repository error")]
    RepositoryFailure,
    /// The error occurred when trying to encrypt the key.
    #[error("Encryption failure")]
    EncryptionFailure,
    /// The error occurred when trying to decrypt the key.
    #[error("Decryption failure")]
    DecryptionFailure,
    /// The key material could not be decoded.
    #[error("The key is malformed")]
    MalformedKey,
    /// No private key is held for the requested key id.
    #[error("Key not found")]
    KeyNotFound,
    /// The operation is not available for this key type or algorithm.
    #[error("Unsupported key type")]
    Unsupported,
}

/// Represents all possible errors that can occur during key management operations.
pub struct Error {
    kind: ErrorKind,
    source: eyre::Report,
}

impl Error {
    /// Returns the kind of the error that occurred.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub(crate) fn new<E>(kind: ErrorKind, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Error {
            kind,
            source: eyre::Report::new(source),
        }
    }

    pub(crate) fn msg<M>(kind: ErrorKind, msg: M) -> Self
    where
        M: Display + Debug + Send + Sync + 'static,
    {
        Error {
            kind,
            source: eyre::Report::msg(msg),
        }
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Error")
            .field("kind", &self.kind)
            .field("source", &self.source.root_cause())
            .finish()
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.source)
    }
}

impl StdError for Error {}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        Error::new(ErrorKind::RepositoryFailure, err)
    }
}

impl From<hex::FromHexError> for Error {
    fn from(err: hex::FromHexError) -> Self {
        Error::new(ErrorKind::MalformedKey, err)
    }
}
