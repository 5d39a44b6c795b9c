mod data;
mod did;
mod key;
mod private_key;

pub use data::DataStore;
pub use did::{DidStore, IdentifierFilter};
pub use key::KeyStore;
pub use private_key::PrivateKeyStore;
