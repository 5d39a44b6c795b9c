use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::model::{
    ClaimEntry, CredentialEntry, Identifier, ManagedKeyInfo, ManagedPrivateKey, Message,
    PresentationEntry,
};

/// Mapping from record identifier to record.
pub type Table<T> = BTreeMap<String, T>;

/// Names of the tables, as they appear in the persisted document.
pub const TABLE_NAMES: [&str; 7] = [
    "dids",
    "keys",
    "privateKeys",
    "credentials",
    "claims",
    "presentations",
    "messages",
];

/// The whole persisted identity state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityState {
    #[serde(default)]
    pub dids: Table<Identifier>,
    #[serde(default)]
    pub keys: Table<ManagedKeyInfo>,
    #[serde(default)]
    pub private_keys: Table<ManagedPrivateKey>,
    #[serde(default)]
    pub credentials: Table<CredentialEntry>,
    #[serde(default)]
    pub claims: Table<ClaimEntry>,
    #[serde(default)]
    pub presentations: Table<PresentationEntry>,
    #[serde(default)]
    pub messages: Table<Message>,
}

impl IdentityState {
    /// Parse a persisted document.
    ///
    /// Never fails: unparseable input yields an empty state, and a table
    /// that is missing or not an object is left empty, and records that do
    /// not match their shape are dropped one by one.
    pub fn from_json(raw: &str) -> Self {
        let mut document = match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(document)) => document,
            Ok(_) => {
                tracing::warn!("persisted identity state is not a JSON object, starting empty");
                return Self::default();
            }
            Err(err) => {
                tracing::warn!("unparseable identity state, starting empty: {err}");
                return Self::default();
            }
        };

        Self {
            dids: take_table(&mut document, "dids"),
            keys: take_table(&mut document, "keys"),
            private_keys: take_table(&mut document, "privateKeys"),
            credentials: take_table(&mut document, "credentials"),
            claims: take_table(&mut document, "claims"),
            presentations: take_table(&mut document, "presentations"),
            messages: take_table(&mut document, "messages"),
        }
    }

    /// Serialize all seven tables into one document.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn is_empty(&self) -> bool {
        self.dids.is_empty()
            && self.keys.is_empty()
            && self.private_keys.is_empty()
            && self.credentials.is_empty()
            && self.claims.is_empty()
            && self.presentations.is_empty()
            && self.messages.is_empty()
    }
}

fn take_table<T: DeserializeOwned>(document: &mut Map<String, Value>, name: &str) -> Table<T> {
    let records = match document.remove(name) {
        None | Some(Value::Null) => return Table::new(),
        Some(Value::Object(records)) => records,
        Some(_) => {
            tracing::warn!("discarding `{name}` table: not a JSON object");
            return Table::new();
        }
    };

    records
        .into_iter()
        .filter_map(|(id, record)| match serde_json::from_value(record) {
            Ok(record) => Some((id, record)),
            Err(err) => {
                tracing::warn!("discarding malformed `{name}` record {id}: {err}");
                None
            }
        })
        .collect()
}
