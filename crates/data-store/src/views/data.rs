use serde_json::Value;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::{
    cache::JsonCache,
    model::{ClaimEntry, CredentialEntry, Message, PresentationEntry},
    state::IdentityState,
    StoreError,
};

/// View over the `credentials`, `claims`, `presentations` and `messages`
/// tables.
#[derive(Clone)]
pub struct DataStore {
    cache: Arc<JsonCache>,
}

impl DataStore {
    pub fn new(cache: Arc<JsonCache>) -> Self {
        Self { cache }
    }

    /// Store a credential along with one claim per subject property.
    /// Returns the credential hash.
    pub async fn save_credential(&self, credential: Value) -> Result<String, StoreError> {
        let (entry, claims) = credential_entry(credential)?;
        let hash = entry.hash.clone();

        self.cache
            .update(move |state| insert_credential(state, entry, claims))
            .await?;

        Ok(hash)
    }

    pub async fn get_credential(&self, hash: &str) -> Option<CredentialEntry> {
        self.cache
            .read(|state| state.credentials.get(hash).cloned())
            .await
    }

    /// Remove a credential and its claims. Returns whether it existed.
    pub async fn delete_credential(&self, hash: &str) -> Result<bool, StoreError> {
        self.cache
            .update(|state| {
                let existed = state.credentials.remove(hash).is_some();
                state.claims.retain(|_, claim| claim.credential_hash != hash);
                existed
            })
            .await
    }

    pub async fn list_credentials(&self) -> Vec<CredentialEntry> {
        self.cache
            .read(|state| state.credentials.values().cloned().collect())
            .await
    }

    /// Store a presentation and the credentials embedded in it.
    /// Returns the presentation hash.
    pub async fn save_presentation(&self, presentation: Value) -> Result<String, StoreError> {
        let (canonical_presentation, hash) = canonical_hash(&presentation)?;

        let holder = string_or_id(presentation.get("holder"))
            .ok_or_else(|| StoreError::InvalidRecord("presentation has no holder".to_owned()))?;

        let embedded = match presentation.get("verifiableCredential") {
            Some(Value::Array(credentials)) => credentials.clone(),
            Some(credential @ Value::Object(_)) => vec![credential.clone()],
            // Compact (JWT) credentials are kept inside the parsed presentation only
            _ => vec![],
        };

        let mut credentials = Vec::with_capacity(embedded.len());
        for credential in embedded.into_iter().filter(Value::is_object) {
            credentials.push(credential_entry(credential)?);
        }

        let entry = PresentationEntry {
            hash: hash.clone(),
            holder,
            verifier: string_list(presentation.get("verifier")),
            id: presentation.get("id").and_then(Value::as_str).map(str::to_owned),
            issuance_date: first_str(&presentation, &["issuanceDate", "validFrom"]),
            expiration_date: first_str(&presentation, &["expirationDate", "validUntil"]),
            context: string_list(presentation.get("@context")),
            presentation_type: string_list(presentation.get("type")),
            credentials: credentials.iter().map(|(vc, _)| vc.hash.clone()).collect(),
            parsed_presentation: presentation,
            canonical_presentation,
        };

        self.cache
            .update(move |state| {
                for (credential, claims) in credentials {
                    insert_credential(state, credential, claims);
                }
                state.presentations.insert(entry.hash.clone(), entry);
            })
            .await?;

        Ok(hash)
    }

    pub async fn get_presentation(&self, hash: &str) -> Option<PresentationEntry> {
        self.cache
            .read(|state| state.presentations.get(hash).cloned())
            .await
    }

    pub async fn save_message(&self, message: Message) -> Result<String, StoreError> {
        let id = message.id.clone();

        self.cache
            .update(move |state| {
                state.messages.insert(message.id.clone(), message);
            })
            .await?;

        Ok(id)
    }

    pub async fn get_message(&self, id: &str) -> Option<Message> {
        self.cache
            .read(|state| state.messages.get(id).cloned())
            .await
    }

    pub async fn list_messages(&self) -> Vec<Message> {
        self.cache
            .read(|state| state.messages.values().cloned().collect())
            .await
    }
}

fn insert_credential(state: &mut IdentityState, entry: CredentialEntry, claims: Vec<ClaimEntry>) {
    for claim in claims {
        state.claims.insert(claim.hash.clone(), claim);
    }
    state.credentials.insert(entry.hash.clone(), entry);
}

/// Canonical (JCS) form of a JSON value and its SHA-256 hex digest.
fn canonical_hash(value: &Value) -> Result<(String, String), StoreError> {
    let canonical =
        json_canon::to_string(value).map_err(|err| StoreError::InvalidRecord(err.to_string()))?;
    let hash = hex::encode(Sha256::digest(canonical.as_bytes()));

    Ok((canonical, hash))
}

fn credential_entry(credential: Value) -> Result<(CredentialEntry, Vec<ClaimEntry>), StoreError> {
    if !credential.is_object() {
        return Err(StoreError::InvalidRecord(
            "credential must be a JSON object".to_owned(),
        ));
    }

    let (canonical_credential, hash) = canonical_hash(&credential)?;

    let issuer = string_or_id(credential.get("issuer"))
        .ok_or_else(|| StoreError::InvalidRecord("credential has no issuer".to_owned()))?;

    let subjects: Vec<&Value> = match credential.get("credentialSubject") {
        Some(Value::Array(subjects)) => subjects.iter().collect(),
        Some(subject) => vec![subject],
        None => vec![],
    };

    let context = string_list(credential.get("@context"));
    let credential_type = string_list(credential.get("type"));
    let issuance_date = first_str(&credential, &["issuanceDate", "validFrom"]);
    let expiration_date = first_str(&credential, &["expirationDate", "validUntil"]);

    let mut claims = vec![];
    for subject in &subjects {
        let Some(properties) = subject.as_object() else {
            continue;
        };
        let subject_id = properties.get("id").and_then(Value::as_str);

        for (claim_type, value) in properties.iter().filter(|(name, _)| *name != "id") {
            let (_, claim_hash) = canonical_hash(&serde_json::json!({
                "credentialHash": hash,
                "subject": subject_id,
                "type": claim_type,
            }))?;

            claims.push(ClaimEntry {
                hash: claim_hash,
                issuer: issuer.clone(),
                subject: subject_id.map(str::to_owned),
                credential_hash: hash.clone(),
                issuance_date: issuance_date.clone(),
                expiration_date: expiration_date.clone(),
                context: context.clone(),
                credential_type: credential_type.clone(),
                claim_type: claim_type.clone(),
                value: value.clone(),
                is_obj: value.is_object(),
            });
        }
    }

    let subject = subjects
        .first()
        .and_then(|subject| subject.get("id"))
        .and_then(Value::as_str)
        .map(str::to_owned);

    let entry = CredentialEntry {
        hash,
        issuer,
        subject,
        id: credential.get("id").and_then(Value::as_str).map(str::to_owned),
        issuance_date,
        expiration_date,
        context,
        credential_type,
        parsed_credential: credential,
        canonical_credential,
    };

    Ok((entry, claims))
}

/// Accepts either a plain string or an object carrying an `id`.
fn string_or_id(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Object(object) => object.get("id").and_then(Value::as_str).map(str::to_owned),
        _ => None,
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_owned)
            .collect(),
        _ => vec![],
    }
}

fn first_str(value: &Value, fields: &[&str]) -> Option<String> {
    fields
        .iter()
        .find_map(|field| value.get(*field).and_then(Value::as_str))
        .map(str::to_owned)
}
