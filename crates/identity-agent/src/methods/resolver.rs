use agent_api::{MethodRouter, MethodSchema};
use data_store::{Key, KeyType};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
    document::{did_document, did_document_for_keys},
    providers::did_key_public_key,
    AgentContext, Error,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResolveArgs {
    did_url: String,
}

pub(crate) fn routes() -> MethodRouter<AgentContext> {
    MethodRouter::new().route(
        "resolveDid",
        MethodSchema::new(
            "Resolves a DID document",
            json!({
                "type": "object",
                "required": ["didUrl"],
                "properties": {
                    "didUrl": { "type": "string" },
                    "options": { "type": "object" }
                }
            }),
            json!({
                "type": "object",
                "properties": {
                    "didResolutionMetadata": { "type": "object" },
                    "didDocument": { "type": ["object", "null"] },
                    "didDocumentMetadata": { "type": "object" }
                }
            }),
        ),
        resolve,
    )
}

/// Resolution failures are reported in `didResolutionMetadata.error`
/// rather than as method errors.
async fn resolve(ctx: Arc<AgentContext>, args: ResolveArgs) -> Result<Value, Error> {
    let did = did_from_url(&args.did_url);

    let Some(method) = did_method(did) else {
        return Ok(failure("invalidDid"));
    };

    if method == "key" {
        return Ok(match did_key_public_key(did) {
            Some(public_key) => success(did_key_document(did, &public_key)),
            None => failure("invalidDid"),
        });
    }

    match ctx.dids.get(did).await {
        Some(identifier) => Ok(success(did_document(&identifier, &[]))),
        None if method == "web" => Ok(failure("notFound")),
        None => Ok(failure("unsupportedDidMethod")),
    }
}

/// Strip path, query and fragment from a DID URL.
fn did_from_url(did_url: &str) -> &str {
    did_url
        .find(|c| matches!(c, '/' | '?' | '#'))
        .map_or(did_url, |end| &did_url[..end])
}

fn did_method(did: &str) -> Option<&str> {
    let mut parts = did.splitn(3, ':');

    match (parts.next(), parts.next(), parts.next()) {
        (Some("did"), Some(method), Some(id)) if !method.is_empty() && !id.is_empty() => {
            Some(method)
        }
        _ => None,
    }
}

fn did_key_document(did: &str, public_key: &[u8]) -> Value {
    let fragment = did.trim_start_matches("did:key:");
    let key = Key {
        kid: fragment.to_owned(),
        kms: String::new(),
        key_type: KeyType::Ed25519,
        public_key_hex: hex::encode(public_key),
        meta: None,
    };

    did_document_for_keys(did, &[key], vec![])
}

fn success(document: Value) -> Value {
    json!({
        "didResolutionMetadata": { "contentType": "application/did+ld+json" },
        "didDocument": document,
        "didDocumentMetadata": {}
    })
}

fn failure(error: &str) -> Value {
    json!({
        "didResolutionMetadata": { "error": error },
        "didDocument": null,
        "didDocumentMetadata": {}
    })
}
