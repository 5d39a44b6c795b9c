//! DID documents of locally held identifiers.

use data_store::{Identifier, Key, KeyType};
use serde_json::{json, Map, Value};

pub const DID_CONTEXT: &str = "https://www.w3.org/ns/did/v1";

/// Verification method type used for keys of `key_type`.
pub fn verification_method_type(key_type: KeyType) -> &'static str {
    match key_type {
        KeyType::Secp256k1 => "EcdsaSecp256k1VerificationKey2019",
        KeyType::Secp256r1 => "EcdsaSecp256r1VerificationKey2019",
        KeyType::Ed25519 => "Ed25519VerificationKey2018",
        KeyType::X25519 => "X25519KeyAgreementKey2019",
        KeyType::Bls12381G1 => "Bls12381G1Key2020",
        KeyType::Bls12381G2 => "Bls12381G2Key2020",
    }
}

fn suite_contexts(key_type: KeyType) -> &'static [&'static str] {
    match key_type {
        KeyType::Secp256k1 => &[
            "https://w3id.org/security/v2",
            "https://w3id.org/security/suites/secp256k1recovery-2020/v2",
        ],
        KeyType::Secp256r1 => &["https://w3id.org/security/v2"],
        KeyType::Ed25519 => &["https://w3id.org/security/suites/ed25519-2018/v1"],
        KeyType::X25519 => &["https://w3id.org/security/suites/x25519-2019/v1"],
        KeyType::Bls12381G1 | KeyType::Bls12381G2 => &["https://w3id.org/security/bbs/v1"],
    }
}

/// Build the DID document of `identifier`.
///
/// `extra_services` come first in the `service` list, followed by the
/// identifier's own services. Ed25519 and X25519 keys are published in
/// base58, every other key type in hex.
pub fn did_document(identifier: &Identifier, extra_services: &[Value]) -> Value {
    did_document_for_keys(
        &identifier.did,
        &identifier.keys,
        extra_services
            .iter()
            .cloned()
            .chain(identifier.services.iter().map(|service| json!(service)))
            .collect(),
    )
}

pub(crate) fn did_document_for_keys(did: &str, keys: &[Key], services: Vec<Value>) -> Value {
    let mut contexts = vec![DID_CONTEXT];
    let mut methods = Vec::with_capacity(keys.len());
    let mut key_agreement = vec![];
    let mut signing = vec![];

    for key in keys {
        for &context in suite_contexts(key.key_type) {
            if !contexts.contains(&context) {
                contexts.push(context);
            }
        }

        let id = format!("{did}#{}", key.kid);
        let mut method = Map::new();
        method.insert("id".to_owned(), json!(id));
        method.insert(
            "type".to_owned(),
            json!(verification_method_type(key.key_type)),
        );
        method.insert("controller".to_owned(), json!(did));

        match (key.key_type, hex::decode(&key.public_key_hex)) {
            (KeyType::Ed25519 | KeyType::X25519, Ok(bytes)) => {
                method.insert(
                    "publicKeyBase58".to_owned(),
                    json!(bs58::encode(bytes).into_string()),
                );
            }
            _ => {
                method.insert("publicKeyHex".to_owned(), json!(key.public_key_hex));
            }
        }

        if matches!(key.key_type, KeyType::Ed25519 | KeyType::X25519) {
            key_agreement.push(id.clone());
        }
        if key.key_type != KeyType::X25519 {
            signing.push(id);
        }

        methods.push(Value::Object(method));
    }

    json!({
        "@context": contexts,
        "id": did,
        "verificationMethod": methods,
        "authentication": signing,
        "assertionMethod": signing,
        "keyAgreement": key_agreement,
        "service": services,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_store::Service;

    fn key(kid: &str, key_type: KeyType, public_key_hex: &str) -> Key {
        Key {
            kid: kid.to_owned(),
            kms: "local".to_owned(),
            key_type,
            public_key_hex: public_key_hex.to_owned(),
            meta: None,
        }
    }

    #[test]
    fn maps_keys_to_verification_relationships() {
        let identifier = Identifier {
            did: "did:web:example.com".to_owned(),
            alias: Some("example.com".to_owned()),
            provider: "did:web".to_owned(),
            controller_key_id: Some("ed".to_owned()),
            keys: vec![
                key("ed", KeyType::Ed25519, "0102"),
                key("x", KeyType::X25519, "0304"),
                key("k1", KeyType::Secp256k1, "02aa"),
            ],
            services: vec![Service {
                id: "did:web:example.com#messaging".to_owned(),
                service_type: "DIDCommMessaging".to_owned(),
                service_endpoint: json!("https://example.com/didcomm"),
                description: None,
            }],
        };
        let extra = json!({ "id": "#extra", "type": "LinkedDomains", "serviceEndpoint": "https://example.com" });

        let document = did_document(&identifier, &[extra]);

        assert_eq!(
            document["@context"],
            json!([
                DID_CONTEXT,
                "https://w3id.org/security/suites/ed25519-2018/v1",
                "https://w3id.org/security/suites/x25519-2019/v1",
                "https://w3id.org/security/v2",
                "https://w3id.org/security/suites/secp256k1recovery-2020/v2"
            ])
        );

        let methods = document["verificationMethod"].as_array().unwrap();
        assert_eq!(methods[0]["type"], "Ed25519VerificationKey2018");
        assert_eq!(methods[0]["publicKeyBase58"], bs58::encode([1u8, 2]).into_string());
        assert!(methods[0].get("publicKeyHex").is_none());
        assert_eq!(methods[1]["type"], "X25519KeyAgreementKey2019");
        assert_eq!(methods[2]["publicKeyHex"], "02aa");

        assert_eq!(
            document["authentication"],
            json!(["did:web:example.com#ed", "did:web:example.com#k1"])
        );
        assert_eq!(document["assertionMethod"], document["authentication"]);
        assert_eq!(
            document["keyAgreement"],
            json!(["did:web:example.com#ed", "did:web:example.com#x"])
        );

        let services = document["service"].as_array().unwrap();
        assert_eq!(services[0]["id"], "#extra");
        assert_eq!(services[1]["type"], "DIDCommMessaging");
    }
}
