use agent_api::{MethodRouter, MethodSchema};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use data_store::{KeyType, ManagedKeyInfo};
use keystore::LocalKms;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{AgentContext, Error};

#[derive(Deserialize)]
struct CreateArgs {
    #[serde(rename = "type")]
    key_type: KeyType,
    kms: String,
    meta: Option<Value>,
}

#[derive(Deserialize)]
struct KidArgs {
    kid: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignArgs {
    key_ref: String,
    data: String,
    algorithm: Option<String>,
    encoding: Option<String>,
}

pub(crate) fn routes() -> MethodRouter<AgentContext> {
    let key = json!({
        "type": "object",
        "required": ["kid", "kms", "type", "publicKeyHex"],
        "properties": {
            "kid": { "type": "string" },
            "kms": { "type": "string" },
            "type": { "type": "string" },
            "publicKeyHex": { "type": "string" },
            "meta": { "type": "object" }
        }
    });

    MethodRouter::new()
        .route(
            "keyManagerGetKeyManagementSystems",
            MethodSchema::new(
                "Lists available key management systems",
                json!({ "type": "object" }),
                json!({ "type": "array", "items": { "type": "string" } }),
            ),
            get_key_management_systems,
        )
        .route(
            "keyManagerCreate",
            MethodSchema::new(
                "Generates a key pair",
                json!({
                    "type": "object",
                    "required": ["type", "kms"],
                    "properties": {
                        "type": {
                            "type": "string",
                            "enum": ["Ed25519", "Secp256k1", "Secp256r1", "X25519", "Bls12381G1", "Bls12381G2"]
                        },
                        "kms": { "type": "string" },
                        "meta": { "type": "object" }
                    }
                }),
                key.clone(),
            ),
            create,
        )
        .route(
            "keyManagerGet",
            MethodSchema::new("Returns an existing key", kid_arguments(), key),
            get,
        )
        .route(
            "keyManagerDelete",
            MethodSchema::new(
                "Deletes a key",
                kid_arguments(),
                json!({ "type": "boolean" }),
            ),
            delete,
        )
        .route(
            "keyManagerSign",
            MethodSchema::new(
                "Generates a signature according to the algorithm specified",
                json!({
                    "type": "object",
                    "required": ["keyRef", "data"],
                    "properties": {
                        "keyRef": { "type": "string" },
                        "data": { "type": "string" },
                        "algorithm": { "type": "string" },
                        "encoding": { "type": "string", "enum": ["utf-8", "hex", "base16"] }
                    }
                }),
                json!({ "type": "string" }),
            ),
            sign,
        )
}

fn kid_arguments() -> Value {
    json!({
        "type": "object",
        "required": ["kid"],
        "properties": { "kid": { "type": "string" } }
    })
}

async fn get_key_management_systems(_: Arc<AgentContext>, _: Value) -> Result<Vec<String>, Error> {
    Ok(vec![LocalKms::NAME.to_owned()])
}

async fn create(ctx: Arc<AgentContext>, args: CreateArgs) -> Result<ManagedKeyInfo, Error> {
    ctx.check_kms(Some(args.kms.as_str()))?;

    let mut key = ctx.kms.create_key(args.key_type).await?;
    if let (Some(Value::Object(extra)), Some(Value::Object(meta))) = (args.meta, key.meta.as_mut()) {
        meta.extend(extra);
    }
    ctx.keys.import(key.clone()).await?;

    Ok(key)
}

async fn get(ctx: Arc<AgentContext>, args: KidArgs) -> Result<ManagedKeyInfo, Error> {
    ctx.keys
        .get(&args.kid)
        .await
        .ok_or_else(|| Error::NotFound(format!("Key not found: {}", args.kid)))
}

async fn delete(ctx: Arc<AgentContext>, args: KidArgs) -> Result<bool, Error> {
    if ctx.keys.get(&args.kid).await.is_none() {
        return Err(Error::NotFound(format!("Key not found: {}", args.kid)));
    }

    ctx.kms.delete_key(&args.kid).await?;
    Ok(ctx.keys.delete(&args.kid).await?)
}

/// Signature is returned base64url encoded without padding.
async fn sign(ctx: Arc<AgentContext>, args: SignArgs) -> Result<String, Error> {
    if ctx.keys.get(&args.key_ref).await.is_none() {
        return Err(Error::NotFound(format!("Key not found: {}", args.key_ref)));
    }

    let data = match args.encoding.as_deref() {
        None | Some("utf-8") => args.data.into_bytes(),
        Some("hex") | Some("base16") => hex::decode(args.data.trim_start_matches("0x"))
            .map_err(|err| Error::InvalidArgument(format!("data is not valid hex: {err}")))?,
        Some(other) => {
            return Err(Error::InvalidArgument(format!("unsupported encoding {other}")))
        }
    };

    let signature = ctx
        .kms
        .sign(&args.key_ref, &data, args.algorithm.as_deref())
        .await?;

    Ok(URL_SAFE_NO_PAD.encode(signature))
}
