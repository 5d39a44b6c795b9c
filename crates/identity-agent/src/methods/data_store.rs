use agent_api::{MethodRouter, MethodSchema};
use data_store::Message;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::{AgentContext, Error};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveCredentialArgs {
    verifiable_credential: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SavePresentationArgs {
    verifiable_presentation: Value,
}

#[derive(Deserialize)]
struct HashArgs {
    hash: String,
}

#[derive(Deserialize)]
struct SaveMessageArgs {
    message: Map<String, Value>,
}

#[derive(Deserialize)]
struct IdArgs {
    id: String,
}

pub(crate) fn routes() -> MethodRouter<AgentContext> {
    let hash = json!({ "type": "string" });

    MethodRouter::new()
        .route(
            "dataStoreSaveVerifiableCredential",
            MethodSchema::new(
                "Saves verifiable credential to the data store",
                json!({
                    "type": "object",
                    "required": ["verifiableCredential"],
                    "properties": {
                        "verifiableCredential": {
                            "type": "object",
                            "required": ["issuer", "credentialSubject"],
                            "properties": {
                                "issuer": { "type": ["string", "object"] },
                                "credentialSubject": { "type": ["object", "array"] }
                            }
                        }
                    }
                }),
                hash.clone(),
            ),
            save_credential,
        )
        .route(
            "dataStoreGetVerifiableCredential",
            MethodSchema::new(
                "Gets verifiable credential from the data store",
                hash_arguments(),
                json!({ "type": "object" }),
            ),
            get_credential,
        )
        .route(
            "dataStoreDeleteVerifiableCredential",
            MethodSchema::new(
                "Deletes verifiable credential and its claims from the data store",
                hash_arguments(),
                json!({ "type": "boolean" }),
            ),
            delete_credential,
        )
        .route(
            "dataStoreSaveVerifiablePresentation",
            MethodSchema::new(
                "Saves verifiable presentation to the data store",
                json!({
                    "type": "object",
                    "required": ["verifiablePresentation"],
                    "properties": {
                        "verifiablePresentation": {
                            "type": "object",
                            "required": ["holder"],
                            "properties": {
                                "holder": { "type": ["string", "object"] },
                                "verifier": { "type": ["string", "array"] }
                            }
                        }
                    }
                }),
                hash,
            ),
            save_presentation,
        )
        .route(
            "dataStoreGetVerifiablePresentation",
            MethodSchema::new(
                "Gets verifiable presentation from the data store",
                hash_arguments(),
                json!({ "type": "object" }),
            ),
            get_presentation,
        )
        .route(
            "dataStoreSaveMessage",
            MethodSchema::new(
                "Saves message to the data store",
                json!({
                    "type": "object",
                    "required": ["message"],
                    "properties": {
                        "message": {
                            "type": "object",
                            "required": ["type"],
                            "properties": {
                                "id": { "type": "string" },
                                "type": { "type": "string" },
                                "createdAt": { "type": "string" },
                                "expiresAt": { "type": "string" },
                                "threadId": { "type": "string" },
                                "raw": { "type": "string" },
                                "replyTo": { "type": "array", "items": { "type": "string" } },
                                "replyUrl": { "type": "string" },
                                "from": { "type": "string" },
                                "to": { "type": "string" },
                                "metaData": { "type": ["object", "array"] },
                                "presentations": { "type": "array" },
                                "credentials": { "type": "array" }
                            }
                        }
                    }
                }),
                json!({ "type": "string" }),
            ),
            save_message,
        )
        .route(
            "dataStoreGetMessage",
            MethodSchema::new(
                "Gets message from the data store",
                json!({
                    "type": "object",
                    "required": ["id"],
                    "properties": { "id": { "type": "string" } }
                }),
                json!({ "type": "object" }),
            ),
            get_message,
        )
}

fn hash_arguments() -> Value {
    json!({
        "type": "object",
        "required": ["hash"],
        "properties": { "hash": { "type": "string" } }
    })
}

async fn save_credential(ctx: Arc<AgentContext>, args: SaveCredentialArgs) -> Result<String, Error> {
    Ok(ctx.data.save_credential(args.verifiable_credential).await?)
}

async fn get_credential(ctx: Arc<AgentContext>, args: HashArgs) -> Result<Value, Error> {
    ctx.data
        .get_credential(&args.hash)
        .await
        .map(|entry| entry.parsed_credential)
        .ok_or_else(|| Error::NotFound(format!("Verifiable credential not found: {}", args.hash)))
}

async fn delete_credential(ctx: Arc<AgentContext>, args: HashArgs) -> Result<bool, Error> {
    Ok(ctx.data.delete_credential(&args.hash).await?)
}

async fn save_presentation(
    ctx: Arc<AgentContext>,
    args: SavePresentationArgs,
) -> Result<String, Error> {
    Ok(ctx
        .data
        .save_presentation(args.verifiable_presentation)
        .await?)
}

async fn get_presentation(ctx: Arc<AgentContext>, args: HashArgs) -> Result<Value, Error> {
    ctx.data
        .get_presentation(&args.hash)
        .await
        .map(|entry| entry.parsed_presentation)
        .ok_or_else(|| {
            Error::NotFound(format!("Verifiable presentation not found: {}", args.hash))
        })
}

/// Messages without an id get a random one.
async fn save_message(ctx: Arc<AgentContext>, args: SaveMessageArgs) -> Result<String, Error> {
    let mut message = args.message;
    message
        .entry("id")
        .or_insert_with(|| json!(Uuid::new_v4().to_string()));

    let message: Message = serde_json::from_value(Value::Object(message))
        .map_err(|err| Error::InvalidArgument(format!("invalid message: {err}")))?;

    Ok(ctx.data.save_message(message).await?)
}

async fn get_message(ctx: Arc<AgentContext>, args: IdArgs) -> Result<Message, Error> {
    ctx.data
        .get_message(&args.id)
        .await
        .ok_or_else(|| Error::NotFound(format!("Message not found: {}", args.id)))
}
