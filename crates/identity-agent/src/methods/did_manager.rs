use agent_api::{MethodRouter, MethodSchema};
use data_store::{Identifier, IdentifierFilter, Service};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::{AgentContext, Error};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FindArgs {
    alias: Option<String>,
    provider: Option<String>,
}

#[derive(Deserialize)]
struct DidArgs {
    did: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetByAliasArgs {
    alias: String,
    provider: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateArgs {
    alias: Option<String>,
    provider: Option<String>,
    kms: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetOrCreateArgs {
    alias: String,
    provider: Option<String>,
    kms: Option<String>,
}

#[derive(Deserialize)]
struct AddServiceArgs {
    did: String,
    service: Service,
}

#[derive(Deserialize)]
struct RemoveServiceArgs {
    did: String,
    id: String,
}

pub(crate) fn routes() -> MethodRouter<AgentContext> {
    let identifier = identifier_schema();

    MethodRouter::new()
        .route(
            "didManagerGetProviders",
            MethodSchema::new(
                "Returns a list of available identifier providers",
                json!({ "type": "object" }),
                json!({ "type": "array", "items": { "type": "string" } }),
            ),
            get_providers,
        )
        .route(
            "didManagerFind",
            MethodSchema::new(
                "Returns a list of managed identifiers",
                json!({
                    "type": "object",
                    "properties": {
                        "alias": { "type": "string" },
                        "provider": { "type": "string" }
                    }
                }),
                json!({ "type": "array", "items": identifier }),
            ),
            find,
        )
        .route(
            "didManagerGet",
            MethodSchema::new(
                "Returns a managed identifier",
                did_arguments(),
                identifier.clone(),
            ),
            get,
        )
        .route(
            "didManagerGetByAlias",
            MethodSchema::new(
                "Returns a managed identifier by alias",
                json!({
                    "type": "object",
                    "required": ["alias"],
                    "properties": {
                        "alias": { "type": "string" },
                        "provider": { "type": "string" }
                    }
                }),
                identifier.clone(),
            ),
            get_by_alias,
        )
        .route(
            "didManagerCreate",
            MethodSchema::new(
                "Creates and returns a new identifier",
                json!({
                    "type": "object",
                    "properties": {
                        "alias": { "type": "string" },
                        "provider": { "type": "string" },
                        "kms": { "type": "string" },
                        "options": { "type": "object" }
                    }
                }),
                identifier.clone(),
            ),
            create,
        )
        .route(
            "didManagerGetOrCreate",
            MethodSchema::new(
                "Returns an existing identifier or creates a new one for a specific alias",
                json!({
                    "type": "object",
                    "required": ["alias"],
                    "properties": {
                        "alias": { "type": "string" },
                        "provider": { "type": "string" },
                        "kms": { "type": "string" },
                        "options": { "type": "object" }
                    }
                }),
                identifier.clone(),
            ),
            get_or_create,
        )
        .route(
            "didManagerDelete",
            MethodSchema::new(
                "Deletes an identifier and its keys",
                did_arguments(),
                json!({ "type": "boolean" }),
            ),
            delete,
        )
        .route(
            "didManagerAddService",
            MethodSchema::new(
                "Adds a service to a managed identifier",
                json!({
                    "type": "object",
                    "required": ["did", "service"],
                    "properties": {
                        "did": { "type": "string" },
                        "service": {
                            "type": "object",
                            "required": ["id", "type", "serviceEndpoint"],
                            "properties": {
                                "id": { "type": "string" },
                                "type": { "type": "string" },
                                "serviceEndpoint": { "type": ["string", "object", "array"] },
                                "description": { "type": "string" }
                            }
                        }
                    }
                }),
                identifier.clone(),
            ),
            add_service,
        )
        .route(
            "didManagerRemoveService",
            MethodSchema::new(
                "Removes a service from a managed identifier",
                json!({
                    "type": "object",
                    "required": ["did", "id"],
                    "properties": {
                        "did": { "type": "string" },
                        "id": { "type": "string" }
                    }
                }),
                identifier,
            ),
            remove_service,
        )
}

fn identifier_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "required": ["did", "provider", "keys", "services"],
        "properties": {
            "did": { "type": "string" },
            "alias": { "type": "string" },
            "provider": { "type": "string" },
            "controllerKeyId": { "type": "string" },
            "keys": { "type": "array", "items": { "type": "object" } },
            "services": { "type": "array", "items": { "type": "object" } }
        }
    })
}

fn did_arguments() -> serde_json::Value {
    json!({
        "type": "object",
        "required": ["did"],
        "properties": { "did": { "type": "string" } }
    })
}

async fn get_providers(ctx: Arc<AgentContext>, _: serde_json::Value) -> Result<Vec<String>, Error> {
    Ok(ctx.provider_names())
}

async fn find(ctx: Arc<AgentContext>, args: FindArgs) -> Result<Vec<Identifier>, Error> {
    let filter = IdentifierFilter {
        alias: args.alias,
        provider: args.provider,
    };

    Ok(ctx.dids.list(&filter).await)
}

async fn get(ctx: Arc<AgentContext>, args: DidArgs) -> Result<Identifier, Error> {
    lookup(&ctx, &args.did).await
}

async fn get_by_alias(ctx: Arc<AgentContext>, args: GetByAliasArgs) -> Result<Identifier, Error> {
    let provider = args
        .provider
        .unwrap_or_else(|| ctx.default_provider().to_owned());

    ctx.dids
        .get_by_alias(&args.alias, Some(provider.as_str()))
        .await
        .ok_or_else(|| {
            Error::NotFound(format!(
                "Identifier not found with alias: {} provider: {provider}",
                args.alias
            ))
        })
}

async fn create(ctx: Arc<AgentContext>, args: CreateArgs) -> Result<Identifier, Error> {
    create_identifier(&ctx, args.alias, args.provider, args.kms.as_deref()).await
}

async fn get_or_create(ctx: Arc<AgentContext>, args: GetOrCreateArgs) -> Result<Identifier, Error> {
    let provider = args
        .provider
        .unwrap_or_else(|| ctx.default_provider().to_owned());

    match ctx.dids.get_by_alias(&args.alias, Some(provider.as_str())).await {
        Some(identifier) => Ok(identifier),
        None => {
            create_identifier(&ctx, Some(args.alias), Some(provider), args.kms.as_deref()).await
        }
    }
}

async fn delete(ctx: Arc<AgentContext>, args: DidArgs) -> Result<bool, Error> {
    let identifier = lookup(&ctx, &args.did).await?;

    Ok(ctx.dids.delete(&identifier.did).await?)
}

async fn add_service(ctx: Arc<AgentContext>, args: AddServiceArgs) -> Result<Identifier, Error> {
    let mut identifier = lookup(&ctx, &args.did).await?;

    identifier.services.retain(|service| service.id != args.service.id);
    identifier.services.push(args.service);
    ctx.dids.import(identifier.clone()).await?;

    Ok(identifier)
}

async fn remove_service(
    ctx: Arc<AgentContext>,
    args: RemoveServiceArgs,
) -> Result<Identifier, Error> {
    let mut identifier = lookup(&ctx, &args.did).await?;

    identifier.services.retain(|service| service.id != args.id);
    ctx.dids.import(identifier.clone()).await?;

    Ok(identifier)
}

async fn lookup(ctx: &AgentContext, did: &str) -> Result<Identifier, Error> {
    ctx.dids
        .get(did)
        .await
        .ok_or_else(|| Error::NotFound(format!("Identifier not found: {did}")))
}

async fn create_identifier(
    ctx: &AgentContext,
    alias: Option<String>,
    provider: Option<String>,
    kms: Option<&str>,
) -> Result<Identifier, Error> {
    ctx.check_kms(kms)?;
    let provider = ctx.provider(provider.as_deref())?;

    if let Some(alias) = &alias {
        if ctx.dids.get_by_alias(alias, Some(provider.name())).await.is_some() {
            return Err(Error::InvalidArgument(format!(
                "Identifier with alias: {alias}, provider: {} already exists",
                provider.name()
            )));
        }
    }

    let identifier = provider.create_identifier(&ctx.kms, alias.as_deref()).await?;
    ctx.dids.import(identifier.clone()).await?;

    tracing::info!("created identifier {} with {}", identifier.did, provider.name());
    Ok(identifier)
}
