use std::{fmt, path::PathBuf};
use thiserror::Error;

/// Methods exposed when `EXPOSED_METHODS` is not set.
pub const DEFAULT_EXPOSED_METHODS: [&str; 4] =
    ["resolveDid", "didManagerGet", "didManagerFind", "keyManagerSign"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AppConfigError {
    #[error("{0} env variable required")]
    Missing(&'static str),
    #[error("invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Server settings, read once at startup.
#[derive(Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Bearer token guarding the agent methods
    pub api_key: String,
    /// Hex encoded 32-byte key sealing stored private keys
    pub kms_secret_key: String,
    /// Directory of the file-backed store; in-memory when unset
    pub storage_dirpath: Option<PathBuf>,
    pub exposed_methods: Vec<String>,
    pub default_did_provider: String,
    pub api_security_scheme: Option<String>,
    pub web_did_create_missing: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values count as unset
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let port = match var("SERVER_LOCAL_PORT") {
            Some(port) => port.trim().parse().map_err(|_| AppConfigError::Invalid {
                name: "SERVER_LOCAL_PORT",
                reason: format!("{port} is not a port number"),
            })?,
            None => 3000,
        };

        let api_key = var("API_KEY").ok_or(AppConfigError::Missing("API_KEY"))?;

        let kms_secret_key =
            var("KMS_SECRET_KEY").ok_or(AppConfigError::Missing("KMS_SECRET_KEY"))?;
        if kms_secret_key.len() != 64 || !kms_secret_key.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AppConfigError::Invalid {
                name: "KMS_SECRET_KEY",
                reason: "expected 64 hex characters".to_owned(),
            });
        }

        let exposed_methods = match var("EXPOSED_METHODS") {
            Some(methods) => methods
                .split(',')
                .map(str::trim)
                .filter(|method| !method.is_empty())
                .map(str::to_owned)
                .collect(),
            None => DEFAULT_EXPOSED_METHODS.map(str::to_owned).to_vec(),
        };

        let web_did_create_missing = match var("WEB_DID_CREATE_MISSING") {
            Some(flag) => flag.trim().parse().map_err(|_| AppConfigError::Invalid {
                name: "WEB_DID_CREATE_MISSING",
                reason: format!("{flag} is neither true nor false"),
            })?,
            None => true,
        };

        Ok(Self {
            port,
            api_key,
            kms_secret_key,
            storage_dirpath: var("STORAGE_DIRPATH").map(PathBuf::from),
            exposed_methods,
            default_did_provider: var("DEFAULT_DID_PROVIDER")
                .unwrap_or_else(|| "did:key".to_owned()),
            api_security_scheme: var("API_SECURITY_SCHEME"),
            web_did_create_missing,
        })
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("api_key", &"<redacted>")
            .field("kms_secret_key", &"<redacted>")
            .field("storage_dirpath", &self.storage_dirpath)
            .field("exposed_methods", &self.exposed_methods)
            .field("default_did_provider", &self.default_did_provider)
            .field("api_security_scheme", &self.api_security_scheme)
            .field("web_did_create_missing", &self.web_did_create_missing)
            .finish()
    }
}
