//! Secret provider
//!
//! Resolves secrets either from the secure secret store (through a
//! pluggable [`SecretClient`]) or, when security is disabled via
//! `EDGEX_SECURITY_SECRET_STORE=false`, from the insecure secrets held
//! in the writable configuration. Secure lookups are cached per path;
//! the cache is guarded by a single mutex and cleared whenever secrets
//! are stored, since a store may invalidate previous values.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use crate::config::{environment, ServiceConfig, StoreInfo};
use crate::error::{EdgeflowError, Result};

/// Username/password pair for the backing store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Client for a secure secret store
#[async_trait]
pub trait SecretClient: Send + Sync {
    /// Fetch secrets under `path`; empty `keys` means all of them.
    async fn get_secrets(&self, path: &str, keys: &[&str]) -> Result<HashMap<String, String>>;

    /// Store `secrets` under `path`.
    async fn store_secrets(&self, path: &str, secrets: HashMap<String, String>) -> Result<()>;
}

/// Cached secret resolution for pipeline functions and the bootstrap
pub struct SecretProvider {
    secret_client: Option<Arc<dyn SecretClient>>,
    secrets_cache: Mutex<HashMap<String, HashMap<String, String>>>,
    config: Arc<RwLock<ServiceConfig>>,
    security_enabled: bool,
}

impl SecretProvider {
    /// Create a provider over the shared configuration.
    ///
    /// The security toggle is read from the environment once, here.
    pub fn new(config: Arc<RwLock<ServiceConfig>>) -> Self {
        Self {
            secret_client: None,
            secrets_cache: Mutex::new(HashMap::new()),
            config,
            security_enabled: environment::security_enabled(),
        }
    }

    /// Attach the secure secret client.
    pub fn with_client(mut self, client: Arc<dyn SecretClient>) -> Self {
        self.secret_client = Some(client);
        self
    }

    /// Whether the secure secret store is in use.
    pub fn security_enabled(&self) -> bool {
        self.security_enabled
    }

    /// Retrieve secrets under `path`. Empty `keys` returns everything at
    /// the path. Secure lookups consult the cache first and refresh it on
    /// a miss.
    pub async fn get_secrets(&self, path: &str, keys: &[&str]) -> Result<HashMap<String, String>> {
        if !self.security_enabled {
            return self.get_insecure_secrets(path, keys);
        }

        if let Some(cached) = self.cache_lookup(path, keys) {
            return Ok(cached);
        }

        let client = self.secret_client.as_ref().ok_or_else(|| {
            EdgeflowError::Secrets("secret provider is not initialized".to_string())
        })?;

        let secrets = client.get_secrets(path, keys).await?;
        self.update_cache(path, &secrets);
        Ok(secrets)
    }

    /// Store secrets under `path`. Only available in secure mode; the
    /// cache is cleared because new values may invalidate earlier reads.
    pub async fn store_secrets(
        &self,
        path: &str,
        secrets: HashMap<String, String>,
    ) -> Result<()> {
        if !self.security_enabled {
            return Err(EdgeflowError::Secrets(
                "storing secrets is not supported when running in insecure mode".to_string(),
            ));
        }

        let client = self.secret_client.as_ref().ok_or_else(|| {
            EdgeflowError::Secrets("secret provider is not initialized".to_string())
        })?;

        client.store_secrets(path, secrets).await?;
        self.secrets_cache.lock().clear();
        Ok(())
    }

    /// Credentials for the backing store: the secure store in secure
    /// mode, the insecure configuration values otherwise.
    pub async fn get_store_credentials(&self, store: &StoreInfo) -> Result<Credentials> {
        if !self.security_enabled {
            return Ok(Credentials {
                username: store.username.clone(),
                password: store.password.clone(),
            });
        }

        let secrets = self
            .get_secrets(&store.store_type, &["username", "password"])
            .await?;
        Ok(Credentials {
            username: secrets.get("username").cloned().unwrap_or_default(),
            password: secrets.get("password").cloned().unwrap_or_default(),
        })
    }

    /// A cache hit requires every requested key under the path; any miss
    /// (or an all-keys request) falls through to the secret client.
    fn cache_lookup(&self, path: &str, keys: &[&str]) -> Option<HashMap<String, String>> {
        if keys.is_empty() {
            return None;
        }

        let cache = self.secrets_cache.lock();
        let cached = cache.get(path)?;

        let mut secrets = HashMap::new();
        for key in keys {
            secrets.insert((*key).to_string(), cached.get(*key)?.clone());
        }
        Some(secrets)
    }

    fn update_cache(&self, path: &str, secrets: &HashMap<String, String>) {
        let mut cache = self.secrets_cache.lock();
        cache
            .entry(path.to_string())
            .or_default()
            .extend(secrets.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    fn get_insecure_secrets(&self, path: &str, keys: &[&str]) -> Result<HashMap<String, String>> {
        let config = self.config.read();
        let mut secrets = HashMap::new();
        let mut path_exists = false;
        let mut missing: Vec<&str> = Vec::new();

        for insecure in config.writable.insecure_secrets.values() {
            if insecure.path != path {
                continue;
            }

            if keys.is_empty() {
                return Ok(insecure.secrets.clone());
            }

            path_exists = true;
            for key in keys {
                match insecure.secrets.get(*key) {
                    Some(value) => {
                        secrets.insert((*key).to_string(), value.clone());
                    }
                    None => missing.push(key),
                }
            }
        }

        if !missing.is_empty() {
            return Err(EdgeflowError::Secrets(format!(
                "no value for the keys [{}] exists",
                missing.join(",")
            )));
        }
        if !path_exists {
            return Err(EdgeflowError::Secrets(format!(
                "path '{path}' does not exist in the secret store"
            )));
        }

        Ok(secrets)
    }
}
