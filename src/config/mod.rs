//! Service configuration
//!
//! TOML configuration with sectioned defaults. The `[writable]` section
//! can change at runtime through the configuration listener; everything
//! else is fixed for the life of the process.
//!
//! ## Example configuration
//!
//! ```toml
//! [service]
//! host = "0.0.0.0"
//! port = 48095
//! boot_timeout_secs = 30
//! startup_msg = "edgeflow service started"
//!
//! [binding]
//! type = "http"
//!
//! [clients.core_data]
//! protocol = "http"
//! host = "localhost"
//! port = 48080
//!
//! [store]
//! type = "memory"
//!
//! [writable]
//! log_level = "info"
//!
//! [writable.store_and_forward]
//! enabled = false
//! retry_interval_secs = 60
//! max_retry_count = 10
//!
//! [writable.pipeline]
//! execution_order = "FilterByDeviceName, TransformToJson, HttpExport"
//!
//! [writable.pipeline.functions.HttpExport.parameters]
//! url = "http://export.example/events"
//! persist_on_error = "true"
//! ```

mod args;
pub mod environment;

pub use args::ServiceArgs;
pub use environment::apply_env_overrides;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{EdgeflowError, Result};

/// Default configuration directory
pub const DEFAULT_CONFIG_DIR: &str = "./res";
/// Configuration file name inside the configuration directory
pub const CONFIG_FILE_NAME: &str = "configuration.toml";

/// Root configuration for an edgeflow service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Fixed service identity and startup settings
    pub service: ServiceInfo,
    /// Trigger binding
    pub binding: BindingInfo,
    /// Downstream service clients
    pub clients: HashMap<String, ClientInfo>,
    /// Store-and-forward backing store
    pub store: StoreInfo,
    /// Secret store connection settings
    pub secret_store: SecretStoreInfo,
    /// Settings that may change at runtime
    pub writable: WritableConfig,
    /// Free-form settings for the application's own transforms
    pub application_settings: HashMap<String, String>,
}

/// Name of the core-data client entry in `[clients]`
pub const CORE_DATA_CLIENT: &str = "core_data";

/// Fixed service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceInfo {
    /// Host the web server binds to
    pub host: String,
    /// Port the web server binds to
    pub port: u16,
    /// Seconds the bootstrap retry loop keeps trying before giving up
    pub boot_timeout_secs: u64,
    /// Message logged once startup completes
    pub startup_msg: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 48095,
            boot_timeout_secs: 30,
            startup_msg: "edgeflow service started".to_string(),
        }
    }
}

/// Trigger binding selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingInfo {
    /// `"http"` or `"messagebus"`
    #[serde(rename = "type")]
    pub binding_type: String,
    /// Topic the message-bus trigger subscribes to
    pub subscribe_topic: String,
    /// Topic the message-bus trigger publishes pipeline output to
    pub publish_topic: String,
}

impl Default for BindingInfo {
    fn default() -> Self {
        Self {
            binding_type: "http".to_string(),
            subscribe_topic: "events".to_string(),
            publish_topic: "events-processed".to_string(),
        }
    }
}

/// One downstream client endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientInfo {
    pub protocol: String,
    pub host: String,
    pub port: u16,
}

impl ClientInfo {
    /// Base URL of this client.
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self {
            protocol: "http".to_string(),
            host: "localhost".to_string(),
            port: 48080,
        }
    }
}

/// Store-and-forward backing store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreInfo {
    /// `"memory"` or `"file"`
    #[serde(rename = "type")]
    pub store_type: String,
    /// File path for the file store
    pub path: PathBuf,
    /// Insecure credentials used when security is disabled
    pub username: String,
    /// Insecure credentials used when security is disabled
    pub password: String,
}

impl Default for StoreInfo {
    fn default() -> Self {
        Self {
            store_type: "memory".to_string(),
            path: PathBuf::from("./edgeflow-store.json"),
            username: String::new(),
            password: String::new(),
        }
    }
}

/// Secret store connection settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretStoreInfo {
    /// Base path prepended to secret lookups
    pub path: String,
    /// File holding the auth token for the secure client
    pub token_file: String,
}

/// Settings that may be replaced at runtime by the configuration listener
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WritableConfig {
    /// Log level filter (trace, debug, info, warn, error)
    pub log_level: String,
    /// Store-and-forward tuning
    pub store_and_forward: StoreAndForwardConfig,
    /// Configurable pipeline definition
    pub pipeline: PipelineConfig,
    /// Secrets used when security is disabled, keyed by name
    pub insecure_secrets: HashMap<String, InsecureSecrets>,
}

impl Default for WritableConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            store_and_forward: StoreAndForwardConfig::default(),
            pipeline: PipelineConfig::default(),
            insecure_secrets: HashMap::new(),
        }
    }
}

/// Store-and-forward tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreAndForwardConfig {
    /// Whether failed events are persisted and replayed
    pub enabled: bool,
    /// Seconds between retry rounds
    pub retry_interval_secs: u64,
    /// Retry budget per item; values below 1 are clamped to 1 on
    /// configuration change
    pub max_retry_count: i32,
}

impl Default for StoreAndForwardConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            retry_interval_secs: 60,
            max_retry_count: 10,
        }
    }
}

/// Configurable pipeline definition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Comma-separated ordered list of function names
    pub execution_order: String,
    /// Feed the first function raw bytes instead of a decoded event
    pub use_target_type_of_byte_array: bool,
    /// Per-function configuration, keyed by name
    pub functions: HashMap<String, FunctionConfig>,
}

/// Configuration for one named pipeline function
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionConfig {
    /// Constructor parameters
    pub parameters: HashMap<String, String>,
}

/// Insecure secrets for one path, used when security is disabled
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InsecureSecrets {
    /// The path these secrets answer for
    pub path: String,
    /// Key/value secret pairs
    pub secrets: HashMap<String, String>,
}

impl ServiceConfig {
    /// Load configuration from `confdir` (default `./res`), honoring the
    /// optional profile subdirectory, then apply environment overrides.
    pub fn load(profile: Option<&str>, confdir: Option<&Path>) -> Result<Self> {
        let dir = confdir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR));
        let path = match profile {
            Some(profile) if !profile.is_empty() => dir.join(profile).join(CONFIG_FILE_NAME),
            _ => dir.join(CONFIG_FILE_NAME),
        };

        let content = std::fs::read_to_string(&path).map_err(|e| {
            EdgeflowError::config(format!("failed to read {}: {e}", path.display()))
        })?;
        let mut config: ServiceConfig = toml::from_str(&content)
            .map_err(|e| EdgeflowError::config(format!("failed to parse {}: {e}", path.display())))?;

        apply_env_overrides(&mut config);
        Ok(config)
    }

    /// The core-data client entry, if configured.
    pub fn core_data_client(&self) -> Option<&ClientInfo> {
        self.clients.get(CORE_DATA_CLIENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.service.port, 48095);
        assert_eq!(config.binding.binding_type, "http");
        assert!(!config.writable.store_and_forward.enabled);
        assert_eq!(config.writable.store_and_forward.max_retry_count, 10);
    }

    #[test]
    fn test_load_with_profile() {
        let temp_dir = TempDir::new().unwrap();
        let profile_dir = temp_dir.path().join("docker");
        std::fs::create_dir_all(&profile_dir).unwrap();
        std::fs::write(
            profile_dir.join(CONFIG_FILE_NAME),
            r#"
[service]
port = 9999

[writable.store_and_forward]
enabled = true
retry_interval_secs = 5
"#,
        )
        .unwrap();

        let config = ServiceConfig::load(Some("docker"), Some(temp_dir.path())).unwrap();
        assert_eq!(config.service.port, 9999);
        assert!(config.writable.store_and_forward.enabled);
        assert_eq!(config.writable.store_and_forward.retry_interval_secs, 5);
        // untouched sections keep their defaults
        assert_eq!(config.writable.log_level, "info");
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        assert!(ServiceConfig::load(None, Some(temp_dir.path())).is_err());
    }

    #[test]
    fn test_pipeline_functions_parse() {
        let config: ServiceConfig = toml::from_str(
            r#"
[writable.pipeline]
execution_order = "FilterByDeviceName, HttpExport"

[writable.pipeline.functions.FilterByDeviceName.parameters]
devicenames = "a, b"

[writable.pipeline.functions.HttpExport.parameters]
url = "http://example"
"#,
        )
        .unwrap();

        assert_eq!(config.writable.pipeline.functions.len(), 2);
        assert_eq!(
            config.writable.pipeline.functions["HttpExport"].parameters["url"],
            "http://example"
        );
    }

    #[test]
    fn test_client_url() {
        let client = ClientInfo::default();
        assert_eq!(client.url(), "http://localhost:48080");
    }
}
