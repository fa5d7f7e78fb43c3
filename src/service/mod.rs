//! Application service lifecycle
//!
//! [`AppService`] ties the pieces together: it bootstraps configuration,
//! logging collaborators, the secret provider, and the store client; it
//! owns the pipeline (code-defined or configurable); and `run` starts
//! the trigger, the web server, the telemetry sampler, and the
//! store-and-forward loop, then coordinates shutdown through a single
//! watch channel every background worker observes.
//!
//! Startup errors propagate to the caller, which is expected to exit
//! non-zero. Once running, failures are absorbed and logged by the
//! component they occur in.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::routing::MethodRouter;
use parking_lot::{Mutex, RwLock};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::clients::CoreDataClient;
use crate::config::{ServiceArgs, ServiceConfig, StoreInfo, WritableConfig};
use crate::error::{EdgeflowError, Result};
use crate::function::{FunctionRegistry, PipelineFunction};
use crate::runtime::{PipelineRuntime, StoreForward};
use crate::security::{SecretClient, SecretProvider};
use crate::store::{FileStore, MemoryStore, StoreClient};
use crate::telemetry::{TelemetrySampler, DEFAULT_SAMPLE_INTERVAL_SECS};
use crate::transforms;
use crate::trigger::{
    HttpTrigger, MessageBus, MessageBusTrigger, TargetType, Trigger, TriggerDependencies,
};
use crate::util::split_and_trim;
use crate::webserver::{WebServer, WebServerState};

/// Placeholder in a service key replaced by the active profile
pub const PROFILE_PLACEHOLDER: &str = "<profile>";

const BOOTSTRAP_RETRY_DELAY: Duration = Duration::from_secs(1);

/// The lifecycle controller for one event-processing service
pub struct AppService {
    service_key: String,
    args: ServiceArgs,
    config: Arc<RwLock<ServiceConfig>>,
    runtime: Arc<PipelineRuntime>,
    registry: FunctionRegistry,
    bus: Arc<MessageBus>,
    target_type: RwLock<TargetType>,
    using_configurable_pipeline: AtomicBool,
    secret_client: Option<Arc<dyn SecretClient>>,
    secret_provider: Option<Arc<SecretProvider>>,
    core_data: Option<Arc<CoreDataClient>>,
    extra_routes: Mutex<Vec<(String, MethodRouter<WebServerState>)>>,
    store_forward_stop: Mutex<Option<(watch::Sender<bool>, JoinHandle<()>)>>,
    shutdown_tx: watch::Sender<bool>,
    updates_tx: mpsc::Sender<WritableConfig>,
    updates_rx: Mutex<Option<mpsc::Receiver<WritableConfig>>>,
}

impl AppService {
    /// Create a service under `service_key`. Call
    /// [`initialize`](Self::initialize) next, then set a pipeline, then
    /// [`run`](Self::run).
    pub fn new(service_key: impl Into<String>, args: ServiceArgs) -> Self {
        let service_key = service_key.into();
        let (shutdown_tx, _) = watch::channel(false);
        let (updates_tx, updates_rx) = mpsc::channel(8);

        Self {
            runtime: Arc::new(PipelineRuntime::new(service_key.clone())),
            service_key,
            args,
            config: Arc::new(RwLock::new(ServiceConfig::default())),
            registry: transforms::default_registry(),
            bus: Arc::new(MessageBus::new()),
            target_type: RwLock::new(TargetType::Event),
            using_configurable_pipeline: AtomicBool::new(false),
            secret_client: None,
            secret_provider: None,
            core_data: None,
            extra_routes: Mutex::new(Vec::new()),
            store_forward_stop: Mutex::new(None),
            shutdown_tx,
            updates_tx,
            updates_rx: Mutex::new(Some(updates_rx)),
        }
    }

    /// Attach a secure secret client before [`initialize`](Self::initialize).
    pub fn with_secret_client(mut self, client: Arc<dyn SecretClient>) -> Self {
        self.secret_client = Some(client);
        self
    }

    /// The service key, after any profile substitution.
    pub fn service_key(&self) -> &str {
        &self.service_key
    }

    /// The in-process message bus serving the message-bus binding.
    pub fn message_bus(&self) -> Arc<MessageBus> {
        self.bus.clone()
    }

    /// The pipeline runtime.
    pub fn runtime(&self) -> Arc<PipelineRuntime> {
        self.runtime.clone()
    }

    /// Sender for pushing writable-configuration updates into the
    /// running service (the registry listener's feed).
    pub fn config_updates(&self) -> mpsc::Sender<WritableConfig> {
        self.updates_tx.clone()
    }

    /// Register an additional constructable pipeline function.
    pub fn register_function(
        &mut self,
        name: impl Into<String>,
        constructor: crate::function::FunctionConstructor,
    ) {
        self.registry.register(name, constructor);
    }

    /// Override how trigger payloads are decoded.
    pub fn set_target_type(&self, target_type: TargetType) {
        *self.target_type.write() = target_type;
    }

    /// Parse flags, load configuration, and bring up collaborators.
    ///
    /// Dependencies that can be transiently unavailable (the version
    /// check, the store client) are retried inside the configured boot
    /// timeout; exhaustion propagates the error to the caller.
    pub async fn initialize(&mut self) -> Result<()> {
        if self.service_key.contains(PROFILE_PLACEHOLDER) {
            let suffix = match self.args.profile.as_deref() {
                Some(profile) if !profile.is_empty() => format!("-{profile}"),
                _ => String::new(),
            };
            self.service_key = self.service_key.replace(PROFILE_PLACEHOLDER, &suffix);
            self.runtime = Arc::new(PipelineRuntime::new(self.service_key.clone()));
        }

        let loaded =
            ServiceConfig::load(self.args.profile.as_deref(), self.args.confdir.as_deref())?;
        *self.config.write() = loaded;

        let mut provider = SecretProvider::new(self.config.clone());
        if let Some(client) = &self.secret_client {
            provider = provider.with_client(client.clone());
        }
        let secret_provider = Arc::new(provider);
        self.secret_provider = Some(secret_provider.clone());

        let core_data_url = self.config.read().core_data_client().map(|c| c.url());
        if let Some(url) = core_data_url {
            self.core_data = Some(Arc::new(CoreDataClient::new(url)));
        }

        let (boot_timeout_secs, store_enabled, store_info) = {
            let config = self.config.read();
            (
                config.service.boot_timeout_secs,
                config.writable.store_and_forward.enabled,
                config.store.clone(),
            )
        };
        let deadline = Instant::now() + Duration::from_secs(boot_timeout_secs);

        let mut version_checked = false;
        let mut store_client: Option<Arc<dyn StoreClient>> = None;
        loop {
            if !version_checked {
                if self.validate_version_match().await {
                    version_checked = true;
                } else {
                    if Instant::now() >= deadline {
                        return Err(EdgeflowError::config(
                            "core services version is not compatible with this service",
                        ));
                    }
                    tokio::time::sleep(BOOTSTRAP_RETRY_DELAY).await;
                    continue;
                }
            }

            if store_enabled && store_client.is_none() {
                if let Err(error) = secret_provider.get_store_credentials(&store_info).await {
                    // file and memory stores carry no credentials
                    debug!(error = %error, "store credentials unavailable");
                }
                match create_store_client(&store_info) {
                    Ok(client) => store_client = Some(client),
                    Err(error) => {
                        error!(error = %error, "unable to initialize store for store-and-forward");
                        if Instant::now() >= deadline {
                            return Err(error);
                        }
                        tokio::time::sleep(BOOTSTRAP_RETRY_DELAY).await;
                        continue;
                    }
                }
            }

            break;
        }

        self.runtime.initialize(store_client, Some(secret_provider));
        info!(service_key = %self.service_key, "clients initialized");
        Ok(())
    }

    /// Define the pipeline in code.
    pub fn set_functions_pipeline(
        &self,
        transforms: Vec<Arc<dyn PipelineFunction>>,
    ) -> Result<()> {
        if transforms.is_empty() {
            return Err(EdgeflowError::pipeline("no transforms provided to pipeline"));
        }
        self.runtime.set_transforms(transforms);
        Ok(())
    }

    /// Build the pipeline from the writable configuration's
    /// `execution_order` against the function registry.
    pub fn load_configurable_pipeline(&self) -> Result<Vec<Arc<dyn PipelineFunction>>> {
        self.using_configurable_pipeline.store(true, Ordering::SeqCst);

        let pipeline_config = self.config.read().writable.pipeline.clone();

        *self.target_type.write() = if pipeline_config.use_target_type_of_byte_array {
            TargetType::RawBytes
        } else {
            TargetType::Event
        };

        let execution_order = split_and_trim(&pipeline_config.execution_order);
        if execution_order.is_empty() {
            return Err(EdgeflowError::pipeline(
                "execution order has 0 functions specified; the pipeline needs at least one",
            ));
        }
        debug!(functions = %execution_order.join(","), "loading configurable pipeline");

        let mut pipeline = Vec::with_capacity(execution_order.len());
        for name in &execution_order {
            let parameters = pipeline_config
                .functions
                .get(name)
                .map(|f| f.parameters.clone())
                .unwrap_or_default();
            let function = self.registry.build(name, &parameters)?;
            debug!(function = %name, "function added to configurable pipeline");
            pipeline.push(function);
        }

        Ok(pipeline)
    }

    /// The free-form application settings section.
    pub fn application_settings(&self) -> HashMap<String, String> {
        self.config.read().application_settings.clone()
    }

    /// A comma-separated application setting as a trimmed string list.
    pub fn get_app_setting_strings(&self, name: &str) -> Result<Vec<String>> {
        let config = self.config.read();
        let value = config.application_settings.get(name).ok_or_else(|| {
            EdgeflowError::config(format!("'{name}' setting not found in application settings"))
        })?;
        Ok(split_and_trim(value))
    }

    /// Add a host route to the web server; reserved paths are rejected
    /// when the server is built.
    pub fn add_route(&self, path: impl Into<String>, handler: MethodRouter<WebServerState>) {
        self.extra_routes.lock().push((path.into(), handler));
    }

    /// Start the trigger, web server, telemetry sampler, and (when
    /// enabled) the store-and-forward loop, then block until shutdown is
    /// requested by signal or [`trigger_shutdown`](Self::trigger_shutdown).
    pub async fn run(&self) -> Result<()> {
        if self.runtime.transform_count() == 0 {
            return Err(EdgeflowError::pipeline(
                "no transforms configured; set a pipeline before running",
            ));
        }

        let telemetry = Arc::new(TelemetrySampler::new(DEFAULT_SAMPLE_INTERVAL_SECS));
        let telemetry_handle = telemetry.start(self.shutdown_tx.subscribe());

        let deps = Arc::new(TriggerDependencies {
            runtime: self.runtime.clone(),
            config: self.config.clone(),
            core_data: self.core_data.clone(),
            secret_provider: self.secret_provider.clone(),
            target_type: *self.target_type.read(),
        });

        let mut webserver = WebServer::new(self.config.clone(), telemetry);
        for (path, handler) in self.extra_routes.lock().drain(..) {
            webserver.add_route(path, handler)?;
        }

        let binding_type = self.config.read().binding.binding_type.to_lowercase();
        let mut trigger_handle = None;
        match binding_type.as_str() {
            "http" => {
                info!("HTTP trigger selected");
                let trigger = HttpTrigger::new(deps.clone());
                webserver.set_trigger(trigger.dependencies());
                trigger.initialize(self.shutdown_tx.subscribe()).await?;
            }
            "messagebus" => {
                info!("message bus trigger selected");
                let trigger = MessageBusTrigger::new(deps.clone(), self.bus.clone());
                trigger_handle = trigger.initialize(self.shutdown_tx.subscribe()).await?;
            }
            other => {
                return Err(EdgeflowError::config(format!(
                    "unknown trigger binding type '{other}'"
                )))
            }
        }

        if self.config.read().writable.store_and_forward.enabled {
            self.start_store_forward()?;
        } else {
            info!("store-and-forward disabled, not running retry loop");
        }

        let addr = {
            let config = self.config.read();
            format!("{}:{}", config.service.host, config.service.port)
        };
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| EdgeflowError::Server(format!("failed to bind {addr}: {e}")))?;
        let server_handle = tokio::spawn(webserver.serve_on(listener, self.shutdown_tx.subscribe()));

        info!("{}", self.config.read().service.startup_msg);

        let mut updates_rx = self
            .updates_rx
            .lock()
            .take()
            .ok_or_else(|| EdgeflowError::Server("service is already running".to_string()))?;
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                signal = tokio::signal::ctrl_c() => {
                    match signal {
                        Ok(()) => info!("terminating: interrupt signal received"),
                        Err(error) => error!(error = %error, "failed to listen for interrupt"),
                    }
                    break;
                }
                _ = shutdown_rx.changed() => {
                    info!("terminating: shutdown requested");
                    break;
                }
                update = updates_rx.recv() => match update {
                    Some(writable) => self.apply_writable(writable).await,
                    None => debug!("configuration update channel closed"),
                },
            }
        }

        // one signal stops every worker; each is joined below
        let _ = self.shutdown_tx.send(true);
        self.stop_store_forward().await;
        let _ = telemetry_handle.await;
        if let Some(handle) = trigger_handle {
            let _ = handle.await;
        }
        match server_handle.await {
            Ok(result) => result?,
            Err(error) => error!(error = %error, "web server task panicked"),
        }

        Ok(())
    }

    /// Request shutdown of a running service.
    pub fn trigger_shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Apply a writable-configuration change. Mirrors the registry
    /// listener contract: changes arrive one setting at a time, so only
    /// the first recognized difference is acted upon; anything else is
    /// treated as a pipeline change.
    pub async fn apply_writable(&self, mut new: WritableConfig) {
        if new.store_and_forward.max_retry_count < 0 {
            warn!("store-and-forward max retry count cannot be less than 0, defaulting to 1");
            new.store_and_forward.max_retry_count = 1;
        }

        let previous = {
            let mut config = self.config.write();
            let previous = config.writable.clone();
            config.writable = new.clone();
            previous
        };
        info!("writable configuration has been updated");

        if previous.log_level != new.log_level {
            info!(log_level = %new.log_level, "logging level changed");
        } else if previous.store_and_forward.max_retry_count
            != new.store_and_forward.max_retry_count
        {
            info!(
                max_retry_count = new.store_and_forward.max_retry_count,
                "store-and-forward max retry count changed"
            );
        } else if previous.store_and_forward.retry_interval_secs
            != new.store_and_forward.retry_interval_secs
        {
            if new.store_and_forward.enabled {
                self.stop_store_forward().await;
                if let Err(error) = self.start_store_forward() {
                    error!(error = %error, "failed to restart store-and-forward retry loop");
                }
            }
        } else if previous.store_and_forward.enabled != new.store_and_forward.enabled {
            if new.store_and_forward.enabled {
                if self.runtime.store_client().is_none() {
                    let store_info = self.config.read().store.clone();
                    match create_store_client(&store_info) {
                        Ok(client) => self.runtime.initialize(Some(client), None),
                        Err(error) => {
                            error!(error = %error, "unable to initialize store, disabling store-and-forward");
                            self.config.write().writable.store_and_forward.enabled = false;
                            return;
                        }
                    }
                }
                if let Err(error) = self.start_store_forward() {
                    error!(error = %error, "failed to start store-and-forward retry loop");
                }
            } else {
                self.stop_store_forward().await;
            }
        } else if self.using_configurable_pipeline.load(Ordering::SeqCst) {
            match self.load_configurable_pipeline() {
                Ok(pipeline) => match self.set_functions_pipeline(pipeline) {
                    Ok(()) => info!("reloaded configurable pipeline"),
                    Err(error) => {
                        error!(error = %error, "unable to set reloaded configurable pipeline")
                    }
                },
                Err(error) => error!(error = %error, "unable to reload configurable pipeline"),
            }
        }
    }

    fn start_store_forward(&self) -> Result<()> {
        let mut engine = StoreForward::new(self.runtime.clone(), self.config.clone());
        if let Some(core_data) = &self.core_data {
            engine = engine.with_core_data(core_data.clone());
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = Arc::new(engine).start(stop_rx)?;
        *self.store_forward_stop.lock() = Some((stop_tx, handle));
        Ok(())
    }

    async fn stop_store_forward(&self) {
        let stopped = self.store_forward_stop.lock().take();
        if let Some((stop_tx, handle)) = stopped {
            info!("canceling store-and-forward retry loop");
            let _ = stop_tx.send(true);
            let _ = handle.await;
        }
    }

    /// Major-version compatibility check against core-data. Skipped by
    /// flag, when this crate is still at major version 0, or when no
    /// core-data client is configured.
    async fn validate_version_match(&self) -> bool {
        if self.args.skip_version_check {
            info!("skipping core services version compatibility check");
            return true;
        }

        let sdk_version = env!("CARGO_PKG_VERSION");
        let Some(sdk_major) = major_version(sdk_version) else {
            error!(version = sdk_version, "sdk version is malformed");
            return false;
        };
        if sdk_major == "0" {
            info!(
                version = sdk_version,
                "skipping version compatibility check for pre-release sdk"
            );
            return true;
        }

        let Some(client) = &self.core_data else {
            info!("no core-data client configured, skipping version compatibility check");
            return true;
        };

        match client.get_version().await {
            Ok(version) => match major_version(&version) {
                Some(core_major) if core_major == sdk_major => {
                    debug!(core = %version, sdk = sdk_version, "core services version is compatible");
                    true
                }
                Some(_) => {
                    error!(
                        core = %version,
                        sdk = sdk_version,
                        "core services version is not compatible"
                    );
                    false
                }
                None => {
                    error!(version = %version, "core services version is malformed");
                    false
                }
            },
            Err(error) => {
                error!(error = %error, "unable to get version of core services");
                false
            }
        }
    }
}

fn major_version(version: &str) -> Option<&str> {
    let mut parts = version.split('.');
    let major = parts.next()?;
    // require at least major.minor.patch
    if parts.count() < 2 {
        return None;
    }
    Some(major.trim_start_matches('v'))
}

fn create_store_client(store: &StoreInfo) -> Result<Arc<dyn StoreClient>> {
    match store.store_type.as_str() {
        "memory" => Ok(Arc::new(MemoryStore::new())),
        "file" => Ok(Arc::new(FileStore::new(store.path.clone())?)),
        other => Err(EdgeflowError::config(format!(
            "unsupported store type '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, contents: &str) {
        std::fs::write(dir.path().join("configuration.toml"), contents).unwrap();
    }

    fn args_for(dir: &TempDir) -> ServiceArgs {
        ServiceArgs {
            confdir: Some(dir.path().to_path_buf()),
            skip_version_check: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_initialize_replaces_profile_placeholder() {
        let dir = TempDir::new().unwrap();
        let profile_dir = dir.path().join("docker");
        std::fs::create_dir_all(&profile_dir).unwrap();
        std::fs::write(profile_dir.join("configuration.toml"), "").unwrap();

        let mut args = args_for(&dir);
        args.profile = Some("docker".to_string());
        let mut service = AppService::new("app-<profile>", args);
        service.initialize().await.unwrap();
        assert_eq!(service.service_key(), "app-docker");
    }

    #[tokio::test]
    async fn test_initialize_binds_store_when_enabled() {
        let dir = TempDir::new().unwrap();
        write_config(
            &dir,
            r#"
[writable.store_and_forward]
enabled = true
"#,
        );

        let mut service = AppService::new("svc", args_for(&dir));
        service.initialize().await.unwrap();
        assert!(service.runtime.store_client().is_some());
    }

    #[tokio::test]
    async fn test_initialize_rejects_unknown_store_type() {
        let dir = TempDir::new().unwrap();
        write_config(
            &dir,
            r#"
[service]
boot_timeout_secs = 1

[store]
type = "redis"

[writable.store_and_forward]
enabled = true
"#,
        );

        let mut service = AppService::new("svc", args_for(&dir));
        assert!(service.initialize().await.is_err());
    }

    #[tokio::test]
    async fn test_load_configurable_pipeline() {
        let dir = TempDir::new().unwrap();
        write_config(
            &dir,
            r#"
[writable.pipeline]
execution_order = "FilterByDeviceName, TransformToJson, SetOutputData"

[writable.pipeline.functions.FilterByDeviceName.parameters]
devicenames = "sensor-1, sensor-2"
"#,
        );

        let mut service = AppService::new("svc", args_for(&dir));
        service.initialize().await.unwrap();

        let pipeline = service.load_configurable_pipeline().unwrap();
        assert_eq!(pipeline.len(), 3);
        assert_eq!(pipeline[0].name(), "FilterByDeviceName");
        assert_eq!(*service.target_type.read(), TargetType::Event);
    }

    #[tokio::test]
    async fn test_load_configurable_pipeline_byte_array_target() {
        let dir = TempDir::new().unwrap();
        write_config(
            &dir,
            r#"
[writable.pipeline]
execution_order = "SetOutputData"
use_target_type_of_byte_array = true
"#,
        );

        let mut service = AppService::new("svc", args_for(&dir));
        service.initialize().await.unwrap();
        service.load_configurable_pipeline().unwrap();
        assert_eq!(*service.target_type.read(), TargetType::RawBytes);
    }

    #[tokio::test]
    async fn test_load_configurable_pipeline_requires_functions() {
        let dir = TempDir::new().unwrap();
        write_config(&dir, "");

        let mut service = AppService::new("svc", args_for(&dir));
        service.initialize().await.unwrap();
        assert!(service.load_configurable_pipeline().is_err());
    }

    #[tokio::test]
    async fn test_load_configurable_pipeline_unknown_function() {
        let dir = TempDir::new().unwrap();
        write_config(
            &dir,
            r#"
[writable.pipeline]
execution_order = "NotARealFunction"
"#,
        );

        let mut service = AppService::new("svc", args_for(&dir));
        service.initialize().await.unwrap();
        let err = service.load_configurable_pipeline().unwrap_err();
        assert!(matches!(err, EdgeflowError::FunctionNotRegistered(_)));
    }

    #[tokio::test]
    async fn test_set_functions_pipeline_rejects_empty() {
        let service = AppService::new("svc", ServiceArgs::default());
        assert!(service.set_functions_pipeline(Vec::new()).is_err());
    }

    #[tokio::test]
    async fn test_app_setting_strings() {
        let dir = TempDir::new().unwrap();
        write_config(
            &dir,
            r#"
[application_settings]
DeviceNames = "device-a, device-b, , device-c"
"#,
        );

        let mut service = AppService::new("svc", args_for(&dir));
        service.initialize().await.unwrap();

        assert_eq!(
            service.get_app_setting_strings("DeviceNames").unwrap(),
            vec!["device-a", "device-b", "device-c"]
        );
        assert!(service.get_app_setting_strings("Missing").is_err());
    }

    #[tokio::test]
    async fn test_apply_writable_clamps_negative_retry_count() {
        let service = AppService::new("svc", ServiceArgs::default());
        let mut writable = WritableConfig::default();
        writable.store_and_forward.max_retry_count = -5;

        service.apply_writable(writable).await;
        assert_eq!(
            service.config.read().writable.store_and_forward.max_retry_count,
            1
        );
    }

    #[tokio::test]
    async fn test_apply_writable_reloads_configurable_pipeline() {
        let dir = TempDir::new().unwrap();
        write_config(
            &dir,
            r#"
[writable.pipeline]
execution_order = "SetOutputData"
"#,
        );

        let mut service = AppService::new("svc", args_for(&dir));
        service.initialize().await.unwrap();
        let pipeline = service.load_configurable_pipeline().unwrap();
        service.set_functions_pipeline(pipeline).unwrap();
        let original_hash = service.runtime.pipeline_hash();

        let mut writable = service.config.read().writable.clone();
        writable.pipeline.execution_order = "TransformToJson, SetOutputData".to_string();
        service.apply_writable(writable).await;

        assert_ne!(service.runtime.pipeline_hash(), original_hash);
        assert_eq!(service.runtime.transform_count(), 2);
    }

    #[test]
    fn test_major_version() {
        assert_eq!(major_version("1.2.3"), Some("1"));
        assert_eq!(major_version("v2.0.1"), Some("2"));
        assert_eq!(major_version("0.3.1"), Some("0"));
        assert_eq!(major_version("1.2"), None);
        assert_eq!(major_version("nope"), None);
    }
}
