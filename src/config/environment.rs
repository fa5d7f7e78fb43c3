//! Environment-variable configuration overrides
//!
//! Applied after the file is parsed and before anything reads the
//! configuration, so the file remains the single source of defaults.

use tracing::warn;

use super::ServiceConfig;

/// Override for the web server bind host
pub const ENV_SERVICE_HOST: &str = "EDGEFLOW_SERVICE_HOST";
/// Override for the web server bind port
pub const ENV_SERVICE_PORT: &str = "EDGEFLOW_SERVICE_PORT";
/// Override for the writable log level
pub const ENV_LOG_LEVEL: &str = "EDGEFLOW_LOG_LEVEL";
/// Security toggle: the literal value `"false"` disables the secure
/// secret store and enables insecure in-configuration secrets
pub const ENV_SECURITY_SECRET_STORE: &str = "EDGEX_SECURITY_SECRET_STORE";

/// Apply recognized environment overrides onto `config`.
pub fn apply_env_overrides(config: &mut ServiceConfig) {
    if let Ok(host) = std::env::var(ENV_SERVICE_HOST) {
        if !host.is_empty() {
            config.service.host = host;
        }
    }

    if let Ok(port) = std::env::var(ENV_SERVICE_PORT) {
        match port.parse::<u16>() {
            Ok(port) => config.service.port = port,
            Err(_) => warn!(value = %port, "ignoring unparseable {ENV_SERVICE_PORT}"),
        }
    }

    if let Ok(level) = std::env::var(ENV_LOG_LEVEL) {
        if !level.is_empty() {
            config.writable.log_level = level;
        }
    }
}

/// Whether the secure secret store is enabled.
///
/// Security is disabled only by the literal value `"false"`; any other
/// value, or an unset variable, leaves it enabled. Callers cache the
/// result at startup rather than re-reading the environment.
pub fn security_enabled() -> bool {
    std::env::var(ENV_SECURITY_SECRET_STORE).as_deref() != Ok("false")
}
