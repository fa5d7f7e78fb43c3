//! Command-line arguments for an edgeflow service
//!
//! The flag set matches the conventional app-service surface; the
//! profile flag can also be supplied through the `edgex_profile`
//! environment variable, which takes effect when `-p` is absent.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments accepted by the host service
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "edgeflow")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Event-pipeline service for edge deployments")]
pub struct ServiceArgs {
    /// Use the service registry for configuration and registration
    #[arg(short = 'r', long = "registry")]
    pub use_registry: bool,

    /// Configuration profile other than default
    #[arg(short = 'p', long = "profile", env = "edgex_profile")]
    pub profile: Option<String>,

    /// Alternate configuration directory
    #[arg(short = 'c', long = "confdir")]
    pub confdir: Option<PathBuf>,

    /// Skip the core services version compatibility check
    #[arg(short = 's', long = "skipVersionCheck")]
    pub skip_version_check: bool,

    /// Overwrite configuration in the registry with local values
    #[arg(short = 'o', long = "overwrite")]
    pub overwrite_config: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_flags() {
        let args = ServiceArgs::parse_from(["edgeflow", "-r", "-s", "-o", "-p", "docker"]);
        assert!(args.use_registry);
        assert!(args.skip_version_check);
        assert!(args.overwrite_config);
        assert_eq!(args.profile.as_deref(), Some("docker"));
        assert!(args.confdir.is_none());
    }

    #[test]
    fn test_long_flags() {
        let args = ServiceArgs::parse_from([
            "edgeflow",
            "--registry",
            "--confdir",
            "/etc/edgeflow",
            "--skipVersionCheck",
        ]);
        assert!(args.use_registry);
        assert!(args.skip_version_check);
        assert_eq!(args.confdir.as_deref(), Some(std::path::Path::new("/etc/edgeflow")));
    }

    #[test]
    fn test_defaults() {
        let args = ServiceArgs::parse_from(["edgeflow"]);
        assert!(!args.use_registry);
        assert!(!args.overwrite_config);
    }
}
