//! Configuration for sglgb-daemon

use crate::evidence::UploadPolicy;
use serde::{Deserialize, Serialize};
use sglgb_engine::EnginePolicy;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Main daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Evidence storage and upload policy
    #[serde(default)]
    pub evidence: EvidenceConfig,

    /// Lifecycle policy (seal threshold, rework cap)
    #[serde(default)]
    pub policy: EnginePolicy,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Indicator catalogue JSON file. The built-in catalogue is used when unset.
    #[serde(default)]
    pub catalogue_path: Option<PathBuf>,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    pub listen_addr: SocketAddr,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Maximum request body size in bytes. Must admit the largest upload
    /// the upload policy allows.
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
            enable_cors: true,
            max_body_size: default_max_body_size(),
        }
    }
}

/// Where evidence blobs are kept
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EvidenceBackend {
    /// In-memory blobs (for development/testing)
    #[default]
    Memory,

    /// Files under a local directory
    Disk {
        /// Root directory
        root: PathBuf,
    },
}

impl std::fmt::Display for EvidenceBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvidenceBackend::Memory => write!(f, "memory"),
            EvidenceBackend::Disk { root } => write!(f, "disk ({})", root.display()),
        }
    }
}

/// Evidence configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvidenceConfig {
    #[serde(default)]
    pub backend: EvidenceBackend,

    #[serde(default)]
    pub uploads: UploadPolicy,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_max_body_size() -> usize {
    110 * 1024 * 1024
}

fn default_log_level() -> String {
    "info".to_string()
}

impl DaemonConfig {
    /// Load configuration: defaults, then the optional file, then
    /// `SGLGB__`-prefixed environment variables (`SGLGB__SERVER__LISTEN_ADDR`).
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&DaemonConfig::default())?);

        // Add file configuration if provided
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        // Add environment variables with SGLGB prefix
        builder = builder.add_source(
            config::Environment::with_prefix("SGLGB")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Create a development configuration
    pub fn development() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = DaemonConfig::default();
        assert_eq!(config.server.listen_addr.port(), 8080);
        assert_eq!(config.evidence.backend, EvidenceBackend::Memory);
        assert_eq!(config.policy.essential_areas_required, 1);
        assert!(config.policy.max_rework_cycles.is_none());
        assert!(config.catalogue_path.is_none());
    }

    #[test]
    fn test_body_limit_admits_assessor_uploads() {
        let config = DaemonConfig::default();
        assert!(config.server.max_body_size as u64 >= config.evidence.uploads.assessor.max_bytes);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
listen_addr = "0.0.0.0:9090"

[policy]
max_rework_cycles = 3

[evidence.backend]
type = "disk"
root = "/var/lib/sglgb/evidence"
"#
        )
        .unwrap();

        let config = DaemonConfig::load(file.path().to_str()).unwrap();
        assert_eq!(config.server.listen_addr.port(), 9090);
        assert_eq!(config.policy.max_rework_cycles, Some(3));
        assert_eq!(
            config.evidence.backend,
            EvidenceBackend::Disk {
                root: "/var/lib/sglgb/evidence".into()
            }
        );
        assert_eq!(config.policy.essential_areas_required, 1);
    }
}
