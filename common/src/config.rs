// Configuration management with layered configuration (file, env)

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::models::ExecutionTarget;

/// Main settings structure containing all configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub engine: EngineConfig,
    pub object_store: ObjectStoreConfig,
    pub auth: AuthConfig,
    pub registry: RegistryConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Distributed execution engine endpoints, one per deployment target.
/// An empty master URL means the target is not configured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub local_master: String,
    #[serde(default)]
    pub static_master: String,
    #[serde(default)]
    pub managed_master: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub container_image: String,
    #[serde(default)]
    pub dynamic_allocation: DynamicAllocationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DynamicAllocationConfig {
    pub enabled: bool,
    pub min_executors: u32,
    pub max_executors: u32,
}

impl Default for DynamicAllocationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            min_executors: 1,
            max_executors: 4,
        }
    }
}

impl EngineConfig {
    /// Master URL for a deployment target, or `None` when that target
    /// has no configured endpoint
    pub fn master_url(&self, target: ExecutionTarget) -> Option<&str> {
        let url = match target {
            ExecutionTarget::Local => &self.local_master,
            ExecutionTarget::ClusterStatic => &self.static_master,
            ExecutionTarget::ClusterManaged => &self.managed_master,
        };
        if url.is_empty() {
            None
        } else {
            Some(url)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectStoreConfig {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    pub region: String,
    #[serde(default)]
    pub use_ssl: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_hours: u64,
}

/// Job bookkeeping and failure-policy knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Terminal jobs older than this are evicted; 0 keeps jobs forever
    pub job_ttl_seconds: u64,
    #[serde(default)]
    pub output_failure_policy: OutputFailurePolicy,
    #[serde(default)]
    pub partial_binding_policy: PartialBindingPolicy,
}

/// How output write failures affect job-level status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputFailurePolicy {
    /// Job status reflects script execution only; a job with failed
    /// outputs still finishes Done
    #[default]
    ExecutionOnly,
    /// Any failed output fails the job
    Aggregate,
}

/// How input binding load failures are handled
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PartialBindingPolicy {
    /// Failed bindings are logged and omitted; execution proceeds with
    /// the bindings that loaded
    #[default]
    OmitFailed,
    /// Any failed binding fails the job before execution
    Strict,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub metrics_port: u16,
}

impl Settings {
    /// Load configuration with layered precedence: defaults → file → env
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default configuration
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Add local configuration (not committed to git)
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            // Add environment-specific configuration
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("Server port must be greater than 0".to_string());
        }

        if self.engine.local_master.is_empty() {
            return Err("Engine local_master cannot be empty".to_string());
        }
        let alloc = &self.engine.dynamic_allocation;
        if alloc.enabled && alloc.min_executors > alloc.max_executors {
            return Err(
                "Dynamic allocation min_executors cannot exceed max_executors".to_string(),
            );
        }

        if self.object_store.endpoint.is_empty() {
            return Err("Object store endpoint cannot be empty".to_string());
        }
        if self.object_store.bucket.is_empty() {
            return Err("Object store bucket cannot be empty".to_string());
        }

        if self.auth.jwt_secret.is_empty() {
            return Err("JWT secret cannot be empty".to_string());
        }

        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            engine: EngineConfig {
                local_master: "local[*]".to_string(),
                static_master: String::new(),
                managed_master: String::new(),
                namespace: "datalab".to_string(),
                container_image: String::new(),
                dynamic_allocation: DynamicAllocationConfig::default(),
            },
            object_store: ObjectStoreConfig {
                endpoint: "http://localhost:9000".to_string(),
                access_key: "minioadmin".to_string(),
                secret_key: "minioadmin".to_string(),
                bucket: "datalab".to_string(),
                region: "us-east-1".to_string(),
                use_ssl: false,
            },
            auth: AuthConfig {
                jwt_secret: "change-me-in-production".to_string(),
                jwt_expiration_hours: 24,
            },
            registry: RegistryConfig {
                job_ttl_seconds: 86_400,
                output_failure_policy: OutputFailurePolicy::default(),
                partial_binding_policy: PartialBindingPolicy::default(),
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                metrics_port: 9090,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validation_catches_zero_port() {
        let mut settings = Settings::default();
        settings.server.port = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_catches_empty_local_master() {
        let mut settings = Settings::default();
        settings.engine.local_master = String::new();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_catches_inverted_allocation_bounds() {
        let mut settings = Settings::default();
        settings.engine.dynamic_allocation.enabled = true;
        settings.engine.dynamic_allocation.min_executors = 8;
        settings.engine.dynamic_allocation.max_executors = 2;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_master_url_per_target() {
        let settings = Settings::default();
        assert_eq!(
            settings.engine.master_url(ExecutionTarget::Local),
            Some("local[*]")
        );
        // Cluster targets are unconfigured by default
        assert_eq!(
            settings.engine.master_url(ExecutionTarget::ClusterStatic),
            None
        );
        assert_eq!(
            settings.engine.master_url(ExecutionTarget::ClusterManaged),
            None
        );
    }

    #[test]
    fn test_load_from_path_layers_local_over_default() {
        let dir = tempfile::tempdir().unwrap();

        let default_toml = r#"
[server]
host = "0.0.0.0"
port = 8080

[engine]
local_master = "local[*]"

[object_store]
endpoint = "http://localhost:9000"
access_key = "minioadmin"
secret_key = "minioadmin"
bucket = "datalab"
region = "us-east-1"

[auth]
jwt_secret = "test-secret"
jwt_expiration_hours = 24

[registry]
job_ttl_seconds = 3600

[observability]
log_level = "info"
metrics_port = 9090
"#;
        std::fs::write(dir.path().join("default.toml"), default_toml).unwrap();
        std::fs::write(
            dir.path().join("local.toml"),
            "[server]\nhost = \"0.0.0.0\"\nport = 9999\n",
        )
        .unwrap();

        let settings = Settings::load_from_path(dir.path()).unwrap();
        assert_eq!(settings.server.port, 9999);
        assert_eq!(settings.registry.job_ttl_seconds, 3600);
        // Unset optional fields fall back to serde defaults
        assert!(settings.engine.static_master.is_empty());
        assert!(!settings.engine.dynamic_allocation.enabled);
        assert_eq!(
            settings.registry.partial_binding_policy,
            PartialBindingPolicy::OmitFailed
        );
    }

    #[test]
    fn test_default_policies() {
        let settings = Settings::default();
        assert_eq!(
            settings.registry.output_failure_policy,
            OutputFailurePolicy::ExecutionOnly
        );
        assert_eq!(
            settings.registry.partial_binding_policy,
            PartialBindingPolicy::OmitFailed
        );
    }
}
