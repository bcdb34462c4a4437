//! Server configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Environment variable consulted for the upstream API key before the
/// config file value.
pub const API_KEY_ENV: &str = "OPENWEATHERMAP_API_KEY";

/// Minimum refresh interval in seconds (1 minute).
pub const MIN_REFRESH_INTERVAL: u64 = 60;
/// Minimum upstream timeout in seconds.
pub const MIN_UPSTREAM_TIMEOUT: u64 = 1;
/// Maximum upstream timeout in seconds.
pub const MAX_UPSTREAM_TIMEOUT: u64 = 120;

/// Service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server settings.
    pub server: ServerConfig,
    /// Storage settings.
    pub storage: StorageConfig,
    /// Upstream provider settings.
    pub upstream: UpstreamConfig,
    /// Cache policy settings.
    pub cache: CacheConfig,
}

impl Config {
    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = default_config_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Read {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Save configuration to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        std::fs::write(path.as_ref(), content).map_err(|e| ConfigError::Write {
            path: path.as_ref().to_path_buf(),
            source: e,
        })
    }

    /// Validate the configuration and return any errors.
    ///
    /// This checks:
    /// - Server bind address is valid (host:port format)
    /// - Storage path is not empty
    /// - Upstream base URL, when set, is an HTTP URL and the timeout is
    ///   within bounds
    /// - Cache windows are positive and the refresh interval is not
    ///   pathologically short
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        errors.extend(self.server.validate());
        errors.extend(self.storage.validate());
        errors.extend(self.upstream.validate());
        errors.extend(self.cache.validate());

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

impl ServerConfig {
    /// Validate server configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.bind.is_empty() {
            errors.push(ValidationError {
                field: "server.bind".to_string(),
                message: "bind address cannot be empty".to_string(),
            });
        } else {
            let parts: Vec<&str> = self.bind.rsplitn(2, ':').collect();
            if parts.len() != 2 {
                errors.push(ValidationError {
                    field: "server.bind".to_string(),
                    message: format!(
                        "invalid bind address '{}': expected format 'host:port'",
                        self.bind
                    ),
                });
            } else {
                let port_str = parts[0];
                match port_str.parse::<u16>() {
                    Ok(0) => {
                        errors.push(ValidationError {
                            field: "server.bind".to_string(),
                            message: "port cannot be 0".to_string(),
                        });
                    }
                    Err(_) => {
                        errors.push(ValidationError {
                            field: "server.bind".to_string(),
                            message: format!(
                                "invalid port '{}': must be a number 1-65535",
                                port_str
                            ),
                        });
                    }
                    Ok(_) => {}
                }
            }
        }

        errors
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Database file path.
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: nimbus_store::default_db_path(),
        }
    }
}

impl StorageConfig {
    /// Validate storage configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.path.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "storage.path".to_string(),
                message: "database path cannot be empty".to_string(),
            });
        }

        errors
    }
}

/// Upstream provider configuration.
///
/// `base_url` has no default: a deployment must point at a concrete
/// provider endpoint or startup fails. The API key may come from the
/// `OPENWEATHERMAP_API_KEY` environment variable instead of the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Provider endpoint, e.g. "https://api.openweathermap.org/data/2.5/weather".
    pub base_url: String,
    /// API key; the environment variable takes precedence.
    pub api_key: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: None,
            timeout_secs: 10,
        }
    }
}

impl UpstreamConfig {
    /// Resolve the API key: environment variable first, config value as
    /// fallback. Empty values count as absent.
    pub fn resolve_api_key(&self) -> Option<String> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.is_empty())
            .or_else(|| self.api_key.clone().filter(|key| !key.is_empty()))
    }

    /// Per-request timeout as a duration.
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }

    /// Validate upstream configuration.
    ///
    /// A missing base URL or API key is not reported here: both are
    /// checked fatally when the upstream client is constructed, after
    /// environment resolution.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if !self.base_url.is_empty()
            && !self.base_url.starts_with("http://")
            && !self.base_url.starts_with("https://")
        {
            errors.push(ValidationError {
                field: "upstream.base_url".to_string(),
                message: format!(
                    "invalid base URL '{}': must start with http:// or https://",
                    self.base_url
                ),
            });
        }

        if self.timeout_secs < MIN_UPSTREAM_TIMEOUT {
            errors.push(ValidationError {
                field: "upstream.timeout_secs".to_string(),
                message: format!(
                    "timeout {} is too short (minimum {} second)",
                    self.timeout_secs, MIN_UPSTREAM_TIMEOUT
                ),
            });
        } else if self.timeout_secs > MAX_UPSTREAM_TIMEOUT {
            errors.push(ValidationError {
                field: "upstream.timeout_secs".to_string(),
                message: format!(
                    "timeout {} is too long (maximum {} seconds)",
                    self.timeout_secs, MAX_UPSTREAM_TIMEOUT
                ),
            });
        }

        errors
    }
}

/// Cache policy configuration.
///
/// The defaults preserve the reference behavior: records are trusted for
/// one hour and the background refresh runs every thirty minutes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How long a cached record stays fresh, in seconds.
    pub freshness_secs: u64,
    /// How often the background refresher runs, in seconds.
    pub refresh_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            freshness_secs: 3600,
            refresh_interval_secs: 1800,
        }
    }
}

impl CacheConfig {
    /// Freshness window as a duration.
    pub fn freshness(&self) -> time::Duration {
        time::Duration::seconds(self.freshness_secs as i64)
    }

    /// Refresh interval as a duration.
    pub fn refresh_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.refresh_interval_secs)
    }

    /// Validate cache configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.freshness_secs == 0 {
            errors.push(ValidationError {
                field: "cache.freshness_secs".to_string(),
                message: "freshness window must be positive".to_string(),
            });
        }

        if self.refresh_interval_secs < MIN_REFRESH_INTERVAL {
            errors.push(ValidationError {
                field: "cache.refresh_interval_secs".to_string(),
                message: format!(
                    "refresh interval {} is too short (minimum {} seconds)",
                    self.refresh_interval_secs, MIN_REFRESH_INTERVAL
                ),
            });
        }

        errors
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),
    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),
}

/// A single validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The field path (e.g., `server.bind`).
    pub field: String,
    /// Description of the validation failure.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("nimbus")
        .join("server.toml")
}
