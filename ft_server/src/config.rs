//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use football_tournament::{
    db::DatabaseConfig, sync::SyncConfig, tournament::TournamentConfig,
};
use std::net::SocketAddr;
use std::str::FromStr;

/// Default bind address
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// Minimum admin secret pepper length
pub const MIN_PEPPER_LEN: usize = 16;

/// Where tournaments and players are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// In-process store; everything is lost on restart
    Memory,
    /// PostgreSQL with push notifications
    Postgres,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            other => Err(ConfigError::Invalid {
                var: "STORAGE_BACKEND".to_string(),
                reason: format!("expected memory or postgres, got {:?}", other),
            }),
        }
    }
}

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Storage backend
    pub backend: StorageBackend,
    /// Database configuration (postgres backend only)
    pub database: DatabaseConfig,
    /// Cache and subscription settings
    pub sync: SyncConfig,
    /// Format applied to new tournaments
    pub tournament: TournamentConfig,
    /// Security configuration
    pub security: SecurityConfig,
    /// Prometheus exporter address; disabled when unset
    pub metrics_bind: Option<SocketAddr>,
    /// Page that share links point at
    pub share_base_url: String,
}

/// Security-related configuration
#[derive(Clone)]
pub struct SecurityConfig {
    /// Pepper mixed into every admin secret hash (required)
    pub admin_secret_pepper: String,
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("admin_secret_pepper", &"<redacted>")
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `database_url_override` - Optional database URL override (from CLI args)
    /// * `backend_override` - Optional storage backend override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
        backend_override: Option<StorageBackend>,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_addr("SERVER_BIND", std::env::var("SERVER_BIND").ok())?
                .map_or_else(default_bind, Ok)?,
        };

        let backend = match backend_override {
            Some(backend) => backend,
            None => match std::env::var("STORAGE_BACKEND") {
                Ok(value) => value.parse()?,
                Err(_) => StorageBackend::Memory,
            },
        };

        let mut database = DatabaseConfig::from_env();
        if let Some(url) = database_url_override {
            database.database_url = url;
        }

        let admin_secret_pepper =
            std::env::var("ADMIN_SECRET_PEPPER").map_err(|_| ConfigError::MissingRequired {
                var: "ADMIN_SECRET_PEPPER".to_string(),
                hint: "Generate with: openssl rand -hex 16".to_string(),
            })?;

        let metrics_bind = parse_addr("METRICS_BIND", std::env::var("METRICS_BIND").ok())?;

        Ok(ServerConfig {
            bind,
            backend,
            database,
            sync: SyncConfig::from_env(),
            tournament: TournamentConfig::from_env(),
            security: SecurityConfig {
                admin_secret_pepper,
            },
            metrics_bind,
            share_base_url: parse_env_or(
                "SHARE_BASE_URL",
                format!("http://{}/view", bind),
            ),
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.admin_secret_pepper.len() < MIN_PEPPER_LEN {
            return Err(ConfigError::Invalid {
                var: "ADMIN_SECRET_PEPPER".to_string(),
                reason: format!("Must be at least {} characters", MIN_PEPPER_LEN),
            });
        }

        self.tournament
            .validate()
            .map_err(|e| ConfigError::Invalid {
                var: "TOURNAMENT_*".to_string(),
                reason: e.to_string(),
            })?;

        if self.backend == StorageBackend::Postgres && self.database.database_url.is_empty() {
            return Err(ConfigError::Invalid {
                var: "DATABASE_URL".to_string(),
                reason: "Must not be empty with the postgres backend".to_string(),
            });
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid {
                var: "DB_MIN_CONNECTIONS".to_string(),
                reason: format!(
                    "Must not exceed max connections ({})",
                    self.database.max_connections
                ),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

fn default_bind() -> Result<SocketAddr, ConfigError> {
    DEFAULT_BIND.parse().map_err(|_| ConfigError::Invalid {
        var: "SERVER_BIND".to_string(),
        reason: format!("default {} is not an address", DEFAULT_BIND),
    })
}

fn parse_addr(var: &str, value: Option<String>) -> Result<Option<SocketAddr>, ConfigError> {
    match value {
        None => Ok(None),
        Some(value) => value.parse().map(Some).map_err(|_| ConfigError::Invalid {
            var: var.to_string(),
            reason: format!("{:?} is not an IP:PORT address", value),
        }),
    }
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn config() -> ServerConfig {
        ServerConfig {
            bind: "127.0.0.1:8080".parse().unwrap(),
            backend: StorageBackend::Memory,
            database: DatabaseConfig::development(),
            sync: SyncConfig::default(),
            tournament: TournamentConfig::default(),
            security: SecurityConfig {
                admin_secret_pepper: "a".repeat(16),
            },
            metrics_bind: None,
            share_base_url: "http://localhost:8080/view".to_string(),
        }
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingRequired {
            var: "ADMIN_SECRET_PEPPER".to_string(),
            hint: "Use openssl".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("ADMIN_SECRET_PEPPER"));
        assert!(msg.contains("Use openssl"));
    }

    #[test]
    fn test_valid_config() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_short_pepper_rejected() {
        let mut config = config();
        config.security.admin_secret_pepper = "short".to_string();
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::Invalid { .. }
        ));
    }

    #[test]
    fn test_bad_tournament_format_rejected() {
        let mut config = config();
        config.tournament.knockout_qualifiers = 3;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("TOURNAMENT_"));
    }

    #[test]
    fn test_pepper_not_in_debug_output() {
        let debug = format!("{:?}", config());
        assert!(!debug.contains(&"a".repeat(16)));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_storage_backend_parsing() {
        assert_eq!("memory".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert_eq!(" Postgres ".parse::<StorageBackend>().unwrap(), StorageBackend::Postgres);
        assert!("sqlite".parse::<StorageBackend>().is_err());
    }

    #[test]
    #[serial]
    fn test_from_env() {
        unsafe {
            std::env::set_var("ADMIN_SECRET_PEPPER", "p".repeat(20));
            std::env::set_var("STORAGE_BACKEND", "memory");
            std::env::remove_var("SERVER_BIND");
            std::env::remove_var("METRICS_BIND");
            std::env::remove_var("SHARE_BASE_URL");
        }

        let config = ServerConfig::from_env(None, Some("postgres://db/test".to_string()), None)
            .unwrap();
        assert_eq!(config.bind.to_string(), DEFAULT_BIND);
        assert_eq!(config.backend, StorageBackend::Memory);
        assert_eq!(config.database.database_url, "postgres://db/test");
        assert_eq!(config.share_base_url, "http://127.0.0.1:8080/view");
        assert!(config.metrics_bind.is_none());
        assert!(config.validate().is_ok());

        unsafe {
            std::env::set_var("METRICS_BIND", "not-an-address");
        }
        assert!(matches!(
            ServerConfig::from_env(None, None, None),
            Err(ConfigError::Invalid { .. })
        ));

        unsafe {
            std::env::remove_var("METRICS_BIND");
            std::env::remove_var("ADMIN_SECRET_PEPPER");
            std::env::remove_var("STORAGE_BACKEND");
        }
        assert!(matches!(
            ServerConfig::from_env(None, None, None),
            Err(ConfigError::MissingRequired { .. })
        ));
    }
}
