use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub password: PasswordConfig,
    pub registration: RegistrationConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub access_secret: String,
    #[serde(skip_serializing)]
    pub refresh_secret: String,
    pub access_ttl_minutes: u64,
    pub refresh_ttl_days: u64,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

/// Ten years; longer token lifetimes are rejected at startup
const MAX_TTL_DAYS: u64 = 3650;

impl SecurityConfig {
    pub fn access_ttl(&self) -> Duration {
        Duration::from_secs(self.access_ttl_minutes.saturating_mul(60))
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_ttl_days.saturating_mul(24 * 60 * 60))
    }
}

/// Argon2id cost parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordConfig {
    pub time_cost: u32,
    pub memory_kib: u32,
    pub threads: u32,
    pub key_length: usize,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            time_cost: 1,
            memory_kib: 64 * 1024,
            threads: 4,
            key_length: 32,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationConfig {
    pub capability_policy: CapabilityPolicy,
}

/// Which combinations of `is_supplier` / `is_constructor` a signup may request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityPolicy {
    /// One flag or both
    AtLeastOne,
    /// Exactly one flag
    ExactlyOne,
}

impl CapabilityPolicy {
    pub fn permits(&self, is_supplier: bool, is_constructor: bool) -> bool {
        match self {
            CapabilityPolicy::AtLeastOne => is_supplier || is_constructor,
            CapabilityPolicy::ExactlyOne => is_supplier != is_constructor,
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "at_least_one" | "at-least-one" => Some(CapabilityPolicy::AtLeastOne),
            "exactly_one" | "exactly-one" => Some(CapabilityPolicy::ExactlyOne),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid configuration for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }

        // API overrides
        if let Ok(v) = env::var("API_PORT").or_else(|_| env::var("PORT")) {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ACCESS_SECRET").or_else(|_| env::var("ACCESS_SECRET")) {
            self.security.access_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_REFRESH_SECRET").or_else(|_| env::var("REFRESH_SECRET")) {
            self.security.refresh_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_ACCESS_TTL_MINUTES") {
            self.security.access_ttl_minutes = v.parse().unwrap_or(self.security.access_ttl_minutes);
        }
        if let Ok(v) = env::var("SECURITY_REFRESH_TTL_DAYS") {
            self.security.refresh_ttl_days = v.parse().unwrap_or(self.security.refresh_ttl_days);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        // Password hashing overrides
        if let Ok(v) = env::var("PASSWORD_TIME_COST") {
            self.password.time_cost = v.parse().unwrap_or(self.password.time_cost);
        }
        if let Ok(v) = env::var("PASSWORD_MEMORY_KIB") {
            self.password.memory_kib = v.parse().unwrap_or(self.password.memory_kib);
        }
        if let Ok(v) = env::var("PASSWORD_THREADS") {
            self.password.threads = v.parse().unwrap_or(self.password.threads);
        }
        if let Ok(v) = env::var("PASSWORD_KEY_LENGTH") {
            self.password.key_length = v.parse().unwrap_or(self.password.key_length);
        }

        if let Ok(v) = env::var("REGISTRATION_CAPABILITY_POLICY") {
            self.registration.capability_policy =
                CapabilityPolicy::parse(&v).unwrap_or(self.registration.capability_policy);
        }

        if let Ok(v) = env::var("STORE_BACKEND") {
            self.store.backend = match v.to_ascii_lowercase().as_str() {
                "memory" => StoreBackend::Memory,
                "postgres" | "postgresql" => StoreBackend::Postgres,
                _ => self.store.backend,
            };
        }

        self
    }

    /// Reject combinations the server cannot safely run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.access_secret.is_empty() {
            return Err(ConfigError::Missing("SECURITY_ACCESS_SECRET"));
        }
        if self.security.refresh_secret.is_empty() {
            return Err(ConfigError::Missing("SECURITY_REFRESH_SECRET"));
        }
        if self.security.access_secret == self.security.refresh_secret
            && self.environment == Environment::Production
        {
            return Err(ConfigError::Invalid {
                field: "SECURITY_REFRESH_SECRET",
                reason: "must differ from the access secret".to_string(),
            });
        }
        if self.store.backend == StoreBackend::Postgres && self.database.url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }
        if self.security.access_ttl_minutes == 0
            || self.security.access_ttl_minutes > MAX_TTL_DAYS * 24 * 60
        {
            return Err(ConfigError::Invalid {
                field: "SECURITY_ACCESS_TTL_MINUTES",
                reason: format!("{} is out of range", self.security.access_ttl_minutes),
            });
        }
        if self.security.refresh_ttl_days == 0 || self.security.refresh_ttl_days > MAX_TTL_DAYS {
            return Err(ConfigError::Invalid {
                field: "SECURITY_REFRESH_TTL_DAYS",
                reason: format!("{} is out of range", self.security.refresh_ttl_days),
            });
        }
        if self.password.key_length < 16 {
            return Err(ConfigError::Invalid {
                field: "PASSWORD_KEY_LENGTH",
                reason: format!("{} bytes is too short", self.password.key_length),
            });
        }
        Ok(())
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
                run_migrations: true,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                access_secret: "dev-access-secret".to_string(),
                refresh_secret: "dev-refresh-secret".to_string(),
                access_ttl_minutes: 15,
                refresh_ttl_days: 30,
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            },
            password: PasswordConfig::default(),
            registration: RegistrationConfig {
                capability_policy: CapabilityPolicy::AtLeastOne,
            },
            store: StoreConfig {
                backend: StoreBackend::Postgres,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
                run_migrations: true,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                access_secret: String::new(),
                refresh_secret: String::new(),
                access_ttl_minutes: 15,
                refresh_ttl_days: 30,
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
            password: PasswordConfig::default(),
            registration: RegistrationConfig {
                capability_policy: CapabilityPolicy::AtLeastOne,
            },
            store: StoreConfig {
                backend: StoreBackend::Postgres,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
                run_migrations: false,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: false,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            security: SecurityConfig {
                access_secret: String::new(),
                refresh_secret: String::new(),
                access_ttl_minutes: 15,
                refresh_ttl_days: 30,
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
            password: PasswordConfig::default(),
            registration: RegistrationConfig {
                capability_policy: CapabilityPolicy::AtLeastOne,
            },
            store: StoreConfig {
                backend: StoreBackend::Postgres,
            },
        }
    }

    /// In-memory configuration with cheap password hashing, for tests and local demos.
    pub fn in_memory() -> Self {
        let mut config = Self::development();
        config.store.backend = StoreBackend::Memory;
        config.password = PasswordConfig {
            time_cost: 1,
            memory_kib: 1024,
            threads: 1,
            key_length: 32,
        };
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.security.access_ttl(), Duration::from_secs(15 * 60));
        assert_eq!(config.security.refresh_ttl(), Duration::from_secs(30 * 24 * 60 * 60));
        assert_eq!(config.registration.capability_policy, CapabilityPolicy::AtLeastOne);
        assert_eq!(config.password.memory_kib, 64 * 1024);
    }

    #[test]
    fn test_production_requires_secrets() {
        let mut config = AppConfig::production();
        config.database.url = Some("postgres://localhost/teklif".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::Missing("SECURITY_ACCESS_SECRET"))));

        config.security.access_secret = "a".to_string();
        config.security.refresh_secret = "a".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));

        config.security.refresh_secret = "b".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_postgres_backend_requires_url() {
        let config = AppConfig::development();
        assert!(matches!(config.validate(), Err(ConfigError::Missing("DATABASE_URL"))));
        assert!(AppConfig::in_memory().validate().is_ok());
    }

    #[test]
    fn test_huge_ttls_saturate_and_are_rejected() {
        let mut config = AppConfig::in_memory();
        config.security.access_ttl_minutes = u64::MAX;
        config.security.refresh_ttl_days = u64::MAX;

        assert_eq!(config.security.access_ttl(), Duration::from_secs(u64::MAX));
        assert_eq!(config.security.refresh_ttl(), Duration::from_secs(u64::MAX));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "SECURITY_ACCESS_TTL_MINUTES", .. })
        ));

        config.security.access_ttl_minutes = 15;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "SECURITY_REFRESH_TTL_DAYS", .. })
        ));

        config.security.refresh_ttl_days = 30;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_capability_policies() {
        assert!(CapabilityPolicy::AtLeastOne.permits(true, true));
        assert!(CapabilityPolicy::AtLeastOne.permits(false, true));
        assert!(!CapabilityPolicy::AtLeastOne.permits(false, false));

        assert!(!CapabilityPolicy::ExactlyOne.permits(true, true));
        assert!(CapabilityPolicy::ExactlyOne.permits(true, false));
        assert!(!CapabilityPolicy::ExactlyOne.permits(false, false));

        assert_eq!(CapabilityPolicy::parse("exactly-one"), Some(CapabilityPolicy::ExactlyOne));
        assert_eq!(CapabilityPolicy::parse("whatever"), None);
    }
}
