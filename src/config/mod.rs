use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set when APP_ENV=production")]
    MissingJwtSecret,

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Full connection URL. Takes precedence over the discrete fields.
    /// `memory:` selects the in-process store.
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub name: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    pub auto_migrate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub max_request_size_bytes: usize,
}

/// Upper bound for `JWT_EXPIRY_HOURS`: one year.
pub const MAX_JWT_EXPIRY_HOURS: u64 = 8760;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub cors_origins: Vec<String>,
    /// Shared secret required to self-register as admin. `None` disables it.
    #[serde(skip_serializing)]
    pub admin_secret: Option<String>,
    /// Shared secret required to self-register as editor. `None` disables it.
    #[serde(skip_serializing)]
    pub editor_secret: Option<String>,
}

impl DatabaseConfig {
    pub fn is_memory(&self) -> bool {
        self.url
            .as_deref()
            .map(|url| url.starts_with("memory:"))
            .unwrap_or(false)
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        let jwt_secret_set = env::var("JWT_SECRET").is_ok();

        // Set defaults based on environment, then override with specific env vars
        let config = match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()?;

        if environment == Environment::Production && !jwt_secret_set {
            return Err(ConfigError::MissingJwtSecret);
        }

        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DB_HOST") {
            self.database.host = v;
        }
        if let Ok(v) = env::var("DB_PORT") {
            self.database.port = parse_var("DB_PORT", &v)?;
        }
        if let Ok(v) = env::var("DB_USER") {
            self.database.user = v;
        }
        if let Ok(v) = env::var("DB_PASSWORD") {
            self.database.password = v;
        }
        if let Ok(v) = env::var("DB_NAME") {
            self.database.name = v;
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_var("DATABASE_MAX_CONNECTIONS", &v)?;
        }
        if let Ok(v) = env::var("DATABASE_ACQUIRE_TIMEOUT_SECS") {
            self.database.acquire_timeout_secs = parse_var("DATABASE_ACQUIRE_TIMEOUT_SECS", &v)?;
        }
        if let Ok(v) = env::var("DATABASE_AUTO_MIGRATE") {
            self.database.auto_migrate = parse_var("DATABASE_AUTO_MIGRATE", &v)?;
        }

        // API overrides
        if let Ok(v) = env::var("PORT") {
            self.api.port = parse_var("PORT", &v)?;
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = parse_var("API_MAX_REQUEST_SIZE_BYTES", &v)?;
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = parse_expiry_hours(&v)?;
        }
        if let Ok(v) = env::var("CORS_ORIGIN") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Ok(v) = env::var("ADMIN_SECRET") {
            self.security.admin_secret = non_empty(v);
        }
        if let Ok(v) = env::var("EDITOR_SECRET") {
            self.security.editor_secret = non_empty(v);
        }

        if let Ok(v) = env::var("LOG_LEVEL") {
            self.log_level = v;
        }

        Ok(self)
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                url: None,
                host: "localhost".to_string(),
                port: 5432,
                user: "postgres".to_string(),
                password: "postgres".to_string(),
                name: "payroll".to_string(),
                max_connections: 10,
                acquire_timeout_secs: 60,
                auto_migrate: true,
            },
            api: ApiConfig {
                port: 3000,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                jwt_secret: "dev-secret-change-in-production".to_string(),
                jwt_expiry_hours: 24,
                cors_origins: vec!["http://localhost:3000".to_string()],
                admin_secret: Some("adminsecret".to_string()),
                editor_secret: Some("editorsecret".to_string()),
            },
            log_level: "debug".to_string(),
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                url: None,
                host: "localhost".to_string(),
                port: 5432,
                user: "payroll".to_string(),
                password: String::new(),
                name: "payroll".to_string(),
                max_connections: 20,
                acquire_timeout_secs: 10,
                auto_migrate: true,
            },
            api: ApiConfig {
                port: 3000,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                jwt_secret: "staging-secret-change-me".to_string(),
                jwt_expiry_hours: 12,
                cors_origins: vec!["https://staging.example.com".to_string()],
                admin_secret: None,
                editor_secret: None,
            },
            log_level: "info".to_string(),
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                url: None,
                host: "localhost".to_string(),
                port: 5432,
                user: "payroll".to_string(),
                password: String::new(),
                name: "payroll".to_string(),
                max_connections: 50,
                acquire_timeout_secs: 5,
                auto_migrate: false,
            },
            api: ApiConfig {
                port: 3000,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
                cors_origins: vec!["https://app.example.com".to_string()],
                admin_secret: None,
                editor_secret: None,
            },
            log_level: "info".to_string(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name,
        value: value.to_string(),
    })
}

fn parse_expiry_hours(value: &str) -> Result<u64, ConfigError> {
    let hours: u64 = parse_var("JWT_EXPIRY_HOURS", value)?;
    if hours == 0 || hours > MAX_JWT_EXPIRY_HOURS {
        return Err(ConfigError::InvalidValue {
            name: "JWT_EXPIRY_HOURS",
            value: value.to_string(),
        });
    }
    Ok(hours)
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
