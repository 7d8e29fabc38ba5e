use std::env;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::auth::password;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Clone)]
pub struct SecurityConfig {
    pub admin_username: String,
    /// PHC hash; plaintext passwords are hashed while loading
    pub admin_password_hash: String,
    pub jwt_secret: String,
    pub token_expiry_minutes: i64,
    /// Empty means any origin
    pub cors_origins: Vec<String>,
}

impl fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("admin_username", &self.admin_username)
            .field("admin_password_hash", &"<redacted>")
            .field("jwt_secret", &"<redacted>")
            .field("token_expiry_minutes", &self.token_expiry_minutes)
            .field("cors_origins", &self.cors_origins)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set in the environment")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {message}")]
    Invalid { var: &'static str, message: String },

    #[error("SECRET_KEY must be at least {min} bytes in production")]
    WeakSecret { min: usize },

    #[error("Could not hash ADMIN_PASSWORD: {0}")]
    PasswordHash(#[from] password::PasswordError),
}

const MIN_PRODUCTION_SECRET_BYTES: usize = 32;

/// One year
pub const MAX_TOKEN_EXPIRY_MINUTES: i64 = 365 * 24 * 60;

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup; `from_env` passes the
    /// process environment
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let environment = match get("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        let api = match environment {
            Environment::Production => Self::production_api(),
            Environment::Staging => Self::staging_api(),
            Environment::Development => Self::development_api(),
        };

        let jwt_secret = get("SECRET_KEY")
            .or_else(|| get("JWT_SECRET"))
            .ok_or(ConfigError::Missing("SECRET_KEY"))?;
        if environment == Environment::Production && jwt_secret.len() < MIN_PRODUCTION_SECRET_BYTES {
            return Err(ConfigError::WeakSecret {
                min: MIN_PRODUCTION_SECRET_BYTES,
            });
        }

        let admin_password_hash = match (get("ADMIN_PASSWORD_HASH"), lookup("ADMIN_PASSWORD")) {
            (Some(hash), _) => {
                if !password::is_phc_hash(&hash) {
                    return Err(ConfigError::Invalid {
                        var: "ADMIN_PASSWORD_HASH",
                        message: "expected a PHC string such as $pbkdf2-sha256$...".to_string(),
                    });
                }
                hash
            }
            (None, Some(plain)) if !plain.is_empty() => {
                password::hash_password(&plain)?
            }
            _ => return Err(ConfigError::Missing("ADMIN_PASSWORD")),
        };

        let mut config = Self {
            environment,
            server: ServerConfig {
                host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(get("PORT"), "PORT", 8000)?,
            },
            storage: StorageConfig {
                data_file: get("DATA_FILE")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("deliveries.json")),
            },
            api,
            security: SecurityConfig {
                admin_username: get("ADMIN_USERNAME").unwrap_or_else(|| "admin".to_string()),
                admin_password_hash,
                jwt_secret,
                token_expiry_minutes: parse_or(get("ACCESS_TOKEN_EXPIRE_MINUTES"), "ACCESS_TOKEN_EXPIRE_MINUTES", 30)?,
                cors_origins: parse_origins(get("CORS_ORIGINS")),
            },
        };

        if !(1..=MAX_TOKEN_EXPIRY_MINUTES).contains(&config.security.token_expiry_minutes) {
            return Err(ConfigError::Invalid {
                var: "ACCESS_TOKEN_EXPIRE_MINUTES",
                message: format!("must be between 1 and {} minutes", MAX_TOKEN_EXPIRY_MINUTES),
            });
        }

        if let Some(v) = get("API_ENABLE_REQUEST_LOGGING") {
            config.api.enable_request_logging = v.parse().unwrap_or(config.api.enable_request_logging);
        }
        if let Some(v) = get("API_MAX_REQUEST_SIZE_BYTES") {
            config.api.max_request_size_bytes = v.parse().unwrap_or(config.api.max_request_size_bytes);
        }

        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    fn development_api() -> ApiConfig {
        ApiConfig {
            enable_request_logging: true,
            max_request_size_bytes: 1024 * 1024, // 1MB
        }
    }

    fn staging_api() -> ApiConfig {
        ApiConfig {
            enable_request_logging: true,
            max_request_size_bytes: 256 * 1024,
        }
    }

    fn production_api() -> ApiConfig {
        ApiConfig {
            enable_request_logging: false,
            max_request_size_bytes: 64 * 1024,
        }
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, var: &'static str, default: T) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
            var,
            message: format!("could not parse '{}'", v),
        }),
    }
}

fn parse_origins(value: Option<String>) -> Vec<String> {
    match value.as_deref() {
        None | Some("*") => Vec::new(),
        Some(list) => list
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty() && s != "*")
            .collect(),
    }
}
