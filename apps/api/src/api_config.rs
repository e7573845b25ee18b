use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use laurel_core::AppError;
use tracing_subscriber::EnvFilter;

/// Backend holding resolved role permission sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionCacheConfig {
    Memory,
    Redis { url: String },
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub database_url: String,
    pub mongodb_url: String,
    pub mongodb_database: String,
    pub jwt_secret: String,
    pub frontend_url: String,
    pub api_host: String,
    pub api_port: u16,
    pub permission_cache: PermissionCacheConfig,
    pub permission_cache_ttl: Duration,
    pub document_store_timeout: Duration,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

        let database_url = required_env("DATABASE_URL")?;
        let mongodb_url = if migrate_only {
            env::var("MONGODB_URL").unwrap_or_default()
        } else {
            required_non_empty_env("MONGODB_URL")?
        };
        let mongodb_database =
            env::var("MONGODB_DATABASE").unwrap_or_else(|_| "laurel".to_owned());

        let jwt_secret = if migrate_only {
            env::var("JWT_SECRET").unwrap_or_default()
        } else {
            required_env("JWT_SECRET")?
        };
        if !migrate_only && jwt_secret.len() < 32 {
            return Err(AppError::Validation(
                "JWT_SECRET must be at least 32 characters".to_owned(),
            ));
        }

        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());
        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);

        let permission_cache = match env::var("PERMISSION_CACHE_BACKEND")
            .unwrap_or_else(|_| "memory".to_owned())
            .as_str()
        {
            "memory" => PermissionCacheConfig::Memory,
            "redis" => PermissionCacheConfig::Redis {
                url: required_non_empty_env("REDIS_URL")?,
            },
            other => {
                return Err(AppError::Validation(format!(
                    "PERMISSION_CACHE_BACKEND must be either 'memory' or 'redis', got '{other}'"
                )));
            }
        };

        let permission_cache_ttl =
            Duration::from_secs(seconds_env("PERMISSION_CACHE_TTL_SECONDS", 300)?);
        let document_store_timeout =
            Duration::from_secs(seconds_env("DOCUMENT_STORE_TIMEOUT_SECONDS", 10)?);
        if document_store_timeout.is_zero() {
            return Err(AppError::Validation(
                "DOCUMENT_STORE_TIMEOUT_SECONDS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            migrate_only,
            database_url,
            mongodb_url,
            mongodb_database,
            jwt_secret,
            frontend_url,
            api_host,
            api_port,
            permission_cache,
            permission_cache_ttl,
            document_store_timeout,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn required_non_empty_env(name: &str) -> Result<String, AppError> {
    let value = required_env(name)?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}

fn seconds_env(name: &str, default: u64) -> Result<u64, AppError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<u64>()
            .map_err(|error| AppError::Validation(format!("invalid {name}: {error}"))),
        _ => Ok(default),
    }
}
