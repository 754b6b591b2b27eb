use crate::error::AppError;
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const MIN_ACCESS_TOKEN_TTL_SECS: i64 = 60;
pub const MIN_REFRESH_TOKEN_TTL_SECS: i64 = 3600;

const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 15 * 60;
const DEFAULT_REFRESH_TOKEN_TTL_SECS: i64 = 7 * 24 * 3600;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 3600;
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Signing material and token lifetimes handed to the token manager at construction.
#[derive(Clone)]
pub struct JwtConfig {
    secret: String,
    access_token_ttl: i64,
    refresh_token_ttl: i64,
}

impl JwtConfig {
    pub fn new(
        secret: impl Into<String>,
        access_token_ttl: i64,
        refresh_token_ttl: i64,
    ) -> Result<Self, AppError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(AppError::Configuration("JWT secret must not be empty".into()));
        }
        if access_token_ttl < MIN_ACCESS_TOKEN_TTL_SECS {
            return Err(AppError::Configuration(format!(
                "access token lifetime must be at least {} seconds",
                MIN_ACCESS_TOKEN_TTL_SECS
            )));
        }
        if refresh_token_ttl < MIN_REFRESH_TOKEN_TTL_SECS {
            return Err(AppError::Configuration(format!(
                "refresh token lifetime must be at least {} seconds",
                MIN_REFRESH_TOKEN_TTL_SECS
            )));
        }
        Ok(Self {
            secret,
            access_token_ttl,
            refresh_token_ttl,
        })
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn access_token_ttl(&self) -> i64 {
        self.access_token_ttl
    }

    pub fn refresh_token_ttl(&self) -> i64 {
        self.refresh_token_ttl
    }
}

// Keeps the secret out of logs.
impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub server_port: u16,
    pub server_host: String,
    pub jwt: JwtConfig,
    pub token_sweep_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| AppError::Configuration(format!("{} must be set", key)))
        };

        let jwt = JwtConfig::new(
            required("JWT_SECRET")?,
            parse_or(&lookup, "ACCESS_TOKEN_TTL_SECS", DEFAULT_ACCESS_TOKEN_TTL_SECS)?,
            parse_or(&lookup, "REFRESH_TOKEN_TTL_SECS", DEFAULT_REFRESH_TOKEN_TTL_SECS)?,
        )?;

        let sweep_secs: u64 = parse_or(&lookup, "TOKEN_SWEEP_INTERVAL_SECS", DEFAULT_SWEEP_INTERVAL_SECS)?;
        if sweep_secs == 0 {
            return Err(AppError::Configuration(
                "TOKEN_SWEEP_INTERVAL_SECS must be greater than zero".into(),
            ));
        }

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            database_max_connections: parse_or(
                &lookup,
                "DATABASE_MAX_CONNECTIONS",
                DEFAULT_MAX_CONNECTIONS,
            )?,
            server_port: parse_or(&lookup, "SERVER_PORT", 8080)?,
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            jwt,
            token_sweep_interval: Duration::from_secs(sweep_secs),
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Configuration(format!("{} must be a number", key))),
        None => Ok(default),
    }
}
