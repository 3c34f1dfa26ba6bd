//! Application configuration management

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand::RngCore;

use crate::services::{AuthConfig, LogFormat};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address (default: all interfaces)
    pub host: Option<String>,

    /// Server port
    pub port: u16,

    /// SQLite URL, e.g. `sqlite://./data/bookshelf.db`
    pub database_url: String,

    pub database_max_connections: u32,

    /// HS256 secret for session tokens
    pub session_secret: String,

    /// True when no SESSION_SECRET was set and a random one was generated.
    /// Sessions then do not survive a restart.
    pub session_secret_generated: bool,

    /// Session lifetime in seconds
    pub session_max_age: i64,

    /// Age in seconds after which the session cookie is re-issued
    pub session_update_age: i64,

    pub bcrypt_cost: u32,

    /// Send the session cookie only over HTTPS
    pub session_cookie_secure: bool,

    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let (session_secret, session_secret_generated) = match env::var("SESSION_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => (secret.trim().to_string(), false),
            _ => (generate_secret(), true),
        };

        Ok(Self {
            host: env::var("HOST").ok(),

            port: parse_env("PORT", 3001)?,

            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://./data/bookshelf.db".to_string()),

            database_max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 10)?,

            session_secret,
            session_secret_generated,

            session_max_age: parse_env("SESSION_MAX_AGE", AuthConfig::DEFAULT_MAX_AGE)?,

            session_update_age: parse_env("SESSION_UPDATE_AGE", AuthConfig::DEFAULT_UPDATE_AGE)?,

            bcrypt_cost: parse_env("BCRYPT_COST", AuthConfig::DEFAULT_BCRYPT_COST)?,

            session_cookie_secure: env::var("SESSION_COOKIE_SECURE")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),

            log_format: parse_env("LOG_FORMAT", LogFormat::Json)?,
        })
    }

    /// Socket address to listen on
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let ip = match &self.host {
            Some(host) if host == "localhost" => IpAddr::V4(Ipv4Addr::LOCALHOST),
            Some(host) => host
                .parse::<IpAddr>()
                .with_context(|| format!("Invalid HOST: {}", host))?,
            None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };

        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            session_secret: self.session_secret.clone(),
            session_max_age: self.session_max_age,
            session_update_age: self.session_update_age,
            bcrypt_cost: self.bcrypt_cost,
            cookie_secure: self.session_cookie_secure,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: None,
            port: 3001,
            database_url: "sqlite://./data/bookshelf.db".to_string(),
            database_max_connections: 10,
            session_secret: generate_secret(),
            session_secret_generated: true,
            session_max_age: AuthConfig::DEFAULT_MAX_AGE,
            session_update_age: AuthConfig::DEFAULT_UPDATE_AGE,
            bcrypt_cost: AuthConfig::DEFAULT_BCRYPT_COST,
            session_cookie_secure: false,
            log_format: LogFormat::Json,
        }
    }
}

fn parse_env<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Into<anyhow::Error>,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map_err(Into::<anyhow::Error>::into)
            .with_context(|| format!("Invalid {}", name)),
        Err(_) => Ok(default),
    }
}

/// Random 256-bit secret for development runs
fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    BASE64.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_secrets_differ() {
        let a = generate_secret();
        let b = generate_secret();
        assert_ne!(a, b);
        assert_eq!(BASE64.decode(&a).unwrap().len(), 32);
    }

    #[test]
    fn test_bind_addr() {
        let config = Config {
            host: Some("127.0.0.1".to_string()),
            port: 8080,
            ..Default::default()
        };
        assert_eq!(config.bind_addr().unwrap().to_string(), "127.0.0.1:8080");

        let config = Config::default();
        assert_eq!(config.bind_addr().unwrap().to_string(), "0.0.0.0:3001");

        let config = Config {
            host: Some("not an ip".to_string()),
            ..Default::default()
        };
        assert!(config.bind_addr().is_err());
    }

    #[test]
    fn test_auth_config_carries_session_settings() {
        let config = Config {
            session_secret: "s3cret".to_string(),
            bcrypt_cost: 4,
            ..Default::default()
        };
        let auth = config.auth_config();
        assert_eq!(auth.session_secret, "s3cret");
        assert_eq!(auth.bcrypt_cost, 4);
        assert_eq!(auth.session_max_age, 2_592_000);
        assert_eq!(auth.session_update_age, 86_400);
    }
}
