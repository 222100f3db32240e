// ABOUTME: Environment-variable backed configuration structs for the trip core
// ABOUTME: Fleet API, estimate API, token issuer, storage, and HTTP client settings
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Ride With Vic

//! Environment-based configuration.
//!
//! Defaults mirror the production endpoints of the fleet-telemetry and
//! ride-estimate providers; deployments override them per environment.

use std::env;
use std::path::PathBuf;

use crate::errors::{AppError, AppResult};

/// Default fleet API base URL
const DEFAULT_FLEET_API_BASE: &str = "https://fleet-api.prd.eu.vn.cloud.tesla.com";
/// Default fleet authorization server base URL
const DEFAULT_FLEET_AUTH_URL: &str = "https://auth.tesla.com/oauth2/v3";
/// Default ride-estimate API base URL
const DEFAULT_ESTIMATES_API_BASE: &str = "https://api.uber.com/v1.2";
/// Default OAuth token endpoint for the estimate provider
const DEFAULT_TOKEN_URL: &str = "https://sandbox-login.uber.com/oauth/v2/token";
/// Default OAuth scope requested for estimate lookups
const DEFAULT_TOKEN_SCOPE: &str = "estimatePrice";
/// Default estimate cache time-to-live (15 minutes)
const DEFAULT_ESTIMATE_CACHE_TTL_SECS: u64 = 900;
/// Default storage URL (embedded SQLite database file)
const DEFAULT_STORAGE_URL: &str = "sqlite:vic_ride.db";
/// Default request timeout in seconds
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
/// Default connection timeout in seconds
const DEFAULT_HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Fleet-telemetry provider settings
#[derive(Debug, Clone)]
pub struct FleetApiConfig {
    /// REST API base URL
    pub base_url: String,
    /// Authorization server base URL (authorize/token endpoints live under it)
    pub auth_url: String,
    /// OAuth client id registered with the provider
    pub client_id: String,
    /// OAuth client secret, when the deployment uses a confidential client
    pub client_secret: Option<String>,
    /// Redirect URI for the authorization-code flow
    pub redirect_uri: Option<String>,
}

/// Ride-estimate provider settings
#[derive(Debug, Clone)]
pub struct EstimateApiConfig {
    /// REST API base URL
    pub base_url: String,
    /// Server token used as bearer credential for estimate lookups
    pub server_token: Option<String>,
    /// Estimate cache time-to-live in seconds
    pub cache_ttl_secs: u64,
}

/// Token issuer settings (client-credentials and signed-assertion flows)
#[derive(Debug, Clone)]
pub struct TokenIssuerConfig {
    /// OAuth token endpoint
    pub token_url: String,
    /// Client id for the client-credentials grant
    pub client_id: String,
    /// Client secret for the client-credentials grant
    pub client_secret: String,
    /// Key id (`iss` claim) for the signed-assertion grant
    pub key_id: String,
    /// Application id (`sub` claim) for the signed-assertion grant
    pub application_id: String,
    /// PEM-encoded RSA private key for assertion signing
    pub private_key_pem: Option<String>,
    /// Path to a PEM file, read lazily when `private_key_pem` is unset
    pub private_key_path: Option<PathBuf>,
    /// Default scope requested when the caller does not supply one
    pub scope: String,
}

/// Storage backend settings
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage URL (`memory:` or `sqlite:<path>`)
    pub url: String,
}

/// Outbound HTTP client settings
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_HTTP_CONNECT_TIMEOUT_SECS,
        }
    }
}

/// Top-level configuration for the trip core
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Fleet-telemetry provider settings
    pub fleet: FleetApiConfig,
    /// Ride-estimate provider settings
    pub estimates: EstimateApiConfig,
    /// Token issuer settings
    pub issuer: TokenIssuerConfig,
    /// Storage backend settings
    pub storage: StorageConfig,
    /// Outbound HTTP client settings
    pub http: HttpClientConfig,
}

impl CoreConfig {
    /// Assemble configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns a config error when a numeric variable cannot be parsed.
    pub fn from_env() -> AppResult<Self> {
        Ok(Self {
            fleet: FleetApiConfig {
                base_url: env_var_or("FLEET_API_BASE_URL", DEFAULT_FLEET_API_BASE),
                auth_url: env_var_or("FLEET_AUTH_URL", DEFAULT_FLEET_AUTH_URL),
                client_id: env_var_or("FLEET_CLIENT_ID", ""),
                client_secret: env::var("FLEET_CLIENT_SECRET").ok(),
                redirect_uri: env::var("FLEET_REDIRECT_URI").ok(),
            },
            estimates: EstimateApiConfig {
                base_url: env_var_or("ESTIMATES_API_BASE_URL", DEFAULT_ESTIMATES_API_BASE),
                server_token: env::var("ESTIMATES_SERVER_TOKEN").ok(),
                cache_ttl_secs: env_var_parsed(
                    "ESTIMATES_CACHE_TTL_SECS",
                    DEFAULT_ESTIMATE_CACHE_TTL_SECS,
                )?,
            },
            issuer: TokenIssuerConfig {
                token_url: env_var_or("OAUTH_TOKEN_URL", DEFAULT_TOKEN_URL),
                client_id: env_var_or("OAUTH_CLIENT_ID", ""),
                client_secret: env_var_or("OAUTH_CLIENT_SECRET", ""),
                key_id: env_var_or("OAUTH_KEY_ID", ""),
                application_id: env_var_or("OAUTH_APPLICATION_ID", ""),
                private_key_pem: env::var("OAUTH_PRIVATE_KEY").ok(),
                private_key_path: env::var("OAUTH_PRIVATE_KEY_PATH").ok().map(PathBuf::from),
                scope: env_var_or("OAUTH_SCOPE", DEFAULT_TOKEN_SCOPE),
            },
            storage: StorageConfig {
                url: env_var_or("DATABASE_URL", DEFAULT_STORAGE_URL),
            },
            http: HttpClientConfig {
                timeout_secs: env_var_parsed("HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?,
                connect_timeout_secs: env_var_parsed(
                    "HTTP_CONNECT_TIMEOUT_SECS",
                    DEFAULT_HTTP_CONNECT_TIMEOUT_SECS,
                )?,
            },
        })
    }
}

/// Read an environment variable with a default fallback
fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Read and parse a numeric environment variable with a default fallback
fn env_var_parsed(key: &str, default: u64) -> AppResult<u64> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| AppError::config(format!("{key} must be a number, got '{raw}'"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_defaults_apply_without_environment() {
        for key in [
            "FLEET_API_BASE_URL",
            "ESTIMATES_CACHE_TTL_SECS",
            "DATABASE_URL",
            "HTTP_TIMEOUT_SECS",
        ] {
            env::remove_var(key);
        }

        let config = CoreConfig::from_env().unwrap();
        assert_eq!(config.fleet.base_url, DEFAULT_FLEET_API_BASE);
        assert_eq!(config.estimates.cache_ttl_secs, 900);
        assert_eq!(config.storage.url, DEFAULT_STORAGE_URL);
        assert_eq!(config.http.timeout_secs, 30);
    }

    #[test]
    #[serial]
    fn test_environment_overrides_defaults() {
        env::set_var("FLEET_API_BASE_URL", "https://fleet.example.test");
        env::set_var("ESTIMATES_CACHE_TTL_SECS", "60");

        let config = CoreConfig::from_env().unwrap();
        assert_eq!(config.fleet.base_url, "https://fleet.example.test");
        assert_eq!(config.estimates.cache_ttl_secs, 60);

        env::remove_var("FLEET_API_BASE_URL");
        env::remove_var("ESTIMATES_CACHE_TTL_SECS");
    }

    #[test]
    #[serial]
    fn test_invalid_numbers_are_config_errors() {
        env::set_var("HTTP_TIMEOUT_SECS", "not-a-number");
        let result = CoreConfig::from_env();
        env::remove_var("HTTP_TIMEOUT_SECS");

        assert!(result.is_err());
    }
}
