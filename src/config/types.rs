//! Configuration types for matchforge
//!
//! This module defines the configuration structure that can be loaded from
//! TOML files and/or environment variables.

use serde::Deserialize;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// IAM connection and authorization settings
    pub iam: IamConfig,

    /// gRPC server settings
    pub server: ServerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// IAM connection configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IamConfig {
    /// IAM base URL (e.g. `https://iam.example.net/iam`)
    pub base_url: String,

    /// OAuth client id for the client-credentials grant
    pub client_id: String,

    /// OAuth client secret (prefer env var IAM_CLIENT_SECRET)
    #[serde(default)]
    pub client_secret: Option<String>,

    /// Namespace this service runs in
    pub namespace: String,

    /// Resource name guarded by the authorization interceptor
    pub resource_name: String,

    /// Seconds between background JWKS/revocation refreshes
    pub fetch_interval_secs: u64,

    /// Publisher namespace, used for cross-namespace permission grants
    #[serde(default)]
    pub publisher_namespace: Option<String>,

    /// Whether cross-namespace grants through the publisher namespace
    /// are honored
    pub allow_cross_namespace: bool,

    /// Request timeout in seconds for IAM calls
    pub timeout_secs: u64,
}

impl Default for IamConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            client_id: String::new(),
            client_secret: None,
            namespace: String::new(),
            resource_name: "MATCHMAKING".to_string(),
            fetch_interval_secs: 300,
            publisher_namespace: None,
            allow_cross_namespace: false,
            timeout_secs: 30,
        }
    }
}

/// gRPC server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind host
    pub host: String,

    /// Bind port
    pub port: u16,

    /// Serve gRPC reflection alongside the match function
    pub enable_reflection: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 6565,
            enable_reflection: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,

    /// Emit JSON log lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
