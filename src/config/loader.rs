//! Configuration loader with layered sources
//!
//! Loads configuration from multiple sources with the following precedence
//! (highest to lowest):
//! 1. Environment variables (MATCHFORGE_*)
//! 2. Configuration file (TOML)
//! 3. Default values

use crate::config::types::AppConfig;
use crate::error::ConfigError;
use config::{Config, Environment, File, FileFormat};
use std::path::Path;

/// Default configuration file paths to check (in order)
const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "matchforge.toml",
    ".matchforge.toml",
    "/etc/matchforge/config.toml",
];

/// Load configuration from a TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from_str(toml_str, FileFormat::Toml))
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// Load configuration from files and environment
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. Start with defaults (handled by serde defaults on AppConfig)

    // 2. Add configuration file
    if let Some(path) = config_path {
        // Explicit path provided - must exist
        if !Path::new(path).exists() {
            return Err(ConfigError::Load(format!(
                "Configuration file not found: {}",
                path
            )));
        }
        builder = builder.add_source(File::new(path, FileFormat::Toml));
    } else {
        // Try default paths (first existing one wins)
        for path in DEFAULT_CONFIG_PATHS {
            if Path::new(path).exists() {
                builder = builder.add_source(File::new(path, FileFormat::Toml));
                break;
            }
        }
    }

    // 3. Add environment variables with MATCHFORGE_ prefix
    // e.g., MATCHFORGE_IAM__BASE_URL, MATCHFORGE_SERVER__PORT
    // Double underscore (__) maps to nested keys (iam.base_url)
    builder = builder.add_source(
        Environment::with_prefix("MATCHFORGE")
            .separator("__")
            .try_parsing(true),
    );

    // 4. Handle the well-known IAM environment variables
    for (env_var, key) in &[
        ("IAM_BASE_URL", "iam.base_url"),
        ("IAM_CLIENT_ID", "iam.client_id"),
        ("IAM_CLIENT_SECRET", "iam.client_secret"),
        ("IAM_NAMESPACE", "iam.namespace"),
    ] {
        if let Ok(value) = std::env::var(env_var)
            && !value.is_empty()
        {
            builder = builder
                .set_override(*key, value)
                .map_err(|e| ConfigError::Load(e.to_string()))?;
        }
    }

    // Build and deserialize
    let config = builder
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// Validate configuration values
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.iam.base_url.is_empty() {
        return Err(ConfigError::Missing {
            field: "iam.base_url".to_string(),
        });
    }

    if config.iam.client_id.is_empty() {
        return Err(ConfigError::Missing {
            field: "iam.client_id".to_string(),
        });
    }

    if config.iam.namespace.is_empty() {
        return Err(ConfigError::Missing {
            field: "iam.namespace".to_string(),
        });
    }

    if config.iam.resource_name.is_empty() {
        return Err(ConfigError::Missing {
            field: "iam.resource_name".to_string(),
        });
    }

    if config.iam.fetch_interval_secs == 0 {
        return Err(ConfigError::Invalid {
            message: "iam.fetch_interval_secs must be greater than zero".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [iam]
        base_url = "https://iam.example.net/iam"
        client_id = "client-1"
        namespace = "accelfleet"
    "#;

    #[test]
    fn test_minimal_config() {
        let config = load_config_from_str(MINIMAL).unwrap();
        assert_eq!(config.iam.base_url, "https://iam.example.net/iam");
        assert_eq!(config.iam.namespace, "accelfleet");
        // Defaults fill everything else
        assert_eq!(config.iam.resource_name, "MATCHMAKING");
        assert_eq!(config.server.port, 6565);
    }

    #[test]
    fn test_missing_base_url_rejected() {
        let result = load_config_from_str(
            r#"
            [iam]
            client_id = "client-1"
            namespace = "accelfleet"
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Missing { .. })));
    }

    #[test]
    fn test_zero_fetch_interval_rejected() {
        let result = load_config_from_str(
            r#"
            [iam]
            base_url = "https://iam.example.net/iam"
            client_id = "client-1"
            namespace = "accelfleet"
            fetch_interval_secs = 0
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_explicit_missing_file_rejected() {
        let result = load_config(Some("/nonexistent/matchforge.toml"));
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    #[serial_test::serial]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("config.toml");
        std::fs::write(&file, MINIMAL).unwrap();

        let config = load_config(Some(file.to_str().unwrap())).unwrap();
        assert_eq!(config.iam.client_id, "client-1");
    }

    #[test]
    #[serial_test::serial]
    fn test_well_known_env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("config.toml");
        std::fs::write(&file, MINIMAL).unwrap();

        unsafe {
            std::env::set_var("IAM_NAMESPACE", "from-env");
        }
        let config = load_config(Some(file.to_str().unwrap())).unwrap();
        unsafe {
            std::env::remove_var("IAM_NAMESPACE");
        }

        assert_eq!(config.iam.namespace, "from-env");
    }

    #[test]
    fn test_server_overrides() {
        let config = load_config_from_str(
            r#"
            [iam]
            base_url = "https://iam.example.net/iam"
            client_id = "client-1"
            namespace = "accelfleet"

            [server]
            port = 50051
            enable_reflection = true
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 50051);
        assert!(config.server.enable_reflection);
    }
}
