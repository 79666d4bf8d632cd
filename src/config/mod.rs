//! Configuration module for the speech relay
//!
//! This module handles server configuration from various sources: .env files, YAML files,
//! and environment variables. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//! - `utils`: Utility functions for configuration parsing
//!
//! # Example
//! ```rust,no_run
//! use speak_relay::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

mod env;
mod merge;
mod utils;
mod validation;
mod yaml;

pub use env::{DEFAULT_HOST, DEFAULT_PORT};

use crate::core::speech::{BackendKind, EngineConfig};

/// TLS configuration for HTTPS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
}

/// Server configuration
///
/// Contains all configuration needed to run the relay:
/// - Server settings (host, port, TLS)
/// - Speech backend selection
/// - Engine settings (rate, volume, voice, greeting, voice augmentation)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // TLS configuration (optional)
    pub tls: Option<TlsConfig>,

    // Speech settings
    pub speech_backend: BackendKind,
    pub speech: EngineConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            tls: None,
            speech_backend: BackendKind::default(),
            speech: EngineConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// Unset variables fall back to defaults. The result is validated.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let config = merge::merge_config(None)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    ///
    /// After loading and merging, performs validation on the final configuration.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        // Note: .env file is loaded in main.rs at application startup
        let yaml_config = yaml::YamlConfig::from_file(path)?;

        let config = merge::merge_config(Some(yaml_config))?;
        config.validate()?;

        Ok(config)
    }

    /// Validate speech and TLS settings
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        validation::validate_speech_config(&self.speech)?;
        validation::validate_tls_config(&self.tls)?;
        Ok(())
    }

    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if TLS is enabled
    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::speech::AugmentPolicy;
    use serial_test::serial;
    use std::env;
    use std::fs;
    use tempfile::TempDir;

    const ENV_VARS: &[&str] = &[
        "HOST",
        "PORT",
        "TLS_ENABLED",
        "TLS_CERT_PATH",
        "TLS_KEY_PATH",
        "SPEECH_BACKEND",
        "SPEECH_RATE",
        "SPEECH_VOLUME",
        "SPEECH_VOICE",
        "SPEECH_GREETING",
        "SPEECH_VOICE_CATEGORY",
        "SPEECH_AUGMENT",
    ];

    fn cleanup_env_vars() {
        unsafe {
            for name in ENV_VARS {
                env::remove_var(name);
            }
        }
    }

    fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("config.yaml");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        cleanup_env_vars();

        let config = ServerConfig::from_env().unwrap();

        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.address(), "127.0.0.1:5000");
        assert!(!config.is_tls_enabled());
        assert_eq!(config.speech.voice, "Microsoft Sayaka");
        assert_eq!(config.speech.rate, 2);
        assert_eq!(config.speech.volume, 60);
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        cleanup_env_vars();
        unsafe {
            env::set_var("HOST", "0.0.0.0");
            env::set_var("PORT", "8080");
            env::set_var("SPEECH_BACKEND", "memory");
            env::set_var("SPEECH_RATE", "-4");
            env::set_var("SPEECH_VOLUME", "90");
            env::set_var("SPEECH_VOICE", "Microsoft Haruka");
            env::set_var("SPEECH_AUGMENT", "required");
        }

        let config = ServerConfig::from_env().unwrap();

        assert_eq!(config.address(), "0.0.0.0:8080");
        assert_eq!(config.speech_backend, BackendKind::Memory);
        assert_eq!(config.speech.rate, -4);
        assert_eq!(config.speech.volume, 90);
        assert_eq!(config.speech.voice, "Microsoft Haruka");
        assert_eq!(config.speech.augment, AugmentPolicy::Required);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_empty_greeting_disables_it() {
        cleanup_env_vars();
        unsafe {
            env::set_var("SPEECH_GREETING", "");
        }

        let config = ServerConfig::from_env().unwrap();
        assert!(config.speech.greeting.is_none());

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_invalid_port() {
        cleanup_env_vars();
        unsafe {
            env::set_var("PORT", "not-a-port");
        }

        let result = ServerConfig::from_env();
        assert!(result.unwrap_err().to_string().contains("PORT"));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_rate_out_of_range() {
        cleanup_env_vars();
        unsafe {
            env::set_var("SPEECH_RATE", "15");
        }

        let result = ServerConfig::from_env();
        assert!(result.unwrap_err().to_string().contains("out of range"));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_env_tls_requires_paths() {
        cleanup_env_vars();
        unsafe {
            env::set_var("TLS_ENABLED", "true");
        }

        let result = ServerConfig::from_env();
        assert!(result.unwrap_err().to_string().contains("TLS_CERT_PATH"));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_yaml_overrides_env() {
        cleanup_env_vars();
        unsafe {
            env::set_var("HOST", "0.0.0.0");
            env::set_var("SPEECH_VOICE", "Env Voice");
            env::set_var("SPEECH_VOLUME", "10");
        }

        let temp_dir = TempDir::new().unwrap();
        let path = write_config(
            &temp_dir,
            r#"
server:
  host: "127.0.0.1"
  port: 8081

speech:
  voice: "Yaml Voice"
  greeting: ""
  augment: "disabled"
"#,
        );

        let config = ServerConfig::from_file(&path).unwrap();

        // YAML overrides ENV
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8081);
        assert_eq!(config.speech.voice, "Yaml Voice");
        assert!(config.speech.greeting.is_none());
        assert_eq!(config.speech.augment, AugmentPolicy::Disabled);
        // ENV value kept where YAML is silent
        assert_eq!(config.speech.volume, 10);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_tls_with_existing_files() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let cert = temp_dir.path().join("cert.pem");
        let key = temp_dir.path().join("key.pem");
        fs::write(&cert, "cert").unwrap();
        fs::write(&key, "key").unwrap();
        let path = write_config(
            &temp_dir,
            &format!(
                "server:\n  tls:\n    enabled: true\n    cert_path: \"{}\"\n    key_path: \"{}\"\n",
                cert.display(),
                key.display()
            ),
        );

        let config = ServerConfig::from_file(&path).unwrap();

        assert!(config.is_tls_enabled());
        assert_eq!(config.tls.unwrap().cert_path, cert);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_tls_missing_files() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let path = write_config(
            &temp_dir,
            "server:\n  tls:\n    enabled: true\n    cert_path: \"/nonexistent/cert.pem\"\n    key_path: \"/nonexistent/key.pem\"\n",
        );

        let result = ServerConfig::from_file(&path);
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("TLS certificate file not found")
        );

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_invalid_augment_policy() {
        cleanup_env_vars();

        let temp_dir = TempDir::new().unwrap();
        let path = write_config(&temp_dir, "speech:\n  augment: \"sometimes\"\n");

        let result = ServerConfig::from_file(&path);
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Invalid augment policy")
        );

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_from_file_missing_file() {
        cleanup_env_vars();

        let config_path = PathBuf::from("/nonexistent/config.yaml");
        let result = ServerConfig::from_file(&config_path);

        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read config file")
        );
    }
}
