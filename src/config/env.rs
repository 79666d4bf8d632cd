use std::env;
use std::path::PathBuf;

use super::utils::{env_bool, env_parse, env_var};
use super::{ServerConfig, TlsConfig};
use crate::core::speech::EngineConfig;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;

/// Build a configuration from environment variables and defaults
pub fn from_env() -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let host = env_var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = env_parse::<u16>("PORT")?.unwrap_or(DEFAULT_PORT);

    let tls = if env_bool("TLS_ENABLED")?.unwrap_or(false) {
        let cert_path = env_var("TLS_CERT_PATH")
            .ok_or("TLS_ENABLED is set but TLS_CERT_PATH is missing")?;
        let key_path =
            env_var("TLS_KEY_PATH").ok_or("TLS_ENABLED is set but TLS_KEY_PATH is missing")?;
        Some(TlsConfig {
            cert_path: PathBuf::from(cert_path),
            key_path: PathBuf::from(key_path),
        })
    } else {
        None
    };

    let defaults = EngineConfig::default();
    let speech = EngineConfig {
        rate: env_parse("SPEECH_RATE")?.unwrap_or(defaults.rate),
        volume: env_parse("SPEECH_VOLUME")?.unwrap_or(defaults.volume),
        voice: env_var("SPEECH_VOICE").unwrap_or(defaults.voice),
        // Set but empty disables the greeting
        greeting: match env::var("SPEECH_GREETING") {
            Ok(greeting) if greeting.trim().is_empty() => None,
            Ok(greeting) => Some(greeting),
            Err(_) => defaults.greeting,
        },
        voice_category: env_var("SPEECH_VOICE_CATEGORY").unwrap_or(defaults.voice_category),
        augment: env_parse("SPEECH_AUGMENT")?.unwrap_or(defaults.augment),
    };

    Ok(ServerConfig {
        host,
        port,
        tls,
        speech_backend: env_parse("SPEECH_BACKEND")?.unwrap_or_default(),
        speech,
    })
}
