use std::path::PathBuf;

use super::yaml::YamlConfig;
use super::{ServerConfig, TlsConfig, env};

/// Merge environment configuration (base) with YAML overrides
pub fn merge_config(yaml: Option<YamlConfig>) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let mut config = env::from_env()?;

    let Some(yaml) = yaml else {
        return Ok(config);
    };

    if let Some(server) = yaml.server {
        if let Some(host) = server.host {
            config.host = host;
        }
        if let Some(port) = server.port {
            config.port = port;
        }
        if let Some(tls) = server.tls {
            match tls.enabled {
                Some(false) => config.tls = None,
                Some(true) => {
                    let existing = config.tls.take();
                    let cert_path = tls
                        .cert_path
                        .map(PathBuf::from)
                        .or_else(|| existing.as_ref().map(|t| t.cert_path.clone()))
                        .ok_or("server.tls.enabled is true but cert_path is missing")?;
                    let key_path = tls
                        .key_path
                        .map(PathBuf::from)
                        .or_else(|| existing.as_ref().map(|t| t.key_path.clone()))
                        .ok_or("server.tls.enabled is true but key_path is missing")?;
                    config.tls = Some(TlsConfig {
                        cert_path,
                        key_path,
                    });
                }
                None => {
                    if let Some(ref mut existing) = config.tls {
                        if let Some(cert_path) = tls.cert_path {
                            existing.cert_path = PathBuf::from(cert_path);
                        }
                        if let Some(key_path) = tls.key_path {
                            existing.key_path = PathBuf::from(key_path);
                        }
                    }
                }
            }
        }
    }

    if let Some(speech) = yaml.speech {
        if let Some(backend) = speech.backend {
            config.speech_backend = backend.parse()?;
        }
        if let Some(rate) = speech.rate {
            config.speech.rate = rate;
        }
        if let Some(volume) = speech.volume {
            config.speech.volume = volume;
        }
        if let Some(voice) = speech.voice {
            config.speech.voice = voice;
        }
        if let Some(greeting) = speech.greeting {
            config.speech.greeting = Some(greeting).filter(|g| !g.trim().is_empty());
        }
        if let Some(voice_category) = speech.voice_category {
            config.speech.voice_category = voice_category;
        }
        if let Some(augment) = speech.augment {
            config.speech.augment = augment.parse()?;
        }
    }

    Ok(config)
}
