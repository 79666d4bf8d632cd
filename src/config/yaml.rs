use serde::Deserialize;
use std::path::PathBuf;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values present
/// here override environment variables.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "127.0.0.1"
///   port: 5000
///   tls:
///     enabled: true
///     cert_path: "/etc/speak-relay/cert.pem"
///     key_path: "/etc/speak-relay/key.pem"
///
/// speech:
///   backend: "system"
///   rate: 2
///   volume: 60
///   voice: "Microsoft Sayaka"
///   greeting: "さやかです．"
///   voice_category: 'HKEY_LOCAL_MACHINE\SOFTWARE\Microsoft\Speech_OneCore\Voices'
///   augment: "best_effort"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub speech: Option<SpeechYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub tls: Option<TlsYaml>,
}

/// TLS configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TlsYaml {
    pub enabled: Option<bool>,
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

/// Speech engine configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SpeechYaml {
    /// "system" or "memory"
    pub backend: Option<String>,
    /// Speech rate offset (-10 to 10)
    pub rate: Option<i32>,
    /// Volume (0 to 100)
    pub volume: Option<u8>,
    /// Exact display name of the voice to select
    pub voice: Option<String>,
    /// Phrase spoken at startup; empty disables it
    pub greeting: Option<String>,
    /// Alternate voice category scanned for additional voices
    pub voice_category: Option<String>,
    /// "required", "best_effort" or "disabled"
    pub augment: Option<String>,
}

impl YamlConfig {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file cannot be read
    /// - The YAML is malformed
    /// - Required fields have invalid types
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }
}
