use super::TlsConfig;
use crate::core::speech::EngineConfig;
use crate::core::speech::config::{validate_rate, validate_volume};

/// Validate the engine settings before the speech worker starts
pub fn validate_speech_config(speech: &EngineConfig) -> Result<(), Box<dyn std::error::Error>> {
    validate_rate(speech.rate)?;
    validate_volume(speech.volume)?;

    if speech.voice.trim().is_empty() {
        return Err("Speech voice name must not be empty".into());
    }
    if speech.voice_category.trim().is_empty() {
        return Err("Speech voice category must not be empty".into());
    }
    Ok(())
}

/// Validate that configured TLS files exist
pub fn validate_tls_config(tls: &Option<TlsConfig>) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(tls) = tls {
        if !tls.cert_path.exists() {
            return Err(format!(
                "TLS certificate file not found: {}",
                tls.cert_path.display()
            )
            .into());
        }
        if !tls.key_path.exists() {
            return Err(format!("TLS key file not found: {}", tls.key_path.display()).into());
        }
    }
    Ok(())
}
