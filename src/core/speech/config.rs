use super::augment::{AugmentPolicy, ONE_CORE_VOICES_CATEGORY};
use super::base::{SpeechError, SpeechResult};

pub const DEFAULT_RATE: i32 = 2;
pub const DEFAULT_VOLUME: u8 = 60;
pub const DEFAULT_VOICE: &str = "Microsoft Sayaka";
pub const DEFAULT_GREETING: &str = "さやかです．";

pub const MIN_RATE: i32 = -10;
pub const MAX_RATE: i32 = 10;
pub const MAX_VOLUME: u8 = 100;

/// Startup configuration of the engine handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Speech rate offset, -10 to 10
    pub rate: i32,
    /// Volume, 0 to 100
    pub volume: u8,
    /// Exact display name of the voice to select after augmentation
    pub voice: String,
    /// Spoken synchronously before the listener starts; `None` skips it
    pub greeting: Option<String>,
    /// Alternate voice category scanned by the augmenter
    pub voice_category: String,
    pub augment: AugmentPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rate: DEFAULT_RATE,
            volume: DEFAULT_VOLUME,
            voice: DEFAULT_VOICE.to_string(),
            greeting: Some(DEFAULT_GREETING.to_string()),
            voice_category: ONE_CORE_VOICES_CATEGORY.to_string(),
            augment: AugmentPolicy::default(),
        }
    }
}

pub fn validate_rate(rate: i32) -> SpeechResult<()> {
    if !(MIN_RATE..=MAX_RATE).contains(&rate) {
        return Err(SpeechError::InvalidConfiguration(format!(
            "Speech rate {rate} is out of range ({MIN_RATE} to {MAX_RATE})"
        )));
    }
    Ok(())
}

pub fn validate_volume(volume: u8) -> SpeechResult<()> {
    if volume > MAX_VOLUME {
        return Err(SpeechError::InvalidConfiguration(format!(
            "Speech volume {volume} is out of range (0 to {MAX_VOLUME})"
        )));
    }
    Ok(())
}
