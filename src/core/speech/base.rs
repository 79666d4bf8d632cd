//! Engine seam and voice data model shared by every speech backend.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use super::augment::VoiceSource;

/// Result type for speech engine operations
pub type SpeechResult<T> = Result<T, SpeechError>;

/// The augmentation step that found a platform capability missing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AugmentStep {
    /// The backend exposes no voice source at all
    VoiceSource,
    /// The registry-like category could not be opened
    OpenCategory,
    /// Tokens in the category could not be enumerated
    EnumerateTokens,
    /// A token could not be turned into a voice descriptor
    DescriptorConstruction,
}

impl fmt::Display for AugmentStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AugmentStep::VoiceSource => "voice source",
            AugmentStep::OpenCategory => "open category",
            AugmentStep::EnumerateTokens => "enumerate tokens",
            AugmentStep::DescriptorConstruction => "descriptor construction",
        };
        f.write_str(name)
    }
}

/// Speech engine errors
#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("Unsupported platform feature ({step}): {reason}")]
    UnsupportedFeature { step: AugmentStep, reason: String },
    #[error("Voice not found: {0}")]
    VoiceNotFound(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Speech engine error: {0}")]
    Backend(String),
    #[error("Speech worker is no longer running")]
    WorkerStopped,
}

impl SpeechError {
    pub fn unsupported(step: AugmentStep, reason: impl Into<String>) -> Self {
        SpeechError::UnsupportedFeature {
            step,
            reason: reason.into(),
        }
    }
}

/// Attribute set attached to a catalog token (`Name`, `Language`, `Gender`, ...)
pub type VoiceAttributes = BTreeMap<String, String>;

/// A raw entry enumerated from a voice category.
///
/// Entries without an attribute set are considered malformed and are skipped
/// by the augmenter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceToken {
    /// Opaque, platform-specific token identifier
    pub id: String,
    /// The token's default value, usually a human readable description
    pub description: Option<String>,
    pub attributes: Option<VoiceAttributes>,
}

impl VoiceToken {
    pub fn new(id: impl Into<String>, attributes: Option<VoiceAttributes>) -> Self {
        Self {
            id: id.into(),
            description: None,
            attributes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceGender {
    Male,
    Female,
    Neutral,
}

impl VoiceGender {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "male" => Some(VoiceGender::Male),
            "female" => Some(VoiceGender::Female),
            "neutral" => Some(VoiceGender::Neutral),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceAge {
    Child,
    Teen,
    Adult,
    Senior,
}

impl VoiceAge {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "child" => Some(VoiceAge::Child),
            "teen" => Some(VoiceAge::Teen),
            "adult" => Some(VoiceAge::Adult),
            "senior" => Some(VoiceAge::Senior),
            _ => None,
        }
    }
}

/// Metadata identifying one speakable voice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceDescriptor {
    pub token_id: String,
    /// Display name used for voice selection
    pub name: String,
    /// Culture tag (e.g. "ja-JP"), or the raw language attribute if unknown
    pub culture: Option<String>,
    pub gender: Option<VoiceGender>,
    pub age: Option<VoiceAge>,
    pub vendor: Option<String>,
    pub description: Option<String>,
    pub audio_formats: Vec<String>,
    /// Every attribute not mapped onto a dedicated field
    pub additional_info: BTreeMap<String, String>,
}

impl VoiceDescriptor {
    /// Minimal descriptor with only an id and a name
    pub fn named(token_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            token_id: token_id.into(),
            name: name.into(),
            culture: None,
            gender: None,
            age: None,
            vendor: None,
            description: None,
            audio_formats: Vec::new(),
            additional_info: BTreeMap::new(),
        }
    }

    /// Build a descriptor from an enumerated token.
    ///
    /// The token must carry an attribute set with a `Name` entry.
    pub fn from_token(token: &VoiceToken) -> SpeechResult<Self> {
        let attributes = token.attributes.as_ref().ok_or_else(|| {
            SpeechError::unsupported(
                AugmentStep::DescriptorConstruction,
                format!("token {} has no attributes", token.id),
            )
        })?;

        let name = attributes
            .get("Name")
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                SpeechError::unsupported(
                    AugmentStep::DescriptorConstruction,
                    format!("token {} has no Name attribute", token.id),
                )
            })?;

        let mut descriptor = Self::named(token.id.clone(), name);
        descriptor.description = token.description.clone();

        for (key, value) in attributes {
            match key.as_str() {
                "Name" => {}
                "Language" => descriptor.culture = Some(culture_from_language(value)),
                "Gender" => descriptor.gender = VoiceGender::parse(value),
                "Age" => descriptor.age = VoiceAge::parse(value),
                "Vendor" => descriptor.vendor = Some(value.clone()),
                "AudioFormats" => {
                    descriptor.audio_formats = value
                        .split(';')
                        .map(str::trim)
                        .filter(|fmt| !fmt.is_empty())
                        .map(str::to_string)
                        .collect();
                }
                _ => {
                    descriptor.additional_info.insert(key.clone(), value.clone());
                }
            }
        }

        Ok(descriptor)
    }
}

/// Maps a SAPI `Language` attribute (hex LCIDs separated by `;`) to a culture tag.
///
/// Only the first LCID is considered. Unknown values are returned unchanged.
pub fn culture_from_language(language: &str) -> String {
    let primary = language.split(';').next().unwrap_or(language).trim();

    let tag = match primary.to_ascii_uppercase().as_str() {
        "404" => "zh-TW",
        "407" => "de-DE",
        "409" => "en-US",
        "40A" | "C0A" => "es-ES",
        "40C" => "fr-FR",
        "410" => "it-IT",
        "411" => "ja-JP",
        "412" => "ko-KR",
        "416" => "pt-BR",
        "419" => "ru-RU",
        "439" => "hi-IN",
        "804" => "zh-CN",
        "809" => "en-GB",
        "80A" => "es-MX",
        "C09" => "en-AU",
        "C0C" => "fr-CA",
        "C04" => "zh-HK",
        _ => return primary.to_string(),
    };
    tag.to_string()
}

/// The host speech subsystem.
///
/// Implementations are created on, and only used from, the speech worker
/// thread, so they need not be `Send`.
pub trait SpeechBackend {
    /// Voices the engine knows about after its default initialization
    fn installed_voices(&self) -> SpeechResult<Vec<VoiceDescriptor>>;

    /// Speech rate offset, -10 (slowest) to 10 (fastest)
    fn set_rate(&mut self, rate: i32) -> SpeechResult<()>;

    /// Volume, 0 to 100
    fn set_volume(&mut self, volume: u8) -> SpeechResult<()>;

    fn set_voice(&mut self, voice: &VoiceDescriptor) -> SpeechResult<()>;

    /// Speak `text`, blocking until playback has completed
    fn speak(&mut self, text: &str) -> SpeechResult<()>;

    /// Access to alternate voice categories, if the platform has one
    fn voice_source(&self) -> Option<&dyn VoiceSource>;
}

/// Creates a backend on the thread that will own it
pub type BackendFactory = Box<dyn FnOnce() -> SpeechResult<Box<dyn SpeechBackend>> + Send>;
