//! The engine handle: one owned connection to the host speech subsystem.

use tracing::{info, warn};

use super::augment::{AugmentOutcome, AugmentPolicy, AugmentReport, augment_voice_catalog};
use super::base::{AugmentStep, SpeechBackend, SpeechError, SpeechResult, VoiceDescriptor};
use super::catalog::VoiceCatalog;
use super::config::{EngineConfig, validate_rate, validate_volume};

/// State of the engine once startup completed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSummary {
    pub voice_count: usize,
    pub selected_voice: String,
    pub augment: AugmentOutcome,
}

/// Owns a speech backend together with its voice catalog.
///
/// Configuration is applied through `&mut self`, so it can never race with
/// speech on the same handle.
pub struct EngineHandle {
    backend: Box<dyn SpeechBackend>,
    catalog: VoiceCatalog,
    rate: i32,
    volume: u8,
    selected: Option<VoiceDescriptor>,
}

impl EngineHandle {
    /// Wrap `backend`, loading its default voices into the catalog
    pub fn new(backend: Box<dyn SpeechBackend>) -> SpeechResult<Self> {
        let catalog = VoiceCatalog::new(backend.installed_voices()?);
        Ok(Self {
            backend,
            catalog,
            rate: 0,
            volume: 100,
            selected: None,
        })
    }

    pub fn configure(&mut self, rate: i32, volume: u8) -> SpeechResult<()> {
        validate_rate(rate)?;
        validate_volume(volume)?;

        self.backend.set_rate(rate)?;
        self.backend.set_volume(volume)?;
        self.rate = rate;
        self.volume = volume;
        Ok(())
    }

    /// Append the voices found in `category` to the catalog
    pub fn augment(&mut self, category: &str) -> SpeechResult<AugmentReport> {
        let source = self.backend.voice_source().ok_or_else(|| {
            SpeechError::unsupported(
                AugmentStep::VoiceSource,
                "speech backend exposes no alternate voice categories",
            )
        })?;
        augment_voice_catalog(source, category, &mut self.catalog)
    }

    /// Select the voice whose display name is exactly `name`
    pub fn select_voice(&mut self, name: &str) -> SpeechResult<&VoiceDescriptor> {
        let voice = self
            .catalog
            .find(name)
            .cloned()
            .ok_or_else(|| SpeechError::VoiceNotFound(name.to_string()))?;

        self.backend.set_voice(&voice)?;
        Ok(self.selected.insert(voice))
    }

    /// Speak `text`, returning once playback has completed
    pub fn speak(&mut self, text: &str) -> SpeechResult<()> {
        self.backend.speak(text)
    }

    pub fn voices(&self) -> &VoiceCatalog {
        &self.catalog
    }

    pub fn rate(&self) -> i32 {
        self.rate
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn selected_voice(&self) -> Option<&VoiceDescriptor> {
        self.selected.as_ref()
    }

    /// Run augmentation as dictated by `policy`
    pub fn augment_with_policy(
        &mut self,
        category: &str,
        policy: AugmentPolicy,
    ) -> SpeechResult<AugmentOutcome> {
        if policy == AugmentPolicy::Disabled {
            return Ok(AugmentOutcome::Skipped);
        }

        match self.augment(category) {
            Ok(report) => Ok(AugmentOutcome::Augmented(report)),
            Err(e) if policy == AugmentPolicy::BestEffort => {
                warn!("Voice augmentation unavailable, using default voices only: {}", e);
                Ok(AugmentOutcome::Unsupported(e.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// Startup sequence: configure, augment, select the voice, then speak the
    /// greeting synchronously.
    pub fn prepare(&mut self, config: &EngineConfig) -> SpeechResult<EngineSummary> {
        self.configure(config.rate, config.volume)?;
        let augment = self.augment_with_policy(&config.voice_category, config.augment)?;
        let selected_voice = self.select_voice(&config.voice)?.name.clone();

        info!(
            "Speech engine ready: voice={}, rate={}, volume={}, {} voice(s) available",
            selected_voice,
            self.rate,
            self.volume,
            self.catalog.len()
        );

        if let Some(greeting) = config.greeting.as_deref().filter(|g| !g.is_empty()) {
            self.speak(greeting)?;
        }

        Ok(EngineSummary {
            voice_count: self.catalog.len(),
            selected_voice,
            augment,
        })
    }
}
