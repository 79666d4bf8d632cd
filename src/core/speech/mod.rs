//! Host text-to-speech engine.
//!
//! - `base` - backend seam, voice descriptors and errors
//! - `catalog` - ordered voice catalog owned by the engine handle
//! - `augment` - appends voices from alternate voice categories
//! - `engine` - the engine handle and its startup sequence
//! - `dispatcher` - fire-and-forget speech queue on a worker thread
//! - `platform` - host capability gate
//! - `memory` - in-memory backend
//! - `sapi` - Windows SAPI backend

pub mod augment;
mod base;
pub mod catalog;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod memory;
pub mod platform;
#[cfg(windows)]
pub mod sapi;

pub use augment::{
    AugmentOutcome, AugmentPolicy, AugmentReport, ONE_CORE_VOICES_CATEGORY, TokenCategory,
    VoiceSource, augment_voice_catalog,
};
pub use base::{
    AugmentStep, BackendFactory, SpeechBackend, SpeechError, SpeechResult, VoiceAge,
    VoiceAttributes, VoiceDescriptor, VoiceGender, VoiceToken, culture_from_language,
};
pub use catalog::VoiceCatalog;
pub use config::EngineConfig;
pub use dispatcher::SpeechDispatcher;
pub use engine::{EngineHandle, EngineSummary};
pub use memory::{BackendEvent, MemoryBackend, MemoryVoiceSource, SpokenLog};
pub use platform::{BackendKind, backend_factory, has_system_speech, system_backend};
