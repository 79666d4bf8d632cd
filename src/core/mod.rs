pub mod speech;

// Re-export commonly used types for convenience
pub use speech::{
    AugmentPolicy, BackendKind, EngineConfig, EngineHandle, SpeechBackend, SpeechDispatcher,
    SpeechError, SpeechResult, VoiceDescriptor,
};
