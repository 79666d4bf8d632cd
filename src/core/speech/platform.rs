//! Host capability gate.

use std::fmt;
use std::str::FromStr;

use super::base::BackendFactory;
use super::memory::MemoryBackend;

/// Which speech backend the relay runs on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackendKind {
    /// The host operating system's speech subsystem
    #[default]
    System,
    /// Log utterances instead of speaking them
    Memory,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "system" | "sapi" => Ok(BackendKind::System),
            "memory" | "dry-run" | "dry_run" => Ok(BackendKind::Memory),
            other => Err(format!(
                "Invalid speech backend '{other}'. Must be one of: system, memory"
            )),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::System => f.write_str("system"),
            BackendKind::Memory => f.write_str("memory"),
        }
    }
}

/// Whether this host has a speech subsystem the relay can drive
pub fn has_system_speech() -> bool {
    cfg!(windows)
}

/// Factory for the host speech subsystem, or `None` if there is none
#[cfg(windows)]
pub fn system_backend() -> Option<BackendFactory> {
    use super::base::{SpeechBackend, SpeechResult};
    use super::sapi::SapiBackend;

    Some(Box::new(|| -> SpeechResult<Box<dyn SpeechBackend>> {
        Ok(Box::new(SapiBackend::new()?))
    }))
}

/// Factory for the host speech subsystem, or `None` if there is none
#[cfg(not(windows))]
pub fn system_backend() -> Option<BackendFactory> {
    None
}

/// Resolve the configured backend. `None` means the relay must stay inert.
pub fn backend_factory(kind: BackendKind, voice: &str) -> Option<BackendFactory> {
    match kind {
        BackendKind::System => system_backend(),
        BackendKind::Memory => Some(MemoryBackend::dry_run(voice).into_factory()),
    }
}
