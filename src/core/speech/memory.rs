//! In-memory speech backend.
//!
//! Records every engine call instead of producing audio. Used by the test
//! suite, and by `SPEECH_BACKEND=memory` to run the relay on hosts without a
//! speech subsystem.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::info;

use super::augment::{TokenCategory, VoiceSource};
use super::base::{
    AugmentStep, BackendFactory, SpeechBackend, SpeechError, SpeechResult, VoiceAttributes,
    VoiceDescriptor, VoiceToken,
};

/// One call observed by a [`MemoryBackend`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendEvent {
    Rate(i32),
    Volume(u8),
    Voice(String),
    Spoke(String),
}

/// Shared record of backend calls, readable from other threads
#[derive(Debug, Clone, Default)]
pub struct SpokenLog {
    inner: Arc<(Mutex<Vec<BackendEvent>>, Condvar)>,
}

impl SpokenLog {
    fn record(&self, event: BackendEvent) {
        let (events, changed) = &*self.inner;
        events.lock().push(event);
        changed.notify_all();
    }

    pub fn events(&self) -> Vec<BackendEvent> {
        self.inner.0.lock().clone()
    }

    /// Utterances spoken so far, in order
    pub fn spoken(&self) -> Vec<String> {
        self.inner
            .0
            .lock()
            .iter()
            .filter_map(|event| match event {
                BackendEvent::Spoke(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Block until at least `count` utterances were spoken or `timeout` elapses.
    /// Returns whether the count was reached.
    pub fn wait_for_spoken(&self, count: usize, timeout: Duration) -> bool {
        let (events, changed) = &*self.inner;
        let deadline = Instant::now() + timeout;
        let mut guard = events.lock();
        loop {
            let spoken = guard
                .iter()
                .filter(|event| matches!(event, BackendEvent::Spoke(_)))
                .count();
            if spoken >= count {
                return true;
            }
            if changed.wait_until(&mut guard, deadline).timed_out() {
                return false;
            }
        }
    }
}

/// Build a token whose attribute set carries `Name` (and an English culture),
/// or a malformed token without attributes when `name` is `None`.
pub fn token(id: &str, name: Option<&str>) -> VoiceToken {
    let attributes = name.map(|name| {
        let mut attributes = VoiceAttributes::new();
        attributes.insert("Name".to_string(), name.to_string());
        attributes.insert("Language".to_string(), "409".to_string());
        attributes
    });
    VoiceToken::new(id, attributes)
}

/// Scripted voice categories keyed by path
#[derive(Debug, Default)]
pub struct MemoryVoiceSource {
    categories: HashMap<String, Vec<VoiceToken>>,
    fail_enumeration: bool,
    open_scopes: Arc<AtomicUsize>,
    opened_total: Arc<AtomicUsize>,
}

impl MemoryVoiceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, path: &str, tokens: Vec<VoiceToken>) -> Self {
        self.categories.insert(path.to_string(), tokens);
        self
    }

    /// Make every enumeration fail after the category was opened
    pub fn failing_enumeration(mut self) -> Self {
        self.fail_enumeration = true;
        self
    }

    /// Category scopes currently open
    pub fn open_scopes(&self) -> usize {
        self.open_scopes.load(Ordering::SeqCst)
    }

    pub fn opened_total(&self) -> usize {
        self.opened_total.load(Ordering::SeqCst)
    }
}

struct MemoryCategory<'a> {
    source: &'a MemoryVoiceSource,
    tokens: &'a [VoiceToken],
}

impl Drop for MemoryCategory<'_> {
    fn drop(&mut self) {
        self.source.open_scopes.fetch_sub(1, Ordering::SeqCst);
    }
}

impl TokenCategory for MemoryCategory<'_> {
    fn find_matching_tokens(
        &self,
        required: Option<&str>,
        _optional: Option<&str>,
    ) -> SpeechResult<Vec<VoiceToken>> {
        if self.source.fail_enumeration {
            return Err(SpeechError::unsupported(
                AugmentStep::EnumerateTokens,
                "enumeration disabled",
            ));
        }

        // Required filter is a single "Key=Value" pair here
        let filter = required.and_then(|req| req.split_once('='));
        Ok(self
            .tokens
            .iter()
            .filter(|token| match (filter, &token.attributes) {
                (None, _) => true,
                (Some((key, value)), Some(attrs)) => attrs.get(key).is_some_and(|v| v == value),
                (Some(_), None) => false,
            })
            .cloned()
            .collect())
    }
}

impl VoiceSource for MemoryVoiceSource {
    fn open_category(&self, path: &str) -> SpeechResult<Box<dyn TokenCategory + '_>> {
        let tokens = self.categories.get(path).ok_or_else(|| {
            SpeechError::unsupported(AugmentStep::OpenCategory, format!("no category at {path}"))
        })?;

        self.open_scopes.fetch_add(1, Ordering::SeqCst);
        self.opened_total.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryCategory {
            source: self,
            tokens,
        }))
    }
}

/// Speech backend that keeps everything in memory
#[derive(Debug, Default)]
pub struct MemoryBackend {
    voices: Vec<VoiceDescriptor>,
    source: Option<MemoryVoiceSource>,
    log: SpokenLog,
    speak_delay: Option<Duration>,
    // Remaining `speak` calls that fail
    fail_speak: usize,
}

impl MemoryBackend {
    pub fn new(voices: Vec<VoiceDescriptor>) -> Self {
        Self {
            voices,
            ..Default::default()
        }
    }

    /// Backend exposing a single voice named `voice`, logging utterances
    /// instead of playing them
    pub fn dry_run(voice: &str) -> Self {
        Self::new(vec![VoiceDescriptor::named("memory", voice)])
    }

    pub fn with_voice_source(mut self, source: MemoryVoiceSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Simulated playback time per utterance
    pub fn with_speak_delay(mut self, delay: Duration) -> Self {
        self.speak_delay = Some(delay);
        self
    }

    /// Make every `speak` call fail
    pub fn failing_speech(mut self) -> Self {
        self.fail_speak = usize::MAX;
        self
    }

    /// Make the next `count` calls to `speak` fail
    pub fn failing_speeches(mut self, count: usize) -> Self {
        self.fail_speak = count;
        self
    }

    /// Handle to the call log; stays valid after the backend moved
    pub fn log(&self) -> SpokenLog {
        self.log.clone()
    }

    pub fn into_factory(self) -> BackendFactory {
        Box::new(move || -> SpeechResult<Box<dyn SpeechBackend>> { Ok(Box::new(self)) })
    }
}

impl SpeechBackend for MemoryBackend {
    fn installed_voices(&self) -> SpeechResult<Vec<VoiceDescriptor>> {
        Ok(self.voices.clone())
    }

    fn set_rate(&mut self, rate: i32) -> SpeechResult<()> {
        self.log.record(BackendEvent::Rate(rate));
        Ok(())
    }

    fn set_volume(&mut self, volume: u8) -> SpeechResult<()> {
        self.log.record(BackendEvent::Volume(volume));
        Ok(())
    }

    fn set_voice(&mut self, voice: &VoiceDescriptor) -> SpeechResult<()> {
        self.log.record(BackendEvent::Voice(voice.name.clone()));
        Ok(())
    }

    fn speak(&mut self, text: &str) -> SpeechResult<()> {
        if let Some(delay) = self.speak_delay {
            std::thread::sleep(delay);
        }
        if self.fail_speak > 0 {
            self.fail_speak -= 1;
            return Err(SpeechError::Backend("audio device unavailable".to_string()));
        }
        info!("[memory] speaking: {}", text);
        self.log.record(BackendEvent::Spoke(text.to_string()));
        Ok(())
    }

    fn voice_source(&self) -> Option<&dyn VoiceSource> {
        self.source.as_ref().map(|source| source as &dyn VoiceSource)
    }
}
