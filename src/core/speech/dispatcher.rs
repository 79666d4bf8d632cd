//! Fire-and-forget speech dispatch.
//!
//! The engine lives on a dedicated worker thread. Requests hand their text to
//! an unbounded queue and return immediately; the worker speaks queued
//! utterances one at a time, in arrival order. There is no backpressure and
//! no completion signal.

use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use super::base::{BackendFactory, SpeechError, SpeechResult};
use super::config::EngineConfig;
use super::engine::{EngineHandle, EngineSummary};

/// Cloneable handle for submitting utterances to the speech worker
#[derive(Clone)]
pub struct SpeechDispatcher {
    shared: Arc<Shared>,
}

struct Shared {
    // Sole sender of the queue; taking it closes the queue for every clone
    tx: Mutex<Option<mpsc::UnboundedSender<String>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for SpeechDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechDispatcher")
            .field("accepting", &self.is_accepting())
            .finish()
    }
}

impl SpeechDispatcher {
    /// Spawn the speech worker and wait for its startup sequence.
    ///
    /// The backend is created on the worker thread, prepared with `config`
    /// (configure, augment, select voice, greeting), and only then is the
    /// dispatcher returned. Any startup error is returned here and the worker
    /// exits.
    pub async fn start(
        factory: BackendFactory,
        config: EngineConfig,
    ) -> SpeechResult<(Self, EngineSummary)> {
        let (tx, rx) = mpsc::unbounded_channel::<String>();
        let (ready_tx, ready_rx) = oneshot::channel::<SpeechResult<EngineSummary>>();

        let worker = std::thread::Builder::new()
            .name("speech-worker".to_string())
            .spawn(move || run_worker(factory, config, ready_tx, rx))
            .map_err(|e| SpeechError::Backend(format!("Failed to spawn speech worker: {e}")))?;

        match ready_rx.await {
            Ok(Ok(summary)) => {
                let shared = Shared {
                    tx: Mutex::new(Some(tx)),
                    worker: Mutex::new(Some(worker)),
                };
                Ok((
                    Self {
                        shared: Arc::new(shared),
                    },
                    summary,
                ))
            }
            Ok(Err(e)) => {
                let _ = tokio::task::spawn_blocking(move || worker.join()).await;
                Err(e)
            }
            // Worker dropped the sender without reporting, i.e. it panicked
            Err(_) => Err(SpeechError::WorkerStopped),
        }
    }

    /// Queue `text` for speaking. Never waits for audio.
    ///
    /// Returns `false` if the worker is no longer accepting utterances.
    pub fn submit(&self, text: String) -> bool {
        let tx = self.shared.tx.lock();
        let Some(tx) = tx.as_ref() else {
            warn!("Speech dispatcher shut down, dropping utterance: {}", text);
            return false;
        };
        match tx.send(text) {
            Ok(()) => true,
            Err(mpsc::error::SendError(text)) => {
                warn!("Speech worker stopped, dropping utterance: {}", text);
                false
            }
        }
    }

    pub fn is_accepting(&self) -> bool {
        self.shared
            .tx
            .lock()
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }

    /// Stop accepting utterances and wait until the queued ones were spoken.
    ///
    /// Every clone shares the same worker; only the first call joins it.
    pub async fn shutdown(&self) {
        drop(self.shared.tx.lock().take());
        let worker = self.shared.worker.lock().take();
        if let Some(worker) = worker {
            if tokio::task::spawn_blocking(move || worker.join())
                .await
                .map_or(true, |joined| joined.is_err())
            {
                error!("Speech worker panicked");
            }
        }
    }
}

fn run_worker(
    factory: BackendFactory,
    config: EngineConfig,
    ready: oneshot::Sender<SpeechResult<EngineSummary>>,
    mut rx: mpsc::UnboundedReceiver<String>,
) {
    let mut engine = match factory().and_then(EngineHandle::new) {
        Ok(engine) => engine,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    match engine.prepare(&config) {
        Ok(summary) => {
            if ready.send(Ok(summary)).is_err() {
                return;
            }
        }
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    }

    while let Some(text) = rx.blocking_recv() {
        debug!("Speaking {} character(s)", text.chars().count());
        if let Err(e) = engine.speak(&text) {
            warn!("Speech failed: {}", e);
        }
    }
    info!("Speech worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::speech::base::{SpeechBackend, VoiceDescriptor};
    use crate::core::speech::memory::MemoryBackend;
    use std::time::Duration;

    fn config() -> EngineConfig {
        EngineConfig {
            voice: "Test Voice".to_string(),
            greeting: Some("ready".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_start_speaks_greeting_before_returning() {
        let backend = MemoryBackend::dry_run("Test Voice");
        let log = backend.log();

        let (dispatcher, summary) = SpeechDispatcher::start(backend.into_factory(), config())
            .await
            .unwrap();

        assert_eq!(summary.selected_voice, "Test Voice");
        assert_eq!(log.spoken(), vec!["ready".to_string()]);
        dispatcher.shutdown().await;
    }

    #[tokio::test]
    async fn test_start_fails_when_voice_missing() {
        let backend = MemoryBackend::new(vec![VoiceDescriptor::named("x", "Other Voice")]);
        let log = backend.log();

        let result = SpeechDispatcher::start(backend.into_factory(), config()).await;

        assert!(matches!(result, Err(SpeechError::VoiceNotFound(_))));
        assert!(log.spoken().is_empty());
    }

    #[tokio::test]
    async fn test_start_reports_factory_error() {
        let result = SpeechDispatcher::start(
            Box::new(|| -> SpeechResult<Box<dyn SpeechBackend>> {
                Err(SpeechError::Backend("no audio".to_string()))
            }),
            config(),
        )
        .await;

        assert!(matches!(result, Err(SpeechError::Backend(_))));
    }

    #[tokio::test]
    async fn test_submit_does_not_wait_and_preserves_order() {
        let backend =
            MemoryBackend::dry_run("Test Voice").with_speak_delay(Duration::from_millis(20));
        let log = backend.log();
        let (dispatcher, _) = SpeechDispatcher::start(backend.into_factory(), config())
            .await
            .unwrap();

        let started = std::time::Instant::now();
        for i in 0..5 {
            assert!(dispatcher.submit(format!("utterance {i}")));
        }
        assert!(started.elapsed() < Duration::from_millis(20));

        dispatcher.shutdown().await;
        assert!(!dispatcher.submit("late".to_string()));
        let spoken = log.spoken();
        assert_eq!(spoken.len(), 6);
        assert_eq!(spoken[1], "utterance 0");
        assert_eq!(spoken[5], "utterance 4");
    }

    #[tokio::test]
    async fn test_speech_failure_keeps_worker_running() {
        let backend = MemoryBackend::dry_run("Test Voice").failing_speeches(1);
        let log = backend.log();
        let quiet = EngineConfig {
            greeting: None,
            ..config()
        };
        let (dispatcher, _) = SpeechDispatcher::start(backend.into_factory(), quiet)
            .await
            .unwrap();

        assert!(dispatcher.submit("first".to_string()));
        assert!(dispatcher.submit("second".to_string()));
        assert!(log.wait_for_spoken(1, Duration::from_secs(5)));
        assert!(dispatcher.is_accepting());

        dispatcher.shutdown().await;
        assert_eq!(log.spoken(), vec!["second".to_string()]);
    }
}
