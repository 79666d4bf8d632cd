use std::sync::Arc;

use crate::core::speech::SpeechDispatcher;

/// Shared application state handed to every request handler
#[derive(Debug)]
pub struct AppState {
    pub speech: SpeechDispatcher,
}

impl AppState {
    pub fn new(speech: SpeechDispatcher) -> Arc<Self> {
        Arc::new(Self { speech })
    }
}
