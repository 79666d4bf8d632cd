//! Windows Speech API (SAPI 5) backend.
//!
//! Voices and categories are plain SAPI object tokens, so voices from an
//! alternate registry location (such as the OneCore voices) can be opened
//! with the public token category API and handed to `ISpVoice::SetVoice`.

mod token;

use windows::Win32::Media::Speech::{ISpVoice, SPCAT_VOICES, SPF_DEFAULT, SpVoice};
use windows::Win32::System::Com::{
    CLSCTX_ALL, COINIT_MULTITHREADED, CoCreateInstance, CoInitializeEx, CoUninitialize,
};
use windows::core::{HSTRING, PCWSTR};

use super::augment::VoiceSource;
use super::base::{SpeechBackend, SpeechError, SpeechResult, VoiceDescriptor};

pub use token::SapiVoiceSource;

const WAIT_INFINITE: u32 = u32::MAX;

fn backend_error(context: &str, err: windows::core::Error) -> SpeechError {
    SpeechError::Backend(format!("{context}: {}", err.message()))
}

/// Keeps COM initialized on the owning thread
struct ComGuard;

impl ComGuard {
    fn new() -> SpeechResult<Self> {
        unsafe { CoInitializeEx(None, COINIT_MULTITHREADED) }
            .ok()
            .map_err(|e| backend_error("Failed to initialize COM", e))?;
        Ok(Self)
    }
}

impl Drop for ComGuard {
    fn drop(&mut self) {
        unsafe { CoUninitialize() };
    }
}

pub struct SapiBackend {
    voice: ISpVoice,
    source: SapiVoiceSource,
    // Dropped last so every COM object is released first
    _com: ComGuard,
}

impl SapiBackend {
    /// Create a synthesizer bound to the default audio output.
    ///
    /// Must be called on the thread that will use the backend.
    pub fn new() -> SpeechResult<Self> {
        let com = ComGuard::new()?;
        let voice: ISpVoice = unsafe { CoCreateInstance(&SpVoice, None, CLSCTX_ALL) }
            .map_err(|e| backend_error("Failed to create SAPI voice", e))?;
        Ok(Self {
            voice,
            source: SapiVoiceSource,
            _com: com,
        })
    }
}

impl SpeechBackend for SapiBackend {
    fn installed_voices(&self) -> SpeechResult<Vec<VoiceDescriptor>> {
        let category = unsafe { SPCAT_VOICES.to_string() }
            .map_err(|e| SpeechError::Backend(format!("Invalid voice category id: {e}")))?;
        let category = token::open_category(&category)
            .map_err(|e| backend_error("Failed to open SAPI voice category", e))?;
        let tokens = token::enumerate_tokens(&category, None, None)
            .map_err(|e| backend_error("Failed to enumerate SAPI voices", e))?;

        let mut voices = Vec::with_capacity(tokens.len());
        for sapi_token in &tokens {
            let voice_token = token::read_token(sapi_token)
                .map_err(|e| backend_error("Failed to read SAPI voice token", e))?;
            if voice_token.attributes.is_none() {
                continue;
            }
            voices.push(VoiceDescriptor::from_token(&voice_token)?);
        }
        Ok(voices)
    }

    fn set_rate(&mut self, rate: i32) -> SpeechResult<()> {
        unsafe { self.voice.SetRate(rate) }.map_err(|e| backend_error("Failed to set rate", e))
    }

    fn set_volume(&mut self, volume: u8) -> SpeechResult<()> {
        unsafe { self.voice.SetVolume(u16::from(volume)) }
            .map_err(|e| backend_error("Failed to set volume", e))
    }

    fn set_voice(&mut self, voice: &VoiceDescriptor) -> SpeechResult<()> {
        let sapi_token = token::token_from_id(&voice.token_id)
            .map_err(|e| backend_error(&format!("Failed to open voice {}", voice.name), e))?;
        unsafe { self.voice.SetVoice(&sapi_token) }
            .map_err(|e| backend_error(&format!("Failed to select voice {}", voice.name), e))
    }

    fn speak(&mut self, text: &str) -> SpeechResult<()> {
        let text = HSTRING::from(text);
        unsafe {
            self.voice
                .Speak(PCWSTR(text.as_ptr()), SPF_DEFAULT.0 as u32, None)
                .map_err(|e| backend_error("Failed to speak", e))?;
            self.voice
                .WaitUntilDone(WAIT_INFINITE)
                .map_err(|e| backend_error("Failed waiting for speech", e))
        }
    }

    fn voice_source(&self) -> Option<&dyn VoiceSource> {
        Some(&self.source)
    }
}
