//! Object token access through the SAPI token category API.

use std::ffi::c_void;

use windows::Win32::Foundation::BOOL;
use windows::Win32::Media::Speech::{
    ISpDataKey, ISpObjectToken, ISpObjectTokenCategory, SpObjectToken, SpObjectTokenCategory,
};
use windows::Win32::System::Com::{CLSCTX_ALL, CoCreateInstance, CoTaskMemFree};
use windows::core::{HSTRING, PCWSTR, PWSTR};

use crate::core::speech::augment::{TokenCategory, VoiceSource};
use crate::core::speech::base::{
    AugmentStep, SpeechError, SpeechResult, VoiceAttributes, VoiceToken,
};

const ATTRIBUTES_KEY: &str = "Attributes";

/// Copy a COM-allocated string and free it
unsafe fn take_pwstr(value: PWSTR) -> Option<String> {
    if value.is_null() {
        return None;
    }
    let text = unsafe { value.to_string() }.ok();
    unsafe { CoTaskMemFree(Some(value.0 as *const c_void)) };
    text
}

fn wide(value: &str) -> HSTRING {
    HSTRING::from(value)
}

/// Open the token category at `path` (a registry path or category id)
pub(super) fn open_category(path: &str) -> windows::core::Result<ISpObjectTokenCategory> {
    let id = wide(path);
    unsafe {
        let category: ISpObjectTokenCategory =
            CoCreateInstance(&SpObjectTokenCategory, None, CLSCTX_ALL)?;
        category.SetId(PCWSTR(id.as_ptr()), BOOL(0))?;
        Ok(category)
    }
}

/// Enumerate every token of `category` matching the attribute filters
pub(super) fn enumerate_tokens(
    category: &ISpObjectTokenCategory,
    required: Option<&str>,
    optional: Option<&str>,
) -> windows::core::Result<Vec<ISpObjectToken>> {
    let required = required.map(wide);
    let optional = optional.map(wide);
    let to_pcwstr = |value: &Option<HSTRING>| {
        value
            .as_ref()
            .map_or(PCWSTR::null(), |value| PCWSTR(value.as_ptr()))
    };

    unsafe {
        let tokens = category.EnumTokens(to_pcwstr(&required), to_pcwstr(&optional))?;
        let mut count = 0u32;
        tokens.GetCount(&mut count)?;
        (0..count).map(|index| tokens.Item(index)).collect()
    }
}

/// Read the token id, default description and attribute set of `token`
pub(super) fn read_token(token: &ISpObjectToken) -> windows::core::Result<VoiceToken> {
    unsafe {
        let id = take_pwstr(token.GetId()?).unwrap_or_default();
        let description = token
            .GetStringValue(PCWSTR::null())
            .ok()
            .and_then(|value| take_pwstr(value));

        // A token without an Attributes key is malformed, not an error
        let attributes_key = wide(ATTRIBUTES_KEY);
        let attributes = match token.OpenKey(PCWSTR(attributes_key.as_ptr())) {
            Ok(key) => Some(read_values(&key)),
            Err(_) => None,
        };

        Ok(VoiceToken {
            id,
            description,
            attributes,
        })
    }
}

/// Collect every named string value of `key`
unsafe fn read_values(key: &ISpDataKey) -> VoiceAttributes {
    let mut attributes = VoiceAttributes::new();
    let mut index = 0;
    // EnumValues fails with SPERR_NO_MORE_ITEMS past the last value
    while let Ok(name) = unsafe { key.EnumValues(index) } {
        index += 1;
        let Some(name) = (unsafe { take_pwstr(name) }) else {
            continue;
        };
        let name_w = wide(&name);
        if let Ok(value) = unsafe { key.GetStringValue(PCWSTR(name_w.as_ptr())) } {
            if let Some(value) = unsafe { take_pwstr(value) } {
                attributes.insert(name, value);
            }
        }
    }
    attributes
}

/// Create a token object for an existing token id
pub(super) fn token_from_id(id: &str) -> windows::core::Result<ISpObjectToken> {
    let id = wide(id);
    unsafe {
        let token: ISpObjectToken = CoCreateInstance(&SpObjectToken, None, CLSCTX_ALL)?;
        token.SetId(PCWSTR::null(), PCWSTR(id.as_ptr()), BOOL(0))?;
        Ok(token)
    }
}

/// Voice categories read through SAPI's public token category API
#[derive(Debug, Default)]
pub struct SapiVoiceSource;

struct SapiCategory {
    // Released when dropped
    category: ISpObjectTokenCategory,
}

impl TokenCategory for SapiCategory {
    fn find_matching_tokens(
        &self,
        required: Option<&str>,
        optional: Option<&str>,
    ) -> SpeechResult<Vec<VoiceToken>> {
        let tokens = enumerate_tokens(&self.category, required, optional).map_err(|e| {
            SpeechError::unsupported(AugmentStep::EnumerateTokens, e.message().to_string())
        })?;

        tokens
            .iter()
            .map(|token| {
                read_token(token).map_err(|e| {
                    SpeechError::unsupported(
                        AugmentStep::EnumerateTokens,
                        format!("Failed to read voice token: {}", e.message()),
                    )
                })
            })
            .collect()
    }
}

impl VoiceSource for SapiVoiceSource {
    fn open_category(&self, path: &str) -> SpeechResult<Box<dyn TokenCategory + '_>> {
        let category = open_category(path).map_err(|e| {
            SpeechError::unsupported(
                AugmentStep::OpenCategory,
                format!("Failed to open token category {path}: {}", e.message()),
            )
        })?;
        Ok(Box::new(SapiCategory { category }))
    }
}
