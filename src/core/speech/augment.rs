//! Voice catalog augmentation.
//!
//! Some platforms keep additional voices in a registry location the speech
//! engine does not scan on its own (on Windows, the OneCore voices). This
//! module enumerates such a location through a [`VoiceSource`] and appends
//! every well-formed entry to an engine's [`VoiceCatalog`].

use std::fmt;
use std::str::FromStr;

use tracing::{debug, info};

use super::base::{AugmentStep, SpeechError, SpeechResult, VoiceDescriptor, VoiceToken};
use super::catalog::VoiceCatalog;

/// Registry location of the OneCore voices on Windows
pub const ONE_CORE_VOICES_CATEGORY: &str =
    r"HKEY_LOCAL_MACHINE\SOFTWARE\Microsoft\Speech_OneCore\Voices";

/// Access to registry-like voice categories
pub trait VoiceSource {
    /// Open the category at `path`.
    ///
    /// The returned scope holds the underlying platform resource and releases
    /// it when dropped.
    fn open_category(&self, path: &str) -> SpeechResult<Box<dyn TokenCategory + '_>>;
}

/// An open voice category
pub trait TokenCategory {
    /// Enumerate tokens matching the required and optional attribute filters.
    /// `None` for both matches every token.
    fn find_matching_tokens(
        &self,
        required: Option<&str>,
        optional: Option<&str>,
    ) -> SpeechResult<Vec<VoiceToken>>;
}

/// Counts from one augmentation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AugmentReport {
    /// Voices appended to the catalog
    pub added: usize,
    /// Entries skipped because they carried no attribute set or no `Name`
    pub skipped: usize,
}

/// How startup reacts to augmentation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AugmentPolicy {
    /// Failure aborts startup
    Required,
    /// Failure is logged and startup continues with the default voices
    #[default]
    BestEffort,
    /// Augmentation is not attempted
    Disabled,
}

impl FromStr for AugmentPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "required" => Ok(AugmentPolicy::Required),
            "best_effort" | "besteffort" => Ok(AugmentPolicy::BestEffort),
            "disabled" | "off" | "none" => Ok(AugmentPolicy::Disabled),
            other => Err(format!(
                "Invalid augment policy '{other}'. Must be one of: required, best_effort, disabled"
            )),
        }
    }
}

impl fmt::Display for AugmentPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AugmentPolicy::Required => "required",
            AugmentPolicy::BestEffort => "best_effort",
            AugmentPolicy::Disabled => "disabled",
        };
        f.write_str(name)
    }
}

/// What augmentation amounted to at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AugmentOutcome {
    Augmented(AugmentReport),
    /// Augmentation failed and the policy allowed continuing without it
    Unsupported(String),
    Skipped,
}

/// Append every well-formed token found at `path` to `catalog`.
///
/// Malformed tokens (no attribute set, or no `Name`) are skipped. The catalog
/// is only modified once enumeration finished, so on error it is left exactly
/// as it was.
pub fn augment_voice_catalog(
    source: &dyn VoiceSource,
    path: &str,
    catalog: &mut VoiceCatalog,
) -> SpeechResult<AugmentReport> {
    let staged = {
        let category = source.open_category(path).map_err(|e| match e {
            unsupported @ SpeechError::UnsupportedFeature { .. } => unsupported,
            other => SpeechError::unsupported(AugmentStep::OpenCategory, other.to_string()),
        })?;

        let tokens = category
            .find_matching_tokens(None, None)
            .map_err(|e| match e {
                unsupported @ SpeechError::UnsupportedFeature { .. } => unsupported,
                other => SpeechError::unsupported(AugmentStep::EnumerateTokens, other.to_string()),
            })?;

        let mut staged = Vec::with_capacity(tokens.len());
        let mut skipped = 0;
        for token in &tokens {
            match VoiceDescriptor::from_token(token) {
                Ok(voice) => staged.push(voice),
                Err(e) => {
                    debug!("Skipping malformed voice token: {}", e);
                    skipped += 1;
                }
            }
        }
        (staged, skipped)
        // category scope released here
    };

    let (voices, skipped) = staged;
    let report = AugmentReport {
        added: voices.len(),
        skipped,
    };
    catalog.extend(voices);

    info!(
        "Added {} voice(s) from {} ({} malformed entries skipped)",
        report.added, path, report.skipped
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::speech::memory::{MemoryVoiceSource, token};

    fn default_catalog(count: usize) -> VoiceCatalog {
        VoiceCatalog::new(
            (0..count)
                .map(|i| VoiceDescriptor::named(format!("default-{i}"), format!("Default {i}")))
                .collect(),
        )
    }

    #[test]
    fn test_augment_appends_well_formed_entries_only() {
        let source = MemoryVoiceSource::new().with_category(
            ONE_CORE_VOICES_CATEGORY,
            vec![
                token("MSTTS_V110_jaJP_SayakaM", Some("Microsoft Sayaka")),
                token("MSTTS_V110_jaJP_IchiroM", Some("Microsoft Ichiro")),
                token("BROKEN", None),
            ],
        );
        let mut catalog = default_catalog(5);

        let report =
            augment_voice_catalog(&source, ONE_CORE_VOICES_CATEGORY, &mut catalog).unwrap();

        assert_eq!(report, AugmentReport { added: 2, skipped: 1 });
        assert_eq!(catalog.len(), 7);
        assert!(catalog.find("Microsoft Sayaka").is_some());
        assert!(catalog.find("Microsoft Ichiro").is_some());
    }

    #[test]
    fn test_augment_empty_category_keeps_catalog() {
        let source = MemoryVoiceSource::new().with_category(ONE_CORE_VOICES_CATEGORY, vec![]);
        let mut catalog = default_catalog(3);

        let report =
            augment_voice_catalog(&source, ONE_CORE_VOICES_CATEGORY, &mut catalog).unwrap();

        assert_eq!(report, AugmentReport::default());
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn test_augment_missing_category_fails_at_open() {
        let source = MemoryVoiceSource::new();
        let mut catalog = default_catalog(2);

        let err =
            augment_voice_catalog(&source, ONE_CORE_VOICES_CATEGORY, &mut catalog).unwrap_err();

        match err {
            SpeechError::UnsupportedFeature { step, .. } => {
                assert_eq!(step, AugmentStep::OpenCategory)
            }
            other => panic!("Expected open category failure, got {other:?}"),
        }
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_augment_enumeration_failure_releases_scope() {
        let source = MemoryVoiceSource::new()
            .with_category(ONE_CORE_VOICES_CATEGORY, vec![token("A", Some("A"))])
            .failing_enumeration();
        let mut catalog = default_catalog(1);

        let err =
            augment_voice_catalog(&source, ONE_CORE_VOICES_CATEGORY, &mut catalog).unwrap_err();

        assert!(matches!(
            err,
            SpeechError::UnsupportedFeature {
                step: AugmentStep::EnumerateTokens,
                ..
            }
        ));
        assert_eq!(source.open_scopes(), 0);
        assert_eq!(source.opened_total(), 1);
        assert_eq!(catalog.len(), 1);
    }

    fn nameless_token(id: &str) -> VoiceToken {
        let mut nameless = token(id, Some("ignored"));
        if let Some(attrs) = nameless.attributes.as_mut() {
            attrs.remove("Name");
            attrs.insert("Gender".to_string(), "Female".to_string());
        }
        nameless
    }

    #[test]
    fn test_augment_skips_nameless_entries() {
        let source = MemoryVoiceSource::new().with_category(
            ONE_CORE_VOICES_CATEGORY,
            vec![
                token("GOOD", Some("Good Voice")),
                nameless_token("NAMELESS"),
                token("BLANK", Some("   ")),
                token("OTHER", Some("Other Voice")),
            ],
        );
        let mut catalog = default_catalog(4);

        let report =
            augment_voice_catalog(&source, ONE_CORE_VOICES_CATEGORY, &mut catalog).unwrap();

        assert_eq!(report, AugmentReport { added: 2, skipped: 2 });
        assert_eq!(catalog.len(), 6);
        assert!(catalog.find("Good Voice").is_some());
        assert!(catalog.find("Other Voice").is_some());
        assert_eq!(source.open_scopes(), 0);
    }

    #[test]
    fn test_augment_only_nameless_entries_adds_nothing() {
        let source = MemoryVoiceSource::new()
            .with_category(ONE_CORE_VOICES_CATEGORY, vec![nameless_token("NAMELESS")]);
        let mut catalog = default_catalog(4);

        let report =
            augment_voice_catalog(&source, ONE_CORE_VOICES_CATEGORY, &mut catalog).unwrap();

        assert_eq!(report, AugmentReport { added: 0, skipped: 1 });
        assert_eq!(catalog.len(), 4);
    }

    #[test]
    fn test_augment_policy_from_str() {
        assert_eq!("required".parse::<AugmentPolicy>().unwrap(), AugmentPolicy::Required);
        assert_eq!("best-effort".parse::<AugmentPolicy>().unwrap(), AugmentPolicy::BestEffort);
        assert_eq!("BEST_EFFORT".parse::<AugmentPolicy>().unwrap(), AugmentPolicy::BestEffort);
        assert_eq!("disabled".parse::<AugmentPolicy>().unwrap(), AugmentPolicy::Disabled);
        assert!("sometimes".parse::<AugmentPolicy>().is_err());
    }
}
