use super::base::VoiceDescriptor;

/// Ordered collection of voices known to an engine handle
#[derive(Debug, Clone, Default)]
pub struct VoiceCatalog {
    voices: Vec<VoiceDescriptor>,
}

impl VoiceCatalog {
    pub fn new(voices: Vec<VoiceDescriptor>) -> Self {
        Self { voices }
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn push(&mut self, voice: VoiceDescriptor) {
        self.voices.push(voice);
    }

    pub fn extend(&mut self, voices: impl IntoIterator<Item = VoiceDescriptor>) {
        self.voices.extend(voices);
    }

    pub fn iter(&self) -> impl Iterator<Item = &VoiceDescriptor> {
        self.voices.iter()
    }

    /// Exact, case-sensitive lookup by display name. First match wins.
    pub fn find(&self, name: &str) -> Option<&VoiceDescriptor> {
        self.voices.iter().find(|voice| voice.name == name)
    }
}

impl<'a> IntoIterator for &'a VoiceCatalog {
    type Item = &'a VoiceDescriptor;
    type IntoIter = std::slice::Iter<'a, VoiceDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.voices.iter()
    }
}
