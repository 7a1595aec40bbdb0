//! Reference voice and sampling parameters.

use serde::{Deserialize, Serialize};

/// Identifies the reference voice a synthesis is conditioned on.
///
/// A profile is supplied once per synthesis call and is shared by every
/// fragment of that call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceProfile {
    /// Path to the reference audio, passed through to the engine untouched.
    pub ref_audio_path: String,

    /// Additional reference clips used to average the voice timbre.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aux_ref_audio_paths: Vec<String>,

    /// Transcript of the reference audio.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub prompt_text: String,

    /// Language of `prompt_text`. Falls back to `text_lang` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_lang: Option<String>,

    /// Language of the text to synthesize.
    pub text_lang: String,
}

impl VoiceProfile {
    /// Creates a profile for the given reference audio and text language.
    pub fn new(ref_audio_path: impl Into<String>, text_lang: impl Into<String>) -> Self {
        Self {
            ref_audio_path: ref_audio_path.into(),
            text_lang: text_lang.into(),
            ..Default::default()
        }
    }

    /// Sets the transcript of the reference audio.
    pub fn with_prompt_text(mut self, text: impl Into<String>) -> Self {
        self.prompt_text = text.into();
        self
    }

    /// Sets the language of the reference transcript.
    pub fn with_prompt_lang(mut self, lang: impl Into<String>) -> Self {
        self.prompt_lang = Some(lang.into());
        self
    }

    /// Adds an auxiliary reference clip.
    pub fn with_aux_ref(mut self, path: impl Into<String>) -> Self {
        self.aux_ref_audio_paths.push(path.into());
        self
    }

    /// Returns the effective prompt language.
    pub fn effective_prompt_lang(&self) -> &str {
        match self.prompt_lang.as_deref() {
            Some(lang) if !lang.is_empty() => lang,
            _ => &self.text_lang,
        }
    }
}

/// Sampling parameters copied into every per-fragment request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisParams {
    pub top_k: u32,
    pub top_p: f32,
    pub temperature: f32,
    /// Playback speed multiplier.
    pub speed_factor: f32,
    /// `-1` asks the engine for a non-deterministic seed.
    pub seed: i64,
    pub repetition_penalty: f32,
    /// Engine-side splitting strategy. When unset, only the segmenter splits.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split_method: Option<String>,
}

impl Default for SynthesisParams {
    fn default() -> Self {
        Self {
            top_k: 5,
            top_p: 1.0,
            temperature: 1.0,
            speed_factor: 1.0,
            seed: -1,
            repetition_penalty: 1.35,
            split_method: None,
        }
    }
}

#[cfg(test)]
mod voice_tests {
    use super::*;

    #[test]
    fn test_prompt_lang_fallback() {
        let voice = VoiceProfile::new("ref.wav", "en");
        assert_eq!(voice.effective_prompt_lang(), "en");

        let voice = voice.with_prompt_lang("zh");
        assert_eq!(voice.effective_prompt_lang(), "zh");

        let voice = VoiceProfile::new("ref.wav", "ja").with_prompt_lang("");
        assert_eq!(voice.effective_prompt_lang(), "ja");
    }

    #[test]
    fn test_params_partial_deserialize() {
        let params: SynthesisParams = serde_json::from_str(r#"{"top_k": 20, "seed": 42}"#).unwrap();
        assert_eq!(params.top_k, 20);
        assert_eq!(params.seed, 42);
        assert_eq!(params.repetition_penalty, 1.35);
        assert_eq!(params.split_method, None);
    }

    #[test]
    fn test_voice_yaml() {
        let yaml = "ref_audio_path: reference.wav\ntext_lang: en\nprompt_text: hello\n";
        let voice: VoiceProfile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(voice.ref_audio_path, "reference.wav");
        assert!(voice.aux_ref_audio_paths.is_empty());
        assert_eq!(voice.prompt_lang, None);
    }
}
