//! Per-fragment synthesis requests and their validation.

use crate::{Engine, Fragment, SynthesisParams, VoiceProfile};
use std::fmt;

/// Request field named by a [`ValidationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Text,
    TextLang,
    PromptLang,
    RefAudioPath,
    SplitMethod,
    TopK,
    TopP,
    Temperature,
    SpeedFactor,
    RepetitionPenalty,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Text => "text",
            Field::TextLang => "text_lang",
            Field::PromptLang => "prompt_lang",
            Field::RefAudioPath => "ref_audio_path",
            Field::SplitMethod => "split_method",
            Field::TopK => "top_k",
            Field::TopP => "top_p",
            Field::Temperature => "temperature",
            Field::SpeedFactor => "speed_factor",
            Field::RepetitionPenalty => "repetition_penalty",
        };
        f.write_str(name)
    }
}

/// Error type for malformed or unsupported request parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(Field),
    #[error("{field}: {value} not supported")]
    UnsupportedLanguage { field: Field, value: String },
    #[error("split_method: {0} not supported")]
    UnsupportedSplitMethod(String),
    #[error("{field}: {value} out of range, expected {expected}")]
    OutOfRange {
        field: Field,
        value: String,
        expected: &'static str,
    },
}

impl ValidationError {
    /// Returns the field that failed validation.
    pub fn field(&self) -> Field {
        match self {
            ValidationError::Missing(field) => *field,
            ValidationError::UnsupportedLanguage { field, .. } => *field,
            ValidationError::UnsupportedSplitMethod(_) => Field::SplitMethod,
            ValidationError::OutOfRange { field, .. } => *field,
        }
    }
}

/// A single engine call: one fragment spoken in one voice.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    pub text: String,
    /// Lower case.
    pub text_lang: String,
    pub ref_audio_path: String,
    pub aux_ref_audio_paths: Vec<String>,
    pub prompt_text: String,
    /// Lower case, resolved to `text_lang` when the profile has none.
    pub prompt_lang: String,
    pub params: SynthesisParams,
}

/// Builds requests for one synthesis call.
///
/// Construction checks everything that is shared by all fragments, so
/// [`build`](Self::build) only has to look at the fragment itself.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    voice: VoiceProfile,
    params: SynthesisParams,
}

impl RequestBuilder {
    /// Validates the voice and parameters against the engine.
    pub fn new(
        voice: &VoiceProfile,
        params: &SynthesisParams,
        engine: &dyn Engine,
    ) -> Result<Self, ValidationError> {
        if voice.text_lang.is_empty() {
            return Err(ValidationError::Missing(Field::TextLang));
        }
        if voice.ref_audio_path.is_empty() {
            return Err(ValidationError::Missing(Field::RefAudioPath));
        }

        let text_lang = voice.text_lang.to_lowercase();
        let prompt_lang = voice.effective_prompt_lang().to_lowercase();
        check_language(Field::TextLang, &text_lang, engine.languages())?;
        check_language(Field::PromptLang, &prompt_lang, engine.languages())?;

        if let Some(method) = &params.split_method {
            if !engine.split_methods().iter().any(|m| m == method) {
                return Err(ValidationError::UnsupportedSplitMethod(method.clone()));
            }
        }
        check_params(params)?;

        let voice = VoiceProfile {
            text_lang,
            prompt_lang: Some(prompt_lang),
            ..voice.clone()
        };
        Ok(Self {
            voice,
            params: params.clone(),
        })
    }

    /// Returns the normalized voice profile.
    pub fn voice(&self) -> &VoiceProfile {
        &self.voice
    }

    pub fn params(&self) -> &SynthesisParams {
        &self.params
    }

    /// Builds the request speaking the fragment's synthesis text.
    pub fn build(&self, fragment: &Fragment) -> Result<SynthesisRequest, ValidationError> {
        if fragment.synthesis_text.trim().is_empty() {
            return Err(ValidationError::Missing(Field::Text));
        }
        Ok(SynthesisRequest {
            text: fragment.synthesis_text.clone(),
            text_lang: self.voice.text_lang.clone(),
            ref_audio_path: self.voice.ref_audio_path.clone(),
            aux_ref_audio_paths: self.voice.aux_ref_audio_paths.clone(),
            prompt_text: self.voice.prompt_text.clone(),
            prompt_lang: self.voice.effective_prompt_lang().to_string(),
            params: self.params.clone(),
        })
    }
}

/// Validates and builds a single request.
pub fn build(
    fragment: &Fragment,
    voice: &VoiceProfile,
    params: &SynthesisParams,
    engine: &dyn Engine,
) -> Result<SynthesisRequest, ValidationError> {
    RequestBuilder::new(voice, params, engine)?.build(fragment)
}

fn check_language(field: Field, lang: &str, supported: &[String]) -> Result<(), ValidationError> {
    if supported.iter().any(|l| l.eq_ignore_ascii_case(lang)) {
        Ok(())
    } else {
        Err(ValidationError::UnsupportedLanguage {
            field,
            value: lang.to_string(),
        })
    }
}

fn check_params(params: &SynthesisParams) -> Result<(), ValidationError> {
    if params.top_k < 1 {
        return Err(out_of_range(Field::TopK, params.top_k, ">= 1"));
    }
    if !(params.top_p.is_finite() && params.top_p > 0.0 && params.top_p <= 1.0) {
        return Err(out_of_range(Field::TopP, params.top_p, "in (0, 1]"));
    }
    let positive = [
        (Field::Temperature, params.temperature),
        (Field::SpeedFactor, params.speed_factor),
        (Field::RepetitionPenalty, params.repetition_penalty),
    ];
    for (field, value) in positive {
        if !(value.is_finite() && value > 0.0) {
            return Err(out_of_range(field, value, "> 0"));
        }
    }
    Ok(())
}

fn out_of_range(field: Field, value: impl fmt::Display, expected: &'static str) -> ValidationError {
    ValidationError::OutOfRange {
        field,
        value: value.to_string(),
        expected,
    }
}
