//! Wire types for the GPT-SoVITS `api_v2` server.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::Error;

/// Languages understood by v1 models.
pub const LANGUAGES_V1: &[&str] = &["auto", "en", "zh", "ja", "all_zh", "all_ja"];

/// Languages understood by v2 and later models.
pub const LANGUAGES_V2: &[&str] = &[
    "auto", "auto_yue", "en", "zh", "ja", "yue", "ko", "all_zh", "all_ja", "all_yue", "all_ko",
];

/// Server-side text splitting methods.
///
/// `cut0` leaves the text whole, `cut1` groups four sentences, `cut2` groups
/// by fifty characters, `cut3` splits on Chinese full stops, `cut4` on
/// English full stops and `cut5` on any punctuation.
pub const SPLIT_METHODS: &[&str] = &["cut0", "cut1", "cut2", "cut3", "cut4", "cut5"];

/// Split method that disables server-side splitting.
pub const SPLIT_NONE: &str = "cut0";

/// Model version the server was started with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Version {
    #[serde(rename = "v1")]
    V1,
    #[default]
    #[serde(rename = "v2")]
    V2,
    #[serde(rename = "v2Pro")]
    V2Pro,
    #[serde(rename = "v2ProPlus")]
    V2ProPlus,
    #[serde(rename = "v3")]
    V3,
    #[serde(rename = "v4")]
    V4,
}

impl Version {
    /// Returns the languages this model version accepts.
    pub fn languages(&self) -> &'static [&'static str] {
        match self {
            Version::V1 => LANGUAGES_V1,
            _ => LANGUAGES_V2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Version::V1 => "v1",
            Version::V2 => "v2",
            Version::V2Pro => "v2Pro",
            Version::V2ProPlus => "v2ProPlus",
            Version::V3 => "v3",
            Version::V4 => "v4",
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "v1" => Ok(Version::V1),
            "v2" => Ok(Version::V2),
            "v2Pro" => Ok(Version::V2Pro),
            "v2ProPlus" => Ok(Version::V2ProPlus),
            "v3" => Ok(Version::V3),
            "v4" => Ok(Version::V4),
            _ => Err(Error::Config(format!("unknown model version: {s}"))),
        }
    }
}

/// Body of `POST /tts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TtsRequest {
    pub text: String,
    pub text_lang: String,
    pub ref_audio_path: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aux_ref_audio_paths: Vec<String>,
    #[serde(default)]
    pub prompt_text: String,
    pub prompt_lang: String,
    pub top_k: u32,
    pub top_p: f32,
    pub temperature: f32,
    pub text_split_method: String,
    pub batch_size: u32,
    pub speed_factor: f32,
    /// Must stay false: the client expects one complete WAV per request.
    pub streaming_mode: bool,
    pub seed: i64,
    pub parallel_infer: bool,
    pub repetition_penalty: f32,
    pub media_type: String,
}

impl Default for TtsRequest {
    fn default() -> Self {
        Self {
            text: String::new(),
            text_lang: String::new(),
            ref_audio_path: String::new(),
            aux_ref_audio_paths: Vec::new(),
            prompt_text: String::new(),
            prompt_lang: String::new(),
            top_k: 5,
            top_p: 1.0,
            temperature: 1.0,
            text_split_method: SPLIT_NONE.to_string(),
            batch_size: 1,
            speed_factor: 1.0,
            streaming_mode: false,
            seed: -1,
            parallel_infer: true,
            repetition_penalty: 1.35,
            media_type: "wav".to_string(),
        }
    }
}

/// Error body returned with HTTP 400.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub message: String,
    #[serde(default, rename = "Exception")]
    pub exception: Option<String>,
}
