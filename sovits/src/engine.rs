//! [`Engine`] implementation backed by a GPT-SoVITS server.

use async_trait::async_trait;
use giztoy_speech::{Audio, Engine, EngineError, SynthesisRequest};

use super::{
    client::Client,
    error::Error,
    types::{TtsRequest, SPLIT_NONE},
};

impl From<&SynthesisRequest> for TtsRequest {
    fn from(req: &SynthesisRequest) -> Self {
        let params = &req.params;
        TtsRequest {
            text: req.text.clone(),
            text_lang: req.text_lang.clone(),
            ref_audio_path: req.ref_audio_path.clone(),
            aux_ref_audio_paths: req.aux_ref_audio_paths.clone(),
            prompt_text: req.prompt_text.clone(),
            prompt_lang: req.prompt_lang.clone(),
            top_k: params.top_k,
            top_p: params.top_p,
            temperature: params.temperature,
            text_split_method: params
                .split_method
                .clone()
                .unwrap_or_else(|| SPLIT_NONE.to_string()),
            speed_factor: params.speed_factor,
            seed: params.seed,
            repetition_penalty: params.repetition_penalty,
            ..Default::default()
        }
    }
}

impl From<Error> for EngineError {
    fn from(err: Error) -> Self {
        match err {
            Error::Wav(e) => EngineError::InvalidAudio(e.to_string()),
            Error::Http(e) if e.is_timeout() => EngineError::Failed(format!("request timed out: {e}")),
            other => EngineError::Failed(other.to_string()),
        }
    }
}

#[async_trait]
impl Engine for Client {
    fn languages(&self) -> &[String] {
        self.language_list()
    }

    fn split_methods(&self) -> &[String] {
        self.split_method_list()
    }

    async fn synthesize_one(&self, request: &SynthesisRequest) -> Result<Audio, EngineError> {
        let (sample_rate, samples) = self.synthesize_pcm(&TtsRequest::from(request)).await?;
        Ok(Audio::new(sample_rate, samples))
    }
}
