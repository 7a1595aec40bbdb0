//! Client tests against a mocked `api_v2` server.

use std::io::Cursor;
use std::sync::Arc;

use giztoy_sovits::{Client, Error, TtsRequest};
use giztoy_speech::{Serialized, SynthesisParams, Synthesizer, VoiceProfile};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn wav_bytes(sample_rate: u32, samples: &[i16]) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

fn client(server: &MockServer, retries: u32) -> Client {
    Client::builder()
        .base_url(server.uri())
        .max_retries(retries)
        .build()
        .unwrap()
}

fn tts_request(text: &str) -> TtsRequest {
    TtsRequest {
        text: text.to_string(),
        text_lang: "en".to_string(),
        ref_audio_path: "reference.wav".to_string(),
        prompt_text: "The quick brown fox jumps over the lazy dog.".to_string(),
        prompt_lang: "en".to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_synthesize_pcm() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tts"))
        .and(body_partial_json(json!({
            "text": "Hello there.",
            "text_lang": "en",
            "ref_audio_path": "reference.wav",
            "text_split_method": "cut0",
            "media_type": "wav",
            "streaming_mode": false,
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "audio/wav")
                .set_body_bytes(wav_bytes(32000, &[1, 2, 3, 4])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (rate, samples) = client(&server, 0)
        .synthesize_pcm(&tts_request("Hello there."))
        .await
        .unwrap();
    assert_eq!(rate, 32000);
    assert_eq!(samples, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn test_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tts"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "tts failed",
            "Exception": "ref_audio_path reference.wav not found",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server, 3)
        .synthesize(&tts_request("Hello."))
        .await
        .unwrap_err();
    assert!(err.is_invalid_request());
    match err {
        Error::Api { message, exception, .. } => {
            assert_eq!(message, "tts failed");
            assert_eq!(
                exception.as_deref(),
                Some("ref_audio_path reference.wav not found")
            );
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_retry_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tts"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/tts"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(wav_bytes(24000, &[9])))
        .expect(1)
        .mount(&server)
        .await;

    let (rate, samples) = client(&server, 1)
        .synthesize_pcm(&tts_request("Again."))
        .await
        .unwrap();
    assert_eq!(rate, 24000);
    assert_eq!(samples, vec![9]);
}

#[tokio::test]
async fn test_invalid_wav_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tts"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"not a wav".to_vec()))
        .mount(&server)
        .await;

    let err = client(&server, 0)
        .synthesize_pcm(&tts_request("Hello."))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Wav(_)));
}

#[tokio::test]
async fn test_synthesizer_over_http_skips_failed_fragment() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tts"))
        .and(body_partial_json(json!({ "text": "Hahaha." })))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "tts failed",
            "Exception": "boom",
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/tts"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(wav_bytes(32000, &[5, 5])))
        .mount(&server)
        .await;

    let synth = Synthesizer::new(Arc::new(Serialized::new(client(&server, 0))));
    let voice = VoiceProfile::new("reference.wav", "en")
        .with_prompt_text("The quick brown fox jumps over the lazy dog.");

    let mut stream = synth
        .synthesize(
            "Well <laugh/> that's funny.",
            &voice,
            &SynthesisParams::default(),
        )
        .unwrap();

    let mut texts = Vec::new();
    while let Some(result) = stream.next().await {
        assert_eq!(result.sample_rate, 32000);
        texts.push((result.index, result.source_text));
    }
    assert_eq!(
        texts,
        vec![(0, "Well ".to_string()), (2, " that's funny.".to_string())]
    );
    let summary = stream.into_summary();
    assert_eq!(summary.missing(), vec![1]);
    assert!(!summary.is_total_failure());
}

#[tokio::test]
async fn test_unsupported_language_rejected_before_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = Client::builder()
        .base_url(server.uri())
        .version(giztoy_sovits::Version::V1)
        .build()
        .unwrap();
    let synth = Synthesizer::new(Arc::new(client));
    let voice = VoiceProfile::new("reference.wav", "ko");

    let err = synth
        .synthesize("Annyeong.", &voice, &SynthesisParams::default())
        .err()
        .unwrap();
    assert_eq!(err.field(), giztoy_speech::Field::TextLang);
}
