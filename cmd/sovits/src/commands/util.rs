//! Utility functions for CLI commands.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use giztoy_cli::{Config, Context, load_config};
use giztoy_sovits::{Client, Version};
use giztoy_speech::{
    Deadline, Engine, MarkupSegmenter, Serialized, SynthesisParams, Synthesizer, VoiceProfile,
};
use serde::Deserialize;

use crate::Cli;

const APP_NAME: &str = "sovits";

/// Reference clip used when the context names no voice.
pub const DEFAULT_REF_AUDIO: &str = "reference.wav";
/// Transcript of [`DEFAULT_REF_AUDIO`].
pub const DEFAULT_PROMPT_TEXT: &str = "The quick brown fox jumps over the lazy dog.";
/// Language of [`DEFAULT_REF_AUDIO`] and of synthesized text.
pub const DEFAULT_LANG: &str = "en";

/// A synthesis request file, or one worker job input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpeakInput {
    #[serde(default)]
    pub text: String,
    /// Overrides the context voice.
    #[serde(default)]
    pub voice: Option<VoiceProfile>,
    /// Overrides the context parameters.
    #[serde(default)]
    pub params: Option<SynthesisParams>,
}

/// Gets the global configuration.
pub fn get_config(cli: &Cli) -> anyhow::Result<Config> {
    load_config(APP_NAME, cli.config.as_deref())
}

/// Gets the context configuration to use.
///
/// Without any configured context, the local server defaults are used.
pub fn get_context(cli: &Cli) -> anyhow::Result<Context> {
    let cfg = get_config(cli)?;

    if let Some(ctx) = cfg.resolve_context(cli.context.as_deref()) {
        return Ok(ctx.clone());
    }
    match cli.context.as_deref() {
        Some(name) => anyhow::bail!("context '{}' not found", name),
        None if cfg.contexts.is_empty() => {
            print_verbose(cli, "No context configured, using local defaults");
            Ok(Context {
                name: "default".to_string(),
                ..Default::default()
            })
        }
        None => anyhow::bail!(
            "no context specified. Use -c flag or set a default context with 'sovits config use-context'"
        ),
    }
}

/// Loads a request from a YAML or JSON file.
pub fn load_request<T: serde::de::DeserializeOwned>(path: &str) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)?;
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("yaml");

    let result = match ext.to_lowercase().as_str() {
        "json" => serde_json::from_str(&content)?,
        _ => serde_yaml::from_str(&content)?,
    };

    Ok(result)
}

/// Resolves the input: positional text, then the `-f` request file, then stdin.
pub fn read_input(cli: &Cli, text: Option<&str>) -> anyhow::Result<SpeakInput> {
    if let Some(text) = text {
        return Ok(SpeakInput {
            text: text.to_string(),
            ..Default::default()
        });
    }
    if let Some(path) = cli.input.as_deref() {
        return load_request(path);
    }
    let mut text = String::new();
    std::io::stdin().read_to_string(&mut text)?;
    Ok(SpeakInput {
        text,
        ..Default::default()
    })
}

/// Returns the context voice, or the bundled default reference.
pub fn context_voice(ctx: &Context) -> VoiceProfile {
    ctx.voice.clone().unwrap_or_else(|| {
        VoiceProfile::new(DEFAULT_REF_AUDIO, DEFAULT_LANG).with_prompt_text(DEFAULT_PROMPT_TEXT)
    })
}

/// Returns the segmenter for the context's directives.
///
/// Context directives extend the built-in `<laugh/>`, and may replace it by name.
pub fn create_segmenter(ctx: &Context) -> anyhow::Result<MarkupSegmenter> {
    let mut segmenter = MarkupSegmenter::default();
    for (name, utterance) in &ctx.directives {
        segmenter = segmenter.with_directive(name.as_str(), utterance.as_str())?;
    }
    Ok(segmenter)
}

/// Creates a GPT-SoVITS client from context configuration.
pub fn create_client(ctx: &Context) -> anyhow::Result<Client> {
    let mut builder = Client::builder();

    if !ctx.base_url.is_empty() {
        builder = builder.base_url(&ctx.base_url);
    }
    if !ctx.version.is_empty() {
        builder = builder.version(ctx.version.parse::<Version>()?);
    }
    if !ctx.languages.is_empty() {
        builder = builder.languages(ctx.languages.iter().cloned());
    }
    if ctx.timeout > 0 {
        builder = builder.timeout(Duration::from_secs(ctx.timeout));
    }
    if let Some(retries) = ctx.max_retries {
        builder = builder.max_retries(retries);
    }

    Ok(builder.build()?)
}

/// Creates the engine stack and synthesizer for the context.
///
/// Unless the context allows concurrent calls, every synthesis sharing the
/// returned synthesizer waits for the server one fragment at a time.
pub fn create_synthesizer(ctx: &Context) -> anyhow::Result<Synthesizer> {
    let mut engine: Arc<dyn Engine> = Arc::new(create_client(ctx)?);
    if ctx.fragment_timeout > 0 {
        engine = Arc::new(Deadline::new(
            engine,
            Duration::from_secs(ctx.fragment_timeout),
        ));
    }
    if !ctx.concurrent {
        engine = Arc::new(Serialized::new(engine));
    }
    Ok(Synthesizer::new(engine).with_segmenter(Arc::new(create_segmenter(ctx)?)))
}

/// Prints verbose output if enabled.
pub fn print_verbose(cli: &Cli, msg: &str) {
    giztoy_cli::print_verbose(cli.verbose, msg);
}

/// Prints success message.
pub fn print_success(msg: &str) {
    eprintln!("\x1b[32m✓\x1b[0m {}", msg);
}

/// Prints warning message.
pub fn print_warning(msg: &str) {
    eprintln!("\x1b[33m⚠\x1b[0m {}", msg);
}

#[cfg(test)]
mod tests {
    use super::*;
    use giztoy_speech::Segmenter;
    use std::collections::BTreeMap;

    #[test]
    fn test_context_voice_default() {
        let voice = context_voice(&Context::default());
        assert_eq!(voice.ref_audio_path, DEFAULT_REF_AUDIO);
        assert_eq!(voice.prompt_text, DEFAULT_PROMPT_TEXT);
        assert_eq!(voice.effective_prompt_lang(), "en");
    }

    fn synthesis_texts(segmenter: &MarkupSegmenter, text: &str) -> Vec<String> {
        segmenter
            .segment(text)
            .into_iter()
            .map(|f| f.synthesis_text)
            .collect()
    }

    #[test]
    fn test_create_segmenter_directives() {
        let ctx = Context {
            directives: BTreeMap::from([("sigh".to_string(), "Haah.".to_string())]),
            ..Default::default()
        };
        let segmenter = create_segmenter(&ctx).unwrap();
        assert_eq!(synthesis_texts(&segmenter, "<laugh/>"), vec!["Hahaha."]);
        assert_eq!(
            synthesis_texts(&segmenter, "Well <laugh/> ok <sigh/>"),
            vec!["Well ", "Hahaha.", " ok ", "Haah."]
        );

        let default = create_segmenter(&Context::default()).unwrap();
        assert_eq!(synthesis_texts(&default, "<laugh/>"), vec!["Hahaha."]);
    }

    #[test]
    fn test_create_segmenter_overrides_laugh() {
        let ctx = Context {
            directives: BTreeMap::from([("laugh".to_string(), "Hehe.".to_string())]),
            ..Default::default()
        };
        let segmenter = create_segmenter(&ctx).unwrap();
        assert_eq!(segmenter.directives().len(), 1);
        assert_eq!(synthesis_texts(&segmenter, "<laugh/>"), vec!["Hehe."]);
    }

    #[test]
    fn test_create_segmenter_rejects_empty_utterance() {
        let ctx = Context {
            directives: BTreeMap::from([("sigh".to_string(), String::new())]),
            ..Default::default()
        };
        let err = create_segmenter(&ctx).unwrap_err();
        assert!(err.to_string().contains("empty utterance"));
        assert!(create_synthesizer(&ctx).is_err());
    }

    #[test]
    fn test_create_client_from_context() {
        let ctx = Context {
            base_url: "http://gpu-box:9880".to_string(),
            version: "v1".to_string(),
            max_retries: Some(0),
            ..Default::default()
        };
        let client = create_client(&ctx).unwrap();
        assert_eq!(client.base_url(), "http://gpu-box:9880");
        assert_eq!(client.version(), Version::V1);

        let bad = Context {
            version: "v9".to_string(),
            ..Default::default()
        };
        assert!(create_client(&bad).is_err());
    }

    #[test]
    fn test_load_request_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("req.yaml");
        std::fs::write(
            &path,
            "text: Well <laugh/> that's funny.\nparams:\n  seed: 7\n",
        )
        .unwrap();
        let input: SpeakInput = load_request(path.to_str().unwrap()).unwrap();
        assert_eq!(input.text, "Well <laugh/> that's funny.");
        assert!(input.voice.is_none());
        assert_eq!(input.params.unwrap().seed, 7);
    }
}
