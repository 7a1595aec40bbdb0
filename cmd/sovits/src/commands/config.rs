//! Configuration management commands.

use clap::{Args, Subcommand};

use giztoy_cli::Context as CliContext;
use giztoy_speech::{SynthesisParams, VoiceProfile};

use super::{DEFAULT_LANG, DEFAULT_PROMPT_TEXT, DEFAULT_REF_AUDIO, get_config, print_success};
use crate::Cli;

/// Manage CLI configuration.
///
/// Contexts allow you to manage multiple servers and voices,
/// similar to kubectl's context management.
///
/// Configuration is stored in ~/.giztoy/sovits/config.yaml
#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: ConfigSubcommand,
}

#[derive(Subcommand)]
enum ConfigSubcommand {
    /// Add a new context
    #[command(name = "add-context")]
    AddContext {
        /// Context name
        name: String,
        /// Server base URL
        #[arg(long)]
        base_url: Option<String>,
        /// Model version (v1, v2, v2Pro, v2ProPlus, v3, v4)
        #[arg(long)]
        model_version: Option<String>,
        /// Reference audio path, as seen by the server
        #[arg(long)]
        ref_audio: Option<String>,
        /// Transcript of the reference audio
        #[arg(long)]
        prompt_text: Option<String>,
        /// Language of the reference audio transcript
        #[arg(long)]
        prompt_lang: Option<String>,
        /// Language of synthesized text
        #[arg(long)]
        lang: Option<String>,
        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
        /// Per-fragment deadline in seconds
        #[arg(long)]
        fragment_timeout: Option<u64>,
        /// Maximum retries
        #[arg(long)]
        max_retries: Option<u32>,
        /// Random seed (-1 for random)
        #[arg(long, allow_hyphen_values = true)]
        seed: Option<i64>,
        /// Allow overlapping synthesis calls
        #[arg(long)]
        concurrent: bool,
    },
    /// Delete a context
    #[command(name = "delete-context")]
    DeleteContext {
        /// Context name
        name: String,
    },
    /// Set the current context
    #[command(name = "use-context")]
    UseContext {
        /// Context name
        name: String,
    },
    /// Display the current context
    #[command(name = "get-context")]
    GetContext,
    /// List all contexts
    #[command(name = "list-contexts", alias = "get-contexts")]
    ListContexts,
    /// View the current configuration
    View,
}

impl ConfigCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        match &self.command {
            ConfigSubcommand::AddContext {
                name,
                base_url,
                model_version,
                ref_audio,
                prompt_text,
                prompt_lang,
                lang,
                timeout,
                fragment_timeout,
                max_retries,
                seed,
                concurrent,
            } => {
                let mut cfg = get_config(cli)?;

                if let Some(version) = model_version {
                    version.parse::<giztoy_sovits::Version>()?;
                }

                let voice = voice_from_flags(
                    ref_audio.as_deref(),
                    prompt_text.as_deref(),
                    prompt_lang.as_deref(),
                    lang.as_deref(),
                );
                let params = seed.map(|seed| SynthesisParams {
                    seed,
                    ..Default::default()
                });

                let ctx = CliContext {
                    base_url: base_url.clone().unwrap_or_default(),
                    version: model_version.clone().unwrap_or_default(),
                    timeout: timeout.unwrap_or(0),
                    fragment_timeout: fragment_timeout.unwrap_or(0),
                    max_retries: *max_retries,
                    concurrent: *concurrent,
                    voice,
                    params,
                    ..Default::default()
                };

                cfg.add_context(name, ctx)?;
                print_success(&format!("Context \"{}\" added successfully", name));
                Ok(())
            }

            ConfigSubcommand::DeleteContext { name } => {
                let mut cfg = get_config(cli)?;
                cfg.delete_context(name)?;
                print_success(&format!("Context \"{}\" deleted", name));
                Ok(())
            }

            ConfigSubcommand::UseContext { name } => {
                let mut cfg = get_config(cli)?;
                cfg.use_context(name)?;
                print_success(&format!("Switched to context \"{}\"", name));
                Ok(())
            }

            ConfigSubcommand::GetContext => {
                let cfg = get_config(cli)?;
                if cfg.current_context.is_empty() {
                    println!("No current context set");
                } else {
                    println!("{}", cfg.current_context);
                }
                Ok(())
            }

            ConfigSubcommand::ListContexts => {
                let cfg = get_config(cli)?;

                if cfg.contexts.is_empty() {
                    println!("No contexts configured");
                    return Ok(());
                }

                println!("{:<8} {:<20} {:<30} {}", "CURRENT", "NAME", "BASE_URL", "REF_AUDIO");
                for (name, ctx) in &cfg.contexts {
                    let current = if name == &cfg.current_context { "*" } else { "" };
                    let base_url = if ctx.base_url.is_empty() {
                        "(default)"
                    } else {
                        &ctx.base_url
                    };
                    let ref_audio = ctx
                        .voice
                        .as_ref()
                        .map(|v| v.ref_audio_path.as_str())
                        .unwrap_or("(default)");
                    println!("{:<8} {:<20} {:<30} {}", current, name, base_url, ref_audio);
                }

                Ok(())
            }

            ConfigSubcommand::View => {
                let cfg = get_config(cli)?;

                println!("Config file: {}", cfg.path().display());
                println!("Current context: {}", cfg.current_context);
                println!("Contexts: {}", cfg.contexts.len());

                for (name, ctx) in &cfg.contexts {
                    println!("\n  {}:", name);
                    if !ctx.base_url.is_empty() {
                        println!("    Base URL: {}", ctx.base_url);
                    }
                    if !ctx.version.is_empty() {
                        println!("    Model Version: {}", ctx.version);
                    }
                    if ctx.timeout > 0 {
                        println!("    Timeout: {}s", ctx.timeout);
                    }
                    if ctx.fragment_timeout > 0 {
                        println!("    Fragment Timeout: {}s", ctx.fragment_timeout);
                    }
                    if let Some(voice) = &ctx.voice {
                        println!("    Reference Audio: {}", voice.ref_audio_path);
                        println!("    Language: {}", voice.text_lang);
                    }
                    if !ctx.directives.is_empty() {
                        let names: Vec<&str> = ctx.directives.keys().map(|k| k.as_str()).collect();
                        println!("    Directives: {}", names.join(", "));
                    }
                }

                Ok(())
            }
        }
    }
}

/// Builds the context voice from `add-context` flags.
///
/// Without `--ref-audio` the bundled reference clip and its transcript are
/// used, so `--lang`, `--prompt-text` and `--prompt-lang` still apply.
fn voice_from_flags(
    ref_audio: Option<&str>,
    prompt_text: Option<&str>,
    prompt_lang: Option<&str>,
    lang: Option<&str>,
) -> Option<VoiceProfile> {
    if ref_audio.is_none() && prompt_text.is_none() && prompt_lang.is_none() && lang.is_none() {
        return None;
    }
    let (path, default_prompt) = match ref_audio {
        Some(path) => (path, ""),
        None => (DEFAULT_REF_AUDIO, DEFAULT_PROMPT_TEXT),
    };
    let mut voice = VoiceProfile::new(path, lang.unwrap_or(DEFAULT_LANG))
        .with_prompt_text(prompt_text.unwrap_or(default_prompt));
    if let Some(pl) = prompt_lang {
        voice = voice.with_prompt_lang(pl);
    }
    Some(voice)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_from_flags_none() {
        assert!(voice_from_flags(None, None, None, None).is_none());
    }

    #[test]
    fn test_voice_from_flags_without_ref_audio() {
        let voice = voice_from_flags(None, None, Some("en"), Some("zh")).unwrap();
        assert_eq!(voice.ref_audio_path, DEFAULT_REF_AUDIO);
        assert_eq!(voice.prompt_text, DEFAULT_PROMPT_TEXT);
        assert_eq!(voice.text_lang, "zh");
        assert_eq!(voice.effective_prompt_lang(), "en");

        let voice = voice_from_flags(None, Some("Hello there."), None, None).unwrap();
        assert_eq!(voice.ref_audio_path, DEFAULT_REF_AUDIO);
        assert_eq!(voice.prompt_text, "Hello there.");
        assert_eq!(voice.text_lang, DEFAULT_LANG);
    }

    #[test]
    fn test_voice_from_flags_with_ref_audio() {
        let voice = voice_from_flags(Some("/data/me.wav"), Some("Hi."), None, Some("ja")).unwrap();
        assert_eq!(voice.ref_audio_path, "/data/me.wav");
        assert_eq!(voice.prompt_text, "Hi.");
        assert_eq!(voice.effective_prompt_lang(), "ja");

        let voice = voice_from_flags(Some("/data/me.wav"), None, None, None).unwrap();
        assert_eq!(voice.prompt_text, "");
    }
}
