//! Speech synthesis command.

use clap::Args;
use giztoy_cli::Output;
use giztoy_speech::Summary;

use super::{
    DirEmitter, JsonLinesEmitter, context_voice, create_synthesizer, get_context, print_success,
    print_verbose, print_warning, read_input,
};
use crate::Cli;

/// Synthesize text into audio.
///
/// By default each fragment is written as one JSON line
/// `{"text", "sample_rate", "audio_data_base64"}` to stdout or the -o file.
/// With --out-dir, fragments are written as numbered WAV files instead.
#[derive(Args)]
pub struct SynthesizeCommand {
    /// Text to synthesize (default: -f request file, then stdin)
    text: Option<String>,

    /// Write NNNN.wav files and index.json into this directory
    #[arg(long)]
    out_dir: Option<String>,

    /// Reference audio path, as seen by the server
    #[arg(long)]
    ref_audio: Option<String>,

    /// Transcript of the reference audio
    #[arg(long)]
    prompt_text: Option<String>,

    /// Language of the text
    #[arg(long)]
    lang: Option<String>,

    /// Random seed (-1 for random)
    #[arg(long, allow_hyphen_values = true)]
    seed: Option<i64>,
}

impl SynthesizeCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let ctx = get_context(cli)?;
        let input = read_input(cli, self.text.as_deref())?;

        let mut voice = input.voice.unwrap_or_else(|| context_voice(&ctx));
        if let Some(path) = &self.ref_audio {
            voice.ref_audio_path = path.clone();
        }
        if let Some(text) = &self.prompt_text {
            voice.prompt_text = text.clone();
        }
        if let Some(lang) = &self.lang {
            voice.text_lang = lang.clone();
        }
        let mut params = input.params.unwrap_or_else(|| ctx.params_or_default());
        if let Some(seed) = self.seed {
            params.seed = seed;
        }

        print_verbose(cli, &format!("Using context: {}", ctx.name));
        print_verbose(cli, &format!("Reference audio: {}", voice.ref_audio_path));
        print_verbose(cli, &format!("Text length: {} characters", input.text.len()));

        let synth = create_synthesizer(&ctx)?;
        let stream = synth.synthesize(&input.text, &voice, &params)?;

        let summary = match &self.out_dir {
            Some(dir) => {
                let mut emitter = DirEmitter::create(dir)?;
                let summary = stream.emit_to(&mut emitter).await?;
                let manifest = emitter.finish(&summary)?;
                print_verbose(cli, &format!("Manifest written to: {}", manifest.display()));
                summary
            }
            None => {
                let writer = Output::new(Default::default(), cli.output.clone()).writer()?;
                let mut emitter = JsonLinesEmitter::new(writer);
                stream.emit_to(&mut emitter).await?
            }
        };

        report(&summary)
    }
}

fn report(summary: &Summary) -> anyhow::Result<()> {
    if summary.is_total_failure() {
        anyhow::bail!("all {} fragments failed to synthesize", summary.fragments);
    }
    for failure in &summary.failures {
        print_warning(&format!(
            "fragment {} ({:?}) skipped: {}",
            failure.index, failure.display_text, failure.error
        ));
    }
    print_success(&format!(
        "Synthesized {}/{} fragments",
        summary.succeeded, summary.fragments
    ));
    Ok(())
}
