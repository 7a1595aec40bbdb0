//! Result emitters for the synthesize and worker commands.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use giztoy_cli::{encode_wav, wav_data_uri};
use giztoy_speech::{EmitError, ResultEmitter, Summary, SynthesisResult};
use serde::Serialize;

/// One synthesized fragment as a WAV data URI.
#[derive(Debug, Clone, Serialize)]
pub struct AudioPayload {
    pub text: String,
    pub sample_rate: u32,
    pub audio_data_base64: String,
}

impl AudioPayload {
    pub fn encode(result: &SynthesisResult) -> Result<Self, EmitError> {
        let wav = encode_wav(result.sample_rate, &result.samples)
            .map_err(|e| EmitError::Encode(e.to_string()))?;
        Ok(Self {
            text: result.source_text.clone(),
            sample_rate: result.sample_rate,
            audio_data_base64: wav_data_uri(&wav),
        })
    }
}

/// Writes one JSON object per result, one per line.
pub struct JsonLinesEmitter<W> {
    writer: W,
}

impl<W: Write + Send> JsonLinesEmitter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<W: Write + Send> ResultEmitter for JsonLinesEmitter<W> {
    async fn emit(&mut self, result: SynthesisResult) -> Result<(), EmitError> {
        let payload = AudioPayload::encode(&result)?;
        let line = serde_json::to_string(&payload).map_err(|e| EmitError::Encode(e.to_string()))?;
        writeln!(self.writer, "{}", line)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Manifest entry for one written file.
#[derive(Debug, Clone, Serialize)]
pub struct ManifestEntry {
    pub index: usize,
    pub file: String,
    pub text: String,
    pub sample_rate: u32,
    pub duration_ms: u128,
}

#[derive(Debug, Serialize)]
struct Manifest<'a> {
    fragments: usize,
    files: &'a [ManifestEntry],
    missing: Vec<usize>,
}

/// Writes each result to `NNNN.wav` in a directory.
///
/// [`finish`](Self::finish) writes `index.json` listing the files and the
/// fragments without audio.
pub struct DirEmitter {
    dir: PathBuf,
    entries: Vec<ManifestEntry>,
}

impl DirEmitter {
    pub fn create(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            entries: Vec::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    /// Writes the manifest and returns its path.
    pub fn finish(&self, summary: &Summary) -> Result<PathBuf, EmitError> {
        let manifest = Manifest {
            fragments: summary.fragments,
            files: &self.entries,
            missing: summary.missing(),
        };
        let content =
            serde_json::to_vec_pretty(&manifest).map_err(|e| EmitError::Encode(e.to_string()))?;
        let path = self.dir.join("index.json");
        std::fs::write(&path, content)?;
        Ok(path)
    }
}

#[async_trait]
impl ResultEmitter for DirEmitter {
    async fn emit(&mut self, result: SynthesisResult) -> Result<(), EmitError> {
        let wav = encode_wav(result.sample_rate, &result.samples)
            .map_err(|e| EmitError::Encode(e.to_string()))?;
        let file = format!("{:04}.wav", result.index);
        std::fs::write(self.dir.join(&file), wav)?;
        self.entries.push(ManifestEntry {
            index: result.index,
            file,
            duration_ms: result.duration().as_millis(),
            text: result.source_text,
            sample_rate: result.sample_rate,
        });
        Ok(())
    }
}
