//! Synthesis engine capability.

use crate::SynthesisRequest;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Error type for a single engine call.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("synthesis failed: {0}")]
    Failed(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("invalid audio: {0}")]
    InvalidAudio(String),
    #[error("other error: {0}")]
    Other(String),
}

/// Mono 16-bit PCM returned by an engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Audio {
    pub sample_rate: u32,
    pub samples: Vec<i16>,
}

impl Audio {
    pub fn new(sample_rate: u32, samples: Vec<i16>) -> Self {
        Self {
            sample_rate,
            samples,
        }
    }

    /// Returns the playback duration.
    pub fn duration(&self) -> Duration {
        samples_duration(self.sample_rate, self.samples.len())
    }
}

pub(crate) fn samples_duration(sample_rate: u32, samples: usize) -> Duration {
    if sample_rate == 0 {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(samples as f64 / sample_rate as f64)
}

/// A loaded speech synthesis engine.
///
/// Engines hold model weights and are shared across synthesis calls. The
/// orchestrator never issues two overlapping calls from one synthesis, but
/// separate synthesis calls may reach the same engine concurrently; wrap the
/// engine in [`Serialized`] if it cannot handle that.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Languages accepted for `text_lang` and `prompt_lang`, lower case.
    fn languages(&self) -> &[String];

    /// Engine-side text splitting strategies.
    fn split_methods(&self) -> &[String];

    /// Synthesizes one request into a single complete clip.
    async fn synthesize_one(&self, request: &SynthesisRequest) -> Result<Audio, EngineError>;
}

#[async_trait]
impl<E: Engine + ?Sized> Engine for Arc<E> {
    fn languages(&self) -> &[String] {
        (**self).languages()
    }

    fn split_methods(&self) -> &[String] {
        (**self).split_methods()
    }

    async fn synthesize_one(&self, request: &SynthesisRequest) -> Result<Audio, EngineError> {
        (**self).synthesize_one(request).await
    }
}

/// Allows at most one call in flight across all users of the engine.
pub struct Serialized<E> {
    inner: E,
    lock: Mutex<()>,
}

impl<E: Engine> Serialized<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            lock: Mutex::new(()),
        }
    }

    /// Returns the wrapped engine.
    pub fn inner(&self) -> &E {
        &self.inner
    }
}

#[async_trait]
impl<E: Engine> Engine for Serialized<E> {
    fn languages(&self) -> &[String] {
        self.inner.languages()
    }

    fn split_methods(&self) -> &[String] {
        self.inner.split_methods()
    }

    async fn synthesize_one(&self, request: &SynthesisRequest) -> Result<Audio, EngineError> {
        let _guard = self.lock.lock().await;
        self.inner.synthesize_one(request).await
    }
}

/// Fails calls that take longer than a fixed deadline.
///
/// The timed-out call is dropped; whatever the engine does with abandoned
/// work is up to the engine.
pub struct Deadline<E> {
    inner: E,
    timeout: Duration,
}

impl<E: Engine> Deadline<E> {
    pub fn new(inner: E, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl<E: Engine> Engine for Deadline<E> {
    fn languages(&self) -> &[String] {
        self.inner.languages()
    }

    fn split_methods(&self) -> &[String] {
        self.inner.split_methods()
    }

    async fn synthesize_one(&self, request: &SynthesisRequest) -> Result<Audio, EngineError> {
        match tokio::time::timeout(self.timeout, self.inner.synthesize_one(request)).await {
            Ok(result) => result,
            Err(_) => Err(EngineError::Timeout(self.timeout)),
        }
    }
}
