//! Streaming synthesis over segmented text.

use crate::engine::samples_duration;
use crate::{
    Engine, EngineError, EmitError, Fragment, MarkupSegmenter, RequestBuilder, ResultEmitter,
    Segmenter, SynthesisParams, ValidationError, VoiceProfile,
};
use futures::Stream;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Audio for one successfully synthesized fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisResult {
    /// Position of the fragment in the segmentation of the input.
    pub index: usize,
    /// The fragment's display text.
    pub source_text: String,
    pub sample_rate: u32,
    pub samples: Vec<i16>,
}

impl SynthesisResult {
    pub fn duration(&self) -> Duration {
        samples_duration(self.sample_rate, self.samples.len())
    }
}

/// A fragment that produced no audio.
#[derive(Debug)]
pub struct FragmentFailure {
    pub index: usize,
    pub display_text: String,
    pub error: EngineError,
}

/// Outcome of one synthesis call, complete once the stream is exhausted.
#[derive(Debug, Default)]
pub struct Summary {
    /// Number of fragments the input segmented into.
    pub fragments: usize,
    pub succeeded: usize,
    /// Skipped fragments, in order.
    pub failures: Vec<FragmentFailure>,
}

impl Summary {
    /// Returns the number of fragments attempted so far.
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failures.len()
    }

    /// Returns true if every fragment was attempted and none failed.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.attempted() == self.fragments
    }

    /// Returns true if there was something to say but nothing was produced.
    ///
    /// Distinguishes a broken engine from an input with no fragments.
    pub fn is_total_failure(&self) -> bool {
        self.fragments > 0 && self.succeeded == 0 && self.failures.len() == self.fragments
    }

    /// Returns the indices of fragments without audio.
    pub fn missing(&self) -> Vec<usize> {
        self.failures.iter().map(|f| f.index).collect()
    }
}

/// Drives an engine over segmented text.
#[derive(Clone)]
pub struct Synthesizer {
    engine: Arc<dyn Engine>,
    segmenter: Arc<dyn Segmenter>,
}

impl Synthesizer {
    /// Creates a synthesizer using the default markup segmenter.
    pub fn new(engine: Arc<dyn Engine>) -> Self {
        Self {
            engine,
            segmenter: Arc::new(MarkupSegmenter::default()),
        }
    }

    /// Replaces the segmenter.
    pub fn with_segmenter(mut self, segmenter: Arc<dyn Segmenter>) -> Self {
        self.segmenter = segmenter;
        self
    }

    pub fn engine(&self) -> &Arc<dyn Engine> {
        &self.engine
    }

    /// Returns the fragments the text would be synthesized as.
    pub fn segment(&self, text: &str) -> Vec<Fragment> {
        self.segmenter.segment(text)
    }

    /// Starts synthesizing the text.
    ///
    /// Validation happens here, before any engine call. No audio is produced
    /// until the returned stream is polled.
    pub fn synthesize(
        &self,
        text: &str,
        voice: &VoiceProfile,
        params: &SynthesisParams,
    ) -> Result<SynthesisStream, ValidationError> {
        let builder = RequestBuilder::new(voice, params, self.engine.as_ref())?;
        let fragments = self.segmenter.segment(text);
        debug!(fragments = fragments.len(), "speech: synthesis started");
        Ok(SynthesisStream::new(self.engine.clone(), builder, fragments))
    }

    /// Runs one throwaway synthesis to completion.
    ///
    /// Engines typically compile kernels and fill caches on the first call.
    pub async fn warm_up(
        &self,
        text: &str,
        voice: &VoiceProfile,
        params: &SynthesisParams,
    ) -> Result<Summary, ValidationError> {
        let mut stream = self.synthesize(text, voice, params)?;
        while stream.next().await.is_some() {}
        let summary = stream.into_summary();
        debug!(
            succeeded = summary.succeeded,
            failed = summary.failures.len(),
            "speech: warm-up finished"
        );
        Ok(summary)
    }
}

/// Lazily synthesized results of one call, in fragment order.
///
/// Each call to [`next`](Self::next) performs at most the engine calls
/// needed to produce one result. Dropping the stream stops synthesis.
pub struct SynthesisStream {
    engine: Arc<dyn Engine>,
    builder: RequestBuilder,
    pending: std::iter::Enumerate<std::vec::IntoIter<Fragment>>,
    /// Fragment whose engine call has started but not resolved.
    current: Option<(usize, Fragment)>,
    summary: Summary,
}

impl SynthesisStream {
    fn new(engine: Arc<dyn Engine>, builder: RequestBuilder, fragments: Vec<Fragment>) -> Self {
        let summary = Summary {
            fragments: fragments.len(),
            ..Default::default()
        };
        Self {
            engine,
            builder,
            pending: fragments.into_iter().enumerate(),
            current: None,
            summary,
        }
    }

    /// Returns the next result, or `None` once every fragment was attempted.
    ///
    /// Fragments the engine fails on are logged, recorded in the summary and
    /// skipped.
    ///
    /// Cancel safe: if the returned future is dropped while an engine call is
    /// pending, that fragment stays queued and the next call retries it.
    pub async fn next(&mut self) -> Option<SynthesisResult> {
        loop {
            let (index, fragment) = match &self.current {
                Some(current) => current.clone(),
                None => {
                    let next = self.pending.next()?;
                    self.current = Some(next.clone());
                    next
                }
            };
            let outcome = self.synthesize_fragment(&fragment).await;
            self.current = None;

            match outcome {
                Ok((sample_rate, samples)) => {
                    self.summary.succeeded += 1;
                    debug!(index, samples = samples.len(), "speech: fragment synthesized");
                    return Some(SynthesisResult {
                        index,
                        source_text: fragment.display_text,
                        sample_rate,
                        samples,
                    });
                }
                Err(error) => {
                    warn!(
                        index,
                        text = %fragment.display_text,
                        error = %error,
                        "speech: fragment synthesis failed, skipping"
                    );
                    self.summary.failures.push(FragmentFailure {
                        index,
                        display_text: fragment.display_text,
                        error,
                    });
                }
            }
        }
    }

    async fn synthesize_fragment(&self, fragment: &Fragment) -> Result<(u32, Vec<i16>), EngineError> {
        let request = self
            .builder
            .build(fragment)
            .map_err(|e| EngineError::Other(e.to_string()))?;
        let audio = self.engine.synthesize_one(&request).await?;
        if audio.sample_rate == 0 {
            return Err(EngineError::InvalidAudio("sample rate is zero".to_string()));
        }
        Ok((audio.sample_rate, audio.samples))
    }

    /// Returns the number of fragments not attempted yet.
    pub fn remaining(&self) -> usize {
        self.pending.len() + usize::from(self.current.is_some())
    }

    /// Returns the outcome so far.
    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn into_summary(self) -> Summary {
        self.summary
    }

    /// Converts into a [`futures::Stream`]. The summary is discarded.
    pub fn into_stream(self) -> impl Stream<Item = SynthesisResult> + Send {
        futures::stream::unfold(self, |mut stream| async move {
            let result = stream.next().await?;
            Some((result, stream))
        })
    }

    /// Forwards every result to the emitter.
    ///
    /// Stops at the first emitter error; the remaining fragments are not
    /// synthesized.
    pub async fn emit_to(mut self, emitter: &mut dyn ResultEmitter) -> Result<Summary, EmitError> {
        while let Some(result) = self.next().await {
            emitter.emit(result).await?;
        }
        Ok(self.summary)
    }
}

#[cfg(test)]
mod synth_tests {
    use super::*;

    #[test]
    fn test_summary_states() {
        let empty = Summary::default();
        assert!(empty.is_complete());
        assert!(!empty.is_total_failure());

        let failed = Summary {
            fragments: 2,
            succeeded: 0,
            failures: vec![
                FragmentFailure {
                    index: 0,
                    display_text: "a".to_string(),
                    error: EngineError::Failed("x".to_string()),
                },
                FragmentFailure {
                    index: 1,
                    display_text: "b".to_string(),
                    error: EngineError::Failed("y".to_string()),
                },
            ],
        };
        assert!(failed.is_total_failure());
        assert!(!failed.is_complete());
        assert_eq!(failed.missing(), vec![0, 1]);

        let partial = Summary {
            fragments: 3,
            succeeded: 1,
            failures: Vec::new(),
        };
        assert_eq!(partial.attempted(), 1);
        assert!(!partial.is_complete());
        assert!(!partial.is_total_failure());
    }

    #[test]
    fn test_result_duration() {
        let result = SynthesisResult {
            index: 0,
            source_text: "hi".to_string(),
            sample_rate: 16000,
            samples: vec![0; 8000],
        };
        assert_eq!(result.duration(), Duration::from_millis(500));
    }
}
