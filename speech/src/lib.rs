//! Streaming speech synthesis over marked-up text.
//!
//! This crate provides:
//! - [`MarkupSegmenter`] and [`Fragment`]: sentence and directive segmentation
//! - [`RequestBuilder`] and [`SynthesisRequest`]: validated per-fragment requests
//! - [`Engine`]: the synthesis capability, with [`Serialized`] and [`Deadline`] wrappers
//! - [`Synthesizer`] and [`SynthesisStream`]: lazy, ordered, failure-isolating synthesis
//! - [`ResultEmitter`]: the boundary to encoding and transport
//!
//! # Example
//!
//! ```rust,ignore
//! use giztoy_speech::{Synthesizer, SynthesisParams, VoiceProfile};
//!
//! let synth = Synthesizer::new(engine);
//! let voice = VoiceProfile::new("reference.wav", "en")
//!     .with_prompt_text("The quick brown fox jumps over the lazy dog.");
//!
//! let mut stream = synth.synthesize("Well <laugh/> that's funny.", &voice, &SynthesisParams::default())?;
//! while let Some(result) = stream.next().await {
//!     play(result.sample_rate, &result.samples);
//! }
//! ```

mod emit;
mod engine;
mod request;
mod segment;
mod synth;
mod voice;

pub use emit::*;
pub use engine::*;
pub use request::*;
pub use segment::*;
pub use synth::*;
pub use voice::*;
