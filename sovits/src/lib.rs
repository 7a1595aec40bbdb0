//! GPT-SoVITS API SDK for Rust.
//!
//! Talks to the `api_v2.py` HTTP server shipped with GPT-SoVITS and
//! implements [`giztoy_speech::Engine`] on top of it.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use giztoy_sovits::{Client, Version};
//! use giztoy_speech::{Serialized, Synthesizer};
//!
//! let client = Client::builder()
//!     .base_url("http://127.0.0.1:9880")
//!     .version(Version::V2)
//!     .build()?;
//! let synth = Synthesizer::new(Arc::new(Serialized::new(client)));
//! ```

mod client;
mod engine;
mod error;
mod types;
mod wav;

pub use client::*;
pub use error::*;
pub use types::*;
pub use wav::*;
