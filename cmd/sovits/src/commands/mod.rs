//! CLI commands module.

mod config;
mod emit;
mod segment;
mod synthesize;
mod util;
mod worker;

pub use config::ConfigCommand;
pub use segment::SegmentCommand;
pub use synthesize::SynthesizeCommand;
pub use worker::WorkerCommand;

pub(crate) use emit::*;
pub(crate) use util::*;
