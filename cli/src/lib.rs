//! CLI utilities for giztoy speech tools.
//!
//! Context configuration, structured output and audio encoding shared by
//! the command line binaries.

pub mod config;
pub mod output;
pub mod wav;

pub use config::{Config, Context, load_config};
pub use output::{Output, OutputFormat, print_verbose};
pub use wav::{WAV_DATA_URI_PREFIX, encode_wav, wav_data_uri};
