//! sovits CLI - streaming speech synthesis against a GPT-SoVITS server.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{ConfigCommand, SegmentCommand, SynthesizeCommand, WorkerCommand};

/// sovits CLI - streaming speech synthesis against a GPT-SoVITS server.
///
/// Marked-up text is split into sentences and inline directives such as
/// `<laugh/>`, each fragment is synthesized in the configured reference
/// voice, and audio is streamed out fragment by fragment.
///
/// Configuration is stored in ~/.giztoy/sovits/ and supports multiple contexts,
/// similar to kubectl's context management.
#[derive(Parser)]
#[command(name = "sovits")]
#[command(about = "GPT-SoVITS speech synthesis CLI tool")]
#[command(version)]
pub struct Cli {
    /// Config file (default is ~/.giztoy/sovits/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Context name to use
    #[arg(short = 'c', long, global = true)]
    pub context: Option<String>,

    /// Output file (default: stdout)
    #[arg(short = 'o', long, global = true)]
    pub output: Option<String>,

    /// Input request file (YAML or JSON)
    #[arg(short = 'f', long = "file", global = true)]
    pub input: Option<String>,

    /// Output as JSON (for piping)
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage CLI configuration
    Config(ConfigCommand),
    /// Show how text splits into fragments
    Segment(SegmentCommand),
    /// Synthesize text into audio
    Synthesize(SynthesizeCommand),
    /// Serve line-delimited JSON jobs from stdin
    Worker(WorkerCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Config(cmd) => cmd.run(&cli).await,
        Commands::Segment(cmd) => cmd.run(&cli).await,
        Commands::Synthesize(cmd) => cmd.run(&cli).await,
        Commands::Worker(cmd) => cmd.run(&cli).await,
    }
}
