//! Segmentation preview command.

use clap::Args;
use giztoy_cli::{Output, OutputFormat};
use giztoy_speech::Segmenter;
use serde::Serialize;

use super::{create_segmenter, get_context, print_verbose, read_input};
use crate::Cli;

/// Show how text splits into fragments.
///
/// Prints each fragment's display text and the text that is actually
/// synthesized for it. No server is contacted.
#[derive(Args)]
pub struct SegmentCommand {
    /// Text to segment (default: -f request file, then stdin)
    text: Option<String>,
}

#[derive(Serialize)]
struct FragmentRow {
    index: usize,
    display_text: String,
    synthesis_text: String,
}

impl SegmentCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let ctx = get_context(cli)?;
        let input = read_input(cli, self.text.as_deref())?;
        let segmenter = create_segmenter(&ctx)?;

        print_verbose(cli, &format!("Using context: {}", ctx.name));

        let rows: Vec<FragmentRow> = segmenter
            .segment(&input.text)
            .into_iter()
            .enumerate()
            .map(|(index, f)| FragmentRow {
                index,
                display_text: f.display_text,
                synthesis_text: f.synthesis_text,
            })
            .collect();

        let format = if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Yaml
        };
        Output::new(format, cli.output.clone()).write(&rows)
    }
}
