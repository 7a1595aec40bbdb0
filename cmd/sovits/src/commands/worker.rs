//! Line-delimited JSON job worker.
//!
//! Reads jobs `{"id": "...", "input": {"text": "..."}}` from stdin, one per
//! line, and writes one JSON event per line to stdout: an `IN_PROGRESS`
//! event per synthesized fragment followed by a final `COMPLETED` or
//! `FAILED` event for the job.

use std::sync::Arc;

use async_trait::async_trait;
use clap::Args;
use giztoy_cli::Context;
use giztoy_speech::{EmitError, ResultEmitter, Summary, SynthesisResult, Synthesizer};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{Semaphore, mpsc};
use tracing::{info, warn};

use super::{AudioPayload, SpeakInput, context_voice, create_synthesizer, get_context};
use crate::Cli;

/// Text synthesized once at startup so the first job does not pay for it.
pub const WARM_UP_TEXT: &str = "Hey this is just a test to warm up.";

/// Serve line-delimited JSON jobs from stdin.
#[derive(Args)]
pub struct WorkerCommand {
    /// Skip the warm-up synthesis at startup
    #[arg(long)]
    no_warm_up: bool,

    /// Number of jobs handled at once
    #[arg(long, default_value_t = 1)]
    concurrency: usize,
}

#[derive(Debug, Deserialize)]
struct Job {
    #[serde(default)]
    id: String,
    #[serde(default)]
    input: SpeakInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum Status {
    InProgress,
    Completed,
    Failed,
}

#[derive(Debug, Serialize)]
struct Event {
    id: String,
    status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<AudioPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<JobSummary>,
}

#[derive(Debug, Serialize)]
struct JobSummary {
    fragments: usize,
    succeeded: usize,
    missing: Vec<usize>,
}

impl Event {
    fn progress(id: &str, output: AudioPayload) -> Self {
        Self {
            id: id.to_string(),
            status: Status::InProgress,
            output: Some(output),
            error: None,
            summary: None,
        }
    }

    fn failed(id: &str, error: impl ToString) -> Self {
        Self {
            id: id.to_string(),
            status: Status::Failed,
            output: None,
            error: Some(error.to_string()),
            summary: None,
        }
    }

    fn finished(id: &str, summary: &Summary) -> Self {
        let report = JobSummary {
            fragments: summary.fragments,
            succeeded: summary.succeeded,
            missing: summary.missing(),
        };
        if summary.is_total_failure() {
            Self {
                summary: Some(report),
                ..Self::failed(id, "all fragments failed to synthesize")
            }
        } else {
            Self {
                id: id.to_string(),
                status: Status::Completed,
                output: None,
                error: None,
                summary: Some(report),
            }
        }
    }
}

/// Forwards one job's results to the event writer.
struct JobEmitter {
    id: String,
    events: mpsc::Sender<Event>,
}

#[async_trait]
impl ResultEmitter for JobEmitter {
    async fn emit(&mut self, result: SynthesisResult) -> Result<(), EmitError> {
        let payload = AudioPayload::encode(&result)?;
        self.events
            .send(Event::progress(&self.id, payload))
            .await
            .map_err(|_| EmitError::Closed)
    }
}

/// Shared state of the running worker.
#[derive(Clone)]
struct Worker {
    synth: Synthesizer,
    ctx: Arc<Context>,
}

impl Worker {
    async fn warm_up(&self) {
        let voice = context_voice(&self.ctx);
        let params = self.ctx.params_or_default();
        match self.synth.warm_up(WARM_UP_TEXT, &voice, &params).await {
            Ok(summary) if summary.is_total_failure() => {
                warn!("sovits: warm-up produced no audio, is the server running?")
            }
            Ok(summary) => info!(succeeded = summary.succeeded, "sovits: warm-up finished"),
            Err(e) => warn!(error = %e, "sovits: warm-up rejected"),
        }
    }

    async fn run_job(&self, job: Job, events: mpsc::Sender<Event>) {
        let voice = job.input.voice.unwrap_or_else(|| context_voice(&self.ctx));
        let params = job
            .input
            .params
            .unwrap_or_else(|| self.ctx.params_or_default());

        let event = match self.synth.synthesize(&job.input.text, &voice, &params) {
            Err(e) => Event::failed(&job.id, e),
            Ok(stream) => {
                let mut emitter = JobEmitter {
                    id: job.id.clone(),
                    events: events.clone(),
                };
                match stream.emit_to(&mut emitter).await {
                    Ok(summary) => Event::finished(&job.id, &summary),
                    Err(e) => Event::failed(&job.id, e),
                }
            }
        };
        let _ = events.send(event).await;
    }
}

impl WorkerCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let ctx = get_context(cli)?;
        let worker = Worker {
            synth: create_synthesizer(&ctx)?,
            ctx: Arc::new(ctx),
        };

        if !self.no_warm_up {
            worker.warm_up().await;
        }

        let (tx, rx) = mpsc::channel::<Event>(64);
        let writer = tokio::spawn(write_events(rx, tokio::io::stdout()));

        let limit = Arc::new(Semaphore::new(self.concurrency.max(1)));
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut tasks = Vec::new();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let job: Job = match serde_json::from_str(&line) {
                Ok(job) => job,
                Err(e) => {
                    warn!(error = %e, "sovits: malformed job");
                    let _ = tx.send(Event::failed("", format!("malformed job: {e}"))).await;
                    continue;
                }
            };
            info!(id = %job.id, "sovits: job received");

            let permit = limit.clone().acquire_owned().await?;
            let worker = worker.clone();
            let events = tx.clone();
            tasks.push(tokio::spawn(async move {
                worker.run_job(job, events).await;
                drop(permit);
            }));
            tasks.retain(|t| !t.is_finished());
        }

        for task in tasks {
            task.await?;
        }
        drop(tx);
        writer.await??;
        Ok(())
    }
}

async fn write_events<W>(mut rx: mpsc::Receiver<Event>, mut out: W) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(event) = rx.recv().await {
        let mut line = serde_json::to_vec(&event)?;
        line.push(b'\n');
        out.write_all(&line).await?;
        out.flush().await?;
    }
    Ok(())
}
