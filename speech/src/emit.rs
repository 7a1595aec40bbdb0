//! Result emission boundary.

use crate::SynthesisResult;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Error type for emitters.
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    #[error("emitter closed")]
    Closed,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("encode error: {0}")]
    Encode(String),
    #[error("other error: {0}")]
    Other(String),
}

/// Consumes synthesis results, typically encoding and forwarding them.
#[async_trait]
pub trait ResultEmitter: Send {
    async fn emit(&mut self, result: SynthesisResult) -> Result<(), EmitError>;
}

#[async_trait]
impl ResultEmitter for Vec<SynthesisResult> {
    async fn emit(&mut self, result: SynthesisResult) -> Result<(), EmitError> {
        self.push(result);
        Ok(())
    }
}

#[async_trait]
impl ResultEmitter for mpsc::Sender<SynthesisResult> {
    async fn emit(&mut self, result: SynthesisResult) -> Result<(), EmitError> {
        self.send(result).await.map_err(|_| EmitError::Closed)
    }
}

#[cfg(test)]
mod emit_tests {
    use super::*;

    fn result(index: usize) -> SynthesisResult {
        SynthesisResult {
            index,
            source_text: format!("fragment {index}"),
            sample_rate: 24000,
            samples: vec![1, 2, 3],
        }
    }

    #[tokio::test]
    async fn test_vec_emitter() {
        let mut out: Vec<SynthesisResult> = Vec::new();
        out.emit(result(0)).await.unwrap();
        out.emit(result(1)).await.unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].index, 1);
    }

    #[tokio::test]
    async fn test_channel_emitter_closed() {
        let (mut tx, rx) = mpsc::channel(1);
        drop(rx);
        let err = tx.emit(result(0)).await.unwrap_err();
        assert!(matches!(err, EmitError::Closed));
    }
}
