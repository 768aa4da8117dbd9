//! Background key-pair generation.
//!
//! Generating a key pair means a round trip to the node, which can take a
//! while. This module runs that request as a tokio task and hands back a
//! handle that can be polled without blocking, awaited, or aborted.

use crate::services::node::{NodeError, NodeInterface};
use crate::types::GeneratedKeyPair;
use std::sync::Arc;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tokio::task::JoinHandle;

pub type KeyGenerationResult = Result<GeneratedKeyPair, NodeError>;

/// Progress of a background key generation
#[derive(Debug)]
pub enum GenerationPoll {
    /// The node has not answered yet
    Pending,
    /// The request finished
    Ready(KeyGenerationResult),
    /// The task went away without an answer (aborted or panicked)
    Lost,
}

/// Handle to a background key generation
///
/// Dropping the handle aborts the request.
#[derive(Debug)]
pub struct KeyGenerationHandle {
    receiver: oneshot::Receiver<KeyGenerationResult>,
    task: JoinHandle<()>,
}

impl KeyGenerationHandle {
    /// Check for the result without blocking.
    pub fn try_get_result(&mut self) -> GenerationPoll {
        match self.receiver.try_recv() {
            Ok(result) => {
                tracing::debug!("Key generation completed");
                GenerationPoll::Ready(result)
            }
            Err(TryRecvError::Empty) => GenerationPoll::Pending,
            Err(TryRecvError::Closed) => {
                tracing::debug!("Key generation task disconnected");
                GenerationPoll::Lost
            }
        }
    }

    /// Wait for the result. `None` if the task went away without answering.
    ///
    /// Cancel safe: dropping the returned future leaves the request running
    /// and the handle usable.
    pub async fn wait(&mut self) -> Option<KeyGenerationResult> {
        (&mut self.receiver).await.ok()
    }

    /// Stop the request. Any late answer is discarded.
    pub fn abort(self) {
        tracing::debug!("Aborting key generation");
        // Drop does the work
    }
}

impl Drop for KeyGenerationHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Start generating a key pair in the background
///
/// Must be called from within a tokio runtime.
pub fn start_key_generation(node: Arc<dyn NodeInterface>) -> KeyGenerationHandle {
    tracing::debug!("Starting background key generation");
    let (tx, rx) = oneshot::channel();

    let task = tokio::spawn(async move {
        let result = node.generate_key_pair().await;
        if tx.send(result).is_err() {
            tracing::debug!("Key generation finished after its handle was dropped");
        }
    });

    KeyGenerationHandle { receiver: rx, task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;

    struct InstantNode;

    #[async_trait]
    impl NodeInterface for InstantNode {
        async fn generate_key_pair(&self) -> KeyGenerationResult {
            Ok(GeneratedKeyPair {
                insert_uri: "SSK@private/".to_string(),
                request_uri: "SSK@public/".to_string(),
            })
        }
    }

    struct SlowNode;

    #[async_trait]
    impl NodeInterface for SlowNode {
        async fn generate_key_pair(&self) -> KeyGenerationResult {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(NodeError::ConnectionClosed)
        }
    }

    #[tokio::test]
    async fn test_wait_returns_node_result() {
        let mut handle = start_key_generation(Arc::new(InstantNode));
        let result = handle.wait().await.unwrap().unwrap();
        assert_eq!(result.request_uri, "SSK@public/");
        assert_eq!(result.insert_uri, "SSK@private/");
    }

    #[tokio::test(start_paused = true)]
    async fn test_try_get_result_pending_then_ready() {
        let mut handle = start_key_generation(Arc::new(InstantNode));
        // Let the spawned task run to completion
        tokio::time::sleep(Duration::from_millis(10)).await;
        match handle.try_get_result() {
            GenerationPoll::Ready(Ok(pair)) => assert_eq!(pair.request_uri, "SSK@public/"),
            other => panic!("expected ready result, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_node_stays_pending() {
        let mut handle = start_key_generation(Arc::new(SlowNode));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(matches!(handle.try_get_result(), GenerationPoll::Pending));
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupted_wait_keeps_request_alive() {
        let mut handle = start_key_generation(Arc::new(InstantNode));
        let interrupted = tokio::time::timeout(Duration::ZERO, handle.wait()).await;
        assert!(interrupted.is_err());

        let result = handle.wait().await.unwrap().unwrap();
        assert_eq!(result.insert_uri, "SSK@private/");
    }

    struct PanickingNode;

    #[async_trait]
    impl NodeInterface for PanickingNode {
        async fn generate_key_pair(&self) -> KeyGenerationResult {
            panic!("node client crashed");
        }
    }

    #[tokio::test]
    async fn test_crashed_task_reports_lost() {
        let mut handle = start_key_generation(Arc::new(PanickingNode));
        for _ in 0..100 {
            match handle.try_get_result() {
                GenerationPoll::Pending => tokio::task::yield_now().await,
                GenerationPoll::Lost => return,
                GenerationPoll::Ready(result) => panic!("unexpected result {:?}", result),
            }
        }
        panic!("task never went away");
    }
}
