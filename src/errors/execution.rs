// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::time::Duration;

/// Errors surfaced synchronously by the pipeline controller.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    /// `execute` was called before `init`
    #[error("pipeline has not been initialized; call init() before execute()")]
    DependenciesNotMet,

    /// `init` was already called, whether or not it succeeded
    #[error("init() has already been called on this pipeline")]
    AlreadyInitialized,

    #[error("operation '{operation}' failed to initialize: {source}")]
    InitFailed {
        operation: String,
        #[source]
        source: OperationError,
    },

    #[error("pipeline has no node named '{node_id}'")]
    UnknownNode { node_id: String },

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error("failed to spawn thread '{thread}': {source}")]
    SpawnFailed {
        thread: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failure reported by an operation.
///
/// Only `Transient` failures are retried, up to the node's `retry_count`.
#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    #[error("transient failure: {0}")]
    Transient(String),

    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

impl OperationError {
    pub fn transient(reason: impl Into<String>) -> Self {
        OperationError::Transient(reason.into())
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        OperationError::Failed(anyhow::anyhow!(reason.into()))
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, OperationError::Transient(_))
    }
}

/// Failure to place an item on a queue.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueueError {
    #[error("queue '{queue}' is full")]
    Full { queue: String },

    #[error("queue '{queue}' stayed full for {timeout:?}")]
    Timeout { queue: String, timeout: Duration },

    #[error("queue '{queue}' is disconnected")]
    Disconnected { queue: String },
}
