// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for worker threads and operation execution.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;
use uuid::Uuid;

/// Worker threads for a node were started.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
pub struct WorkersStarted<'a> {
    pub operation_name: &'a str,
    pub threads: usize,
    pub retry_count: u32,
    pub sample_rate: f64,
}

impl Display for WorkersStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Started {} worker(s) for '{}' (retry_count={}, sample_rate={})",
            self.threads, self.operation_name, self.retry_count, self.sample_rate
        )
    }
}

impl StructuredLog for WorkersStarted<'_> {
    fn log(&self) {
        tracing::debug!(
            operation_name = self.operation_name,
            threads = self.threads,
            retry_count = self.retry_count,
            sample_rate = self.sample_rate,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "workers",
            span_name = name,
            operation_name = self.operation_name,
            threads = self.threads,
        )
    }
}

/// A worker received TERMINATE and left its loop.
pub struct WorkerStopped<'a> {
    pub thread: &'a str,
}

impl Display for WorkerStopped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Worker '{}' stopped", self.thread)
    }
}

impl StructuredLog for WorkerStopped<'_> {
    fn log(&self) {
        tracing::debug!(thread = self.thread, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("worker_stopped", span_name = name, thread = self.thread)
    }
}

/// A transient failure is being retried.
///
/// # Log Level
/// `warn!` - Recoverable problem
///
/// # Example
/// ```
/// use cronicl::observability::messages::operation::OperationRetrying;
///
/// let error = std::io::Error::new(std::io::ErrorKind::Other, "busy");
/// let msg = OperationRetrying {
///     operation_name: "lookup",
///     attempt: 1,
///     retry_count: 3,
///     error: &error,
/// };
///
/// tracing::warn!("{}", msg);
/// ```
pub struct OperationRetrying<'a> {
    pub operation_name: &'a str,
    pub attempt: u32,
    pub retry_count: u32,
    pub error: &'a dyn std::error::Error,
}

impl Display for OperationRetrying<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Operation '{}' failed on attempt {} (retries allowed: {}), retrying: {}",
            self.operation_name, self.attempt, self.retry_count, self.error
        )
    }
}

impl StructuredLog for OperationRetrying<'_> {
    fn log(&self) {
        tracing::warn!(
            operation_name = self.operation_name,
            attempt = self.attempt,
            retry_count = self.retry_count,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "operation_retrying",
            span_name = name,
            operation_name = self.operation_name,
            attempt = self.attempt,
        )
    }
}

/// An operation failed for good; the message is dropped.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct OperationFailed<'a> {
    pub operation_name: &'a str,
    pub attempts: u32,
    pub error: &'a dyn std::error::Error,
}

impl Display for OperationFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Operation '{}' failed after {} attempt(s): {}",
            self.operation_name, self.attempts, self.error
        )
    }
}

impl StructuredLog for OperationFailed<'_> {
    fn log(&self) {
        tracing::error!(
            operation_name = self.operation_name,
            attempts = self.attempts,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "operation_failed",
            span_name = name,
            operation_name = self.operation_name,
            error = %self.error,
        )
    }
}

/// An operation panicked; the worker survives and the message is dropped.
pub struct OperationPanicked<'a> {
    pub operation_name: &'a str,
    pub panic: &'a str,
}

impl Display for OperationPanicked<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Operation '{}' panicked, worker continues: {}",
            self.operation_name, self.panic
        )
    }
}

impl StructuredLog for OperationPanicked<'_> {
    fn log(&self) {
        tracing::error!(
            operation_name = self.operation_name,
            panic = self.panic,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "operation_panicked",
            span_name = name,
            operation_name = self.operation_name,
        )
    }
}

/// A sampled message passed through a node.
///
/// # Log Level
/// `info!` - Sampled message tracing
pub struct MessageTraced<'a> {
    pub message_id: Uuid,
    pub operation_name: &'a str,
    pub hop: usize,
    pub attempts: u32,
}

impl Display for MessageTraced<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Message {} visited '{}' (hop {}, {} attempt(s))",
            self.message_id, self.operation_name, self.hop, self.attempts
        )
    }
}

impl StructuredLog for MessageTraced<'_> {
    fn log(&self) {
        tracing::info!(
            message_id = %self.message_id,
            operation_name = self.operation_name,
            hop = self.hop,
            attempts = self.attempts,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "message",
            span_name = name,
            message_id = %self.message_id,
            operation_name = self.operation_name,
        )
    }
}
