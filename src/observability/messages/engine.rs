// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for pipeline lifecycle and reply routing events.
//!
//! This module contains message types for logging events related to:
//! * Pipeline initialization, close and shutdown
//! * Messages dropped by the backpressure policy
//! * Failures inside the reply handlers

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// Pipeline finished `init()` and every thread is running.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use cronicl::observability::messages::engine::PipelineInitialized;
///
/// let entry_nodes = vec!["entry".to_string()];
/// let msg = PipelineInitialized {
///     node_count: 3,
///     worker_count: 5,
///     entry_nodes: &entry_nodes,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct PipelineInitialized<'a> {
    pub node_count: usize,
    pub worker_count: usize,
    pub entry_nodes: &'a [String],
}

impl Display for PipelineInitialized<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Pipeline initialized: {} nodes, {} worker threads, entry nodes [{}]",
            self.node_count,
            self.worker_count,
            self.entry_nodes.join(", ")
        )
    }
}

impl StructuredLog for PipelineInitialized<'_> {
    fn log(&self) {
        tracing::info!(
            node_count = self.node_count,
            worker_count = self.worker_count,
            entry_nodes = self.entry_nodes.join(","),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "pipeline",
            span_name = name,
            node_count = self.node_count,
            worker_count = self.worker_count,
        )
    }
}

/// Pipeline closed its operations.
pub struct PipelineClosed {
    pub node_count: usize,
}

impl Display for PipelineClosed {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Pipeline closed {} operations", self.node_count)
    }
}

impl StructuredLog for PipelineClosed {
    fn log(&self) {
        tracing::info!(node_count = self.node_count, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "pipeline_closed",
            span_name = name,
            node_count = self.node_count,
        )
    }
}

/// All pipeline threads were told to terminate and have been joined.
///
/// # Log Level
/// `info!` - Important operational event
pub struct PipelineShutdown {
    pub thread_count: usize,
    pub duration: Duration,
}

impl Display for PipelineShutdown {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Pipeline shut down: joined {} threads in {:?}",
            self.thread_count, self.duration
        )
    }
}

impl StructuredLog for PipelineShutdown {
    fn log(&self) {
        tracing::info!(
            thread_count = self.thread_count,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "pipeline_shutdown",
            span_name = name,
            thread_count = self.thread_count,
            duration = ?self.duration,
        )
    }
}

/// A message could not be enqueued and was dropped.
///
/// # Log Level
/// `warn!` - Data loss under backpressure
///
/// # Example
/// ```
/// use cronicl::errors::QueueError;
/// use cronicl::observability::messages::engine::MessageDropped;
///
/// let error = QueueError::Full { queue: "sink".to_string() };
/// let msg = MessageDropped {
///     source: "entry",
///     target: "sink",
///     reason: &error,
/// };
///
/// tracing::warn!("{}", msg);
/// ```
pub struct MessageDropped<'a> {
    pub source: &'a str,
    pub target: &'a str,
    pub reason: &'a dyn std::error::Error,
}

impl Display for MessageDropped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Dropped message from '{}' to '{}': {}",
            self.source, self.target, self.reason
        )
    }
}

impl StructuredLog for MessageDropped<'_> {
    fn log(&self) {
        tracing::warn!(
            source_node = self.source,
            target_node = self.target,
            reason = %self.reason,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "message_dropped",
            span_name = name,
            source_node = self.source,
            target_node = self.target,
        )
    }
}

/// An edge filter panicked; the message is treated as rejected.
pub struct FilterPanicked<'a> {
    pub source: &'a str,
    pub target: &'a str,
    pub panic: &'a str,
}

impl Display for FilterPanicked<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Filter on edge '{}' -> '{}' panicked, message rejected: {}",
            self.source, self.target, self.panic
        )
    }
}

impl StructuredLog for FilterPanicked<'_> {
    fn log(&self) {
        tracing::error!(
            source_node = self.source,
            target_node = self.target,
            panic = self.panic,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "filter_panicked",
            span_name = name,
            source_node = self.source,
            target_node = self.target,
        )
    }
}

/// A reply handler iteration panicked; the handler keeps running.
pub struct ReplyHandlerPanicked<'a> {
    pub handler: &'a str,
    pub panic: &'a str,
}

impl Display for ReplyHandlerPanicked<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Reply handler '{}' panicked: {}", self.handler, self.panic)
    }
}

impl StructuredLog for ReplyHandlerPanicked<'_> {
    fn log(&self) {
        tracing::error!(handler = self.handler, panic = self.panic, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("reply_handler_panicked", span_name = name, handler = self.handler)
    }
}
