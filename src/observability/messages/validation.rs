// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for pipeline graph validation.

use crate::errors::ValidationError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Graph validation started.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
///
/// # Example
/// ```
/// use cronicl::observability::messages::validation::ValidationStarted;
///
/// let msg = ValidationStarted {
///     node_count: 5,
///     edge_count: 4,
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct ValidationStarted {
    pub node_count: usize,
    pub edge_count: usize,
}

impl Display for ValidationStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Validating pipeline graph with {} nodes and {} edges",
            self.node_count, self.edge_count
        )
    }
}

impl StructuredLog for ValidationStarted {
    fn log(&self) {
        tracing::debug!(
            node_count = self.node_count,
            edge_count = self.edge_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::DEBUG,
            "span_name",
            name = name,
            node_count = self.node_count,
            edge_count = self.edge_count,
        )
    }
}

/// Graph validation passed.
pub struct ValidationCompleted {
    pub node_count: usize,
    pub entry_count: usize,
}

impl Display for ValidationCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Pipeline graph is valid: {} nodes, {} entry nodes",
            self.node_count, self.entry_count
        )
    }
}

impl StructuredLog for ValidationCompleted {
    fn log(&self) {
        tracing::info!(
            node_count = self.node_count,
            entry_count = self.entry_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::INFO,
            "span_name",
            name = name,
            node_count = self.node_count,
            entry_count = self.entry_count,
        )
    }
}

/// A single validation problem.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct ValidationProblem<'a> {
    pub error: &'a ValidationError,
}

impl Display for ValidationProblem<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Validation error: {}", self.error)
    }
}

impl StructuredLog for ValidationProblem<'_> {
    fn log(&self) {
        tracing::error!(error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::ERROR,
            "span_name",
            name = name,
            error = %self.error,
        )
    }
}

/// Graph validation failed.
///
/// # Example
/// ```
/// use cronicl::observability::messages::validation::ValidationFailed;
///
/// let msg = ValidationFailed { error_count: 3 };
/// assert_eq!(msg.to_string(), "Pipeline graph validation failed with 3 errors");
/// ```
pub struct ValidationFailed {
    pub error_count: usize,
}

impl Display for ValidationFailed {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Pipeline graph validation failed with {} errors",
            self.error_count
        )
    }
}

impl StructuredLog for ValidationFailed {
    fn log(&self) {
        tracing::error!(error_count = self.error_count, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::ERROR,
            "span_name",
            name = name,
            error_count = self.error_count,
        )
    }
}
