// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::path::PathBuf;

/// Errors that can occur during pipeline graph validation
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The graph contains a cycle once edge direction is ignored
    CyclicGraph {
        /// The cycle path, first node repeated at the end
        cycle: Vec<String>,
    },
    /// A node has more than one incoming edge
    FanIn {
        node_id: String,
        /// Every node with an edge into `node_id`
        sources: Vec<String>,
    },
    /// A node was declared without an operation to run
    MissingOperation { node_id: String },
    /// A declared operation name has no known implementation
    UnknownOperation { node_id: String, operation: String },
    /// An edge names a node that does not exist
    UnresolvedEdge {
        source: String,
        target: String,
        missing: String,
    },
    /// Two nodes share the same id
    DuplicateNode { node_id: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::CyclicGraph { cycle } => {
                write!(f, "Cycle detected (edge direction ignored): {}", cycle.join(" - "))
            }
            ValidationError::FanIn { node_id, sources } => {
                write!(
                    f,
                    "Node '{}' has {} incoming edges (from {}); joins are not supported",
                    node_id,
                    sources.len(),
                    sources.join(", ")
                )
            }
            ValidationError::MissingOperation { node_id } => {
                write!(f, "Node '{}' has no operation", node_id)
            }
            ValidationError::UnknownOperation { node_id, operation } => {
                write!(
                    f,
                    "Node '{}' uses operation '{}' which has no implementation",
                    node_id, operation
                )
            }
            ValidationError::UnresolvedEdge {
                source,
                target,
                missing,
            } => {
                write!(
                    f,
                    "Edge '{}' -> '{}' references '{}' which does not exist",
                    source, target, missing
                )
            }
            ValidationError::DuplicateNode { node_id } => {
                write!(f, "Duplicate node id: '{}'", node_id)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Every problem validation found, in the order it found them.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pipeline validation failed:")?;
        for error in &self.0 {
            write!(f, "\n{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl From<Vec<ValidationError>> for ValidationErrors {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self(errors)
    }
}

/// Errors raised while loading a pipeline definition file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read pipeline file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse pipeline definition: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid option '{option}' for node '{node_id}': {reason}")]
    InvalidOption {
        node_id: String,
        option: String,
        reason: String,
    },

    #[error(transparent)]
    Validation(#[from] ValidationErrors),
}
