// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The directed graph a pipeline is built from.
//!
//! Nodes and edges are kept in insertion order so that entry points and routing
//! tables come out in the order the caller declared them.

use std::fmt;
use std::sync::Arc;

use crate::config::consts::{DEFAULT_RETRY_COUNT, DEFAULT_SAMPLE_RATE, DEFAULT_THREADS};
use crate::config::EntryPoints;
use crate::message::Message;
use crate::traits::Operation;

/// Per-edge predicate deciding whether a message may cross the edge.
pub type Filter = Arc<dyn Fn(&Message) -> bool + Send + Sync>;

/// A filter that accepts every message.
pub fn always() -> Filter {
    Arc::new(|_: &Message| true)
}

/// A node of the pipeline graph.
///
/// `sample_rate`, `retry_count` and `threads` hold the values the caller declared;
/// they are clamped when the pipeline is initialized. `operation_name` is assigned
/// at the same time and always equals `id`.
#[derive(Clone)]
pub struct OperationNode {
    pub id: String,
    pub operation: Option<Arc<dyn Operation>>,
    pub sample_rate: f64,
    pub retry_count: i64,
    pub threads: i64,
    pub operation_name: Option<String>,
}

impl OperationNode {
    pub fn new(id: impl Into<String>, operation: Arc<dyn Operation>) -> Self {
        Self {
            operation: Some(operation),
            ..Self::without_operation(id)
        }
    }

    /// A node with nothing to run. Only useful to exercise validation.
    pub fn without_operation(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            operation: None,
            sample_rate: DEFAULT_SAMPLE_RATE,
            retry_count: DEFAULT_RETRY_COUNT,
            threads: DEFAULT_THREADS,
            operation_name: None,
        }
    }

    pub fn with_sample_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_retry_count(mut self, retry_count: i64) -> Self {
        self.retry_count = retry_count;
        self
    }

    pub fn with_threads(mut self, threads: i64) -> Self {
        self.threads = threads;
        self
    }
}

impl fmt::Debug for OperationNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationNode")
            .field("id", &self.id)
            .field("has_operation", &self.operation.is_some())
            .field("sample_rate", &self.sample_rate)
            .field("retry_count", &self.retry_count)
            .field("threads", &self.threads)
            .field("operation_name", &self.operation_name)
            .finish()
    }
}

/// A directed edge, optionally guarded by a [`Filter`].
#[derive(Clone)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub filter: Option<Filter>,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            filter: None,
        }
    }

    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Message) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// The edge's filter, or an always-true one when none was given.
    pub fn filter_or_default(&self) -> Filter {
        self.filter.clone().unwrap_or_else(always)
    }
}

impl fmt::Debug for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Edge")
            .field("source", &self.source)
            .field("target", &self.target)
            .field("filtered", &self.filter.is_some())
            .finish()
    }
}

/// Directed graph of operation nodes.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use cronicl::backends::local::PassThroughOperation;
/// use cronicl::config::{OperationNode, PipelineGraph};
///
/// let mut graph = PipelineGraph::new();
/// graph
///     .add_node(OperationNode::new("entry", Arc::new(PassThroughOperation)))
///     .add_node(OperationNode::new("sink", Arc::new(PassThroughOperation)))
///     .add_edge("entry", "sink");
///
/// assert_eq!(graph.entry_nodes().0, vec!["entry".to_string()]);
/// ```
#[derive(Clone, Default, Debug)]
pub struct PipelineGraph {
    nodes: Vec<OperationNode>,
    edges: Vec<Edge>,
}

impl PipelineGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: OperationNode) -> &mut Self {
        self.nodes.push(node);
        self
    }

    /// Add an unfiltered edge. Unknown endpoints are reported by validation.
    pub fn add_edge(&mut self, source: impl Into<String>, target: impl Into<String>) -> &mut Self {
        self.edges.push(Edge::new(source, target));
        self
    }

    pub fn add_filtered_edge<F>(
        &mut self,
        source: impl Into<String>,
        target: impl Into<String>,
        filter: F,
    ) -> &mut Self
    where
        F: Fn(&Message) -> bool + Send + Sync + 'static,
    {
        self.edges.push(Edge::new(source, target).with_filter(filter));
        self
    }

    pub fn push_edge(&mut self, edge: Edge) -> &mut Self {
        self.edges.push(edge);
        self
    }

    pub fn nodes(&self) -> &[OperationNode] {
        &self.nodes
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut [OperationNode] {
        &mut self.nodes
    }

    pub fn node(&self, id: &str) -> Option<&OperationNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Edges leaving `id`, in declaration order.
    pub fn out_edges<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |edge| edge.source == id)
    }

    pub fn in_degree(&self, id: &str) -> usize {
        self.edges.iter().filter(|edge| edge.target == id).count()
    }

    /// Nodes with no incoming edge, in declaration order.
    pub fn entry_nodes(&self) -> EntryPoints {
        let mut entry_points = EntryPoints::new();
        for node in &self.nodes {
            if self.in_degree(&node.id) == 0 {
                entry_points.add(node.id.clone());
            }
        }
        entry_points
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
