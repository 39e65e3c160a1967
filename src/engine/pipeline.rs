// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The pipeline controller.
//!
//! A [`Pipeline`] owns a validated graph, the queues connecting its nodes and every
//! thread it starts. Its lifecycle is explicit:
//!
//! ```text
//! new() ──► Unconfigured ──init()──► Initialized ──close()──► Closed
//!                 │                       │                      │
//!                 └───────────────────────┴──shutdown()──────────┴──► Terminated
//! ```
//!
//! A failed `init()` also ends in `Terminated`. Otherwise threads are only stopped by
//! [`Pipeline::shutdown`]; dropping a pipeline leaves them blocked on their queues.
//!
//! # Example
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use cronicl::backends::local::{CounterOperation, MultiplyOperation};
//! use cronicl::config::{OperationNode, PipelineGraph, PipelineOptions};
//! use cronicl::engine::Pipeline;
//! use cronicl::traits::InitConfig;
//! use serde_json::json;
//!
//! let mut graph = PipelineGraph::new();
//! graph
//!     .add_node(OperationNode::new("double", Arc::new(MultiplyOperation::new(2.0))))
//!     .add_node(OperationNode::new("count", Arc::new(CounterOperation::new())))
//!     .add_edge("double", "count");
//!
//! let mut pipeline = Pipeline::new(graph, PipelineOptions::default()).unwrap();
//! pipeline.init(&InitConfig::new()).unwrap();
//! pipeline.execute(json!([1, 2, 3])).unwrap();
//! assert!(pipeline.wait_until_idle(Duration::from_secs(5)));
//!
//! let readings = pipeline.read_sensors();
//! assert_eq!(readings[0].operation_name, "count");
//! assert_eq!(readings[0].value, json!(3));
//! pipeline.shutdown();
//! ```

use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;

use crate::config::{clamp_sample_rate, validate_graph, EntryPoints, PipelineGraph, PipelineOptions};
use crate::engine::fabric::{stop_consumers, Fabric};
use crate::engine::{
    OperationRunner, PipelineStats, Queue, QueueRegistry, ReplyRouter, RoutingTable, StatsSnapshot,
};
use crate::errors::{ExecutionError, ValidationErrors};
use crate::message::{create_new_message, Envelope, Reply, Signal};
use crate::observability::messages::engine::{
    MessageDropped, PipelineClosed, PipelineInitialized, PipelineShutdown,
};
use crate::observability::messages::validation::{
    ValidationCompleted, ValidationFailed, ValidationProblem, ValidationStarted,
};
use crate::observability::messages::StructuredLog;
use crate::traits::InitConfig;

const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Unconfigured,
    Initialized,
    Closed,
    Terminated,
}

impl Display for PipelineState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelineState::Unconfigured => "unconfigured",
            PipelineState::Initialized => "initialized",
            PipelineState::Closed => "closed",
            PipelineState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// A value reported by an operation's sensor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorReading {
    pub operation_name: String,
    pub value: Value,
}

pub struct Pipeline {
    graph: PipelineGraph,
    options: PipelineOptions,
    entry_nodes: EntryPoints,
    registry: Arc<QueueRegistry>,
    stats: Arc<PipelineStats>,
    state: PipelineState,
    /// Worker threads grouped by the node whose queue they read.
    workers: Vec<(String, Vec<JoinHandle<()>>)>,
    handlers: Vec<JoinHandle<()>>,
}

impl Pipeline {
    /// Validate `graph` and prepare one queue per node. No thread is started.
    pub fn new(graph: PipelineGraph, options: PipelineOptions) -> Result<Self, ValidationErrors> {
        ValidationStarted {
            node_count: graph.len(),
            edge_count: graph.edges().len(),
        }
        .log();

        if let Err(errors) = validate_graph(&graph) {
            for error in &errors {
                ValidationProblem { error }.log();
            }
            ValidationFailed {
                error_count: errors.len(),
            }
            .log();
            return Err(errors.into());
        }

        let entry_nodes = graph.entry_nodes();
        ValidationCompleted {
            node_count: graph.len(),
            entry_count: entry_nodes.len(),
        }
        .log();

        let registry = Arc::new(QueueRegistry::new(options.queue_capacity));
        for node in graph.nodes() {
            registry.get_queue(&node.id);
        }

        Ok(Self {
            graph,
            options,
            entry_nodes,
            registry,
            stats: Arc::new(PipelineStats::default()),
            state: PipelineState::Unconfigured,
            workers: Vec::new(),
            handlers: Vec::new(),
        })
    }

    /// Start every node's workers and the reply handlers.
    ///
    /// `config` is handed to each operation's `init` exactly once. If any node
    /// fails to start, the threads already started are stopped, the operations
    /// already initialized are closed and the pipeline is terminated; it cannot be
    /// initialized again.
    pub fn init(&mut self, config: &InitConfig) -> Result<(), ExecutionError> {
        if self.state != PipelineState::Unconfigured {
            return Err(ExecutionError::AlreadyInitialized);
        }

        let fabric = Fabric {
            registry: Arc::clone(&self.registry),
            stats: Arc::clone(&self.stats),
            backpressure: self.options.backpressure,
        };

        if let Err(error) = self.start_threads(config, &fabric) {
            self.roll_back();
            return Err(error);
        }

        self.state = PipelineState::Initialized;
        PipelineInitialized {
            node_count: self.graph.len(),
            worker_count: self.worker_count(),
            entry_nodes: &self.entry_nodes.0,
        }
        .log();
        Ok(())
    }

    fn start_threads(&mut self, config: &InitConfig, fabric: &Fabric) -> Result<(), ExecutionError> {
        for node in self.graph.nodes_mut() {
            let handles = OperationRunner::configure_and_start(node, config, fabric)?;
            self.workers.push((node.id.clone(), handles));
        }

        let table = Arc::new(RoutingTable::build(&self.graph, &self.registry));
        self.handlers = ReplyRouter::start(table, fabric)?;
        Ok(())
    }

    /// Undo a failed `init`. Nodes are started in order, so the first
    /// `workers.len()` nodes are exactly the ones whose operation was initialized.
    fn roll_back(&mut self) {
        let initialized = self.workers.len();
        self.stop_threads();
        for node in &self.graph.nodes()[..initialized] {
            if let Some(operation) = &node.operation {
                operation.close();
            }
        }
        self.state = PipelineState::Terminated;
    }

    fn worker_count(&self) -> usize {
        self.workers.iter().map(|(_, handles)| handles.len()).sum()
    }

    /// Probability used for messages created by `execute`: the pipeline rate,
    /// raised by any entry node that asks for more.
    fn entry_sample_rate(&self) -> f64 {
        self.entry_nodes
            .iter()
            .filter_map(|node_id| self.graph.node(node_id))
            .map(|node| node.sample_rate)
            .fold(clamp_sample_rate(self.options.sample_rate), f64::max)
    }

    /// Submit `value` to every entry node.
    ///
    /// An array is treated as a sequence of inputs; anything else is one input.
    /// Each input becomes one message with its own sampling decision. Returns the
    /// number of messages created. A full entry queue drops the message for that
    /// entry node and counts it.
    pub fn execute(&self, value: impl Into<Value>) -> Result<usize, ExecutionError> {
        if self.state != PipelineState::Initialized {
            tracing::warn!(state = %self.state, "execute() called on a pipeline that is not initialized");
            return Err(ExecutionError::DependenciesNotMet);
        }

        let items = match value.into() {
            Value::Array(items) => items,
            other => vec![other],
        };
        let count = items.len();

        let sample_rate = self.entry_sample_rate();
        let entry_queues: Vec<_> = self
            .entry_nodes
            .iter()
            .map(|node_id| self.registry.get_queue(node_id))
            .collect();

        for item in items {
            let message = create_new_message(item, sample_rate);
            self.stats.record_submitted();

            let Some((last, rest)) = entry_queues.split_last() else {
                continue;
            };
            for queue in rest {
                self.submit(queue, Envelope::Data(message.clone()));
            }
            self.submit(last, Envelope::Data(message));
        }

        Ok(count)
    }

    fn submit(&self, queue: &Queue<Envelope>, envelope: Envelope) {
        if let Err(error) = queue.put(envelope) {
            self.stats.record_dropped();
            MessageDropped {
                source: "execute",
                target: queue.name(),
                reason: &error,
            }
            .log();
        }
    }

    /// Place a signal on one node's input queue.
    pub fn signal(&self, node_id: &str, signal: Signal) -> Result<(), ExecutionError> {
        if self.state != PipelineState::Initialized {
            return Err(ExecutionError::DependenciesNotMet);
        }
        if !self.graph.contains(node_id) {
            return Err(ExecutionError::UnknownNode {
                node_id: node_id.to_string(),
            });
        }
        self.registry
            .get_queue(node_id)
            .put(Envelope::Signal(signal))?;
        Ok(())
    }

    /// Call every operation's `close` once. Queues are not drained and threads keep
    /// running until [`shutdown`](Self::shutdown).
    pub fn close(&mut self) {
        if self.state != PipelineState::Initialized {
            return;
        }
        for node in self.graph.nodes() {
            if let Some(operation) = &node.operation {
                operation.close();
            }
        }
        self.state = PipelineState::Closed;
        PipelineClosed {
            node_count: self.graph.len(),
        }
        .log();
    }

    /// True while any queue holds items or any taken item is still being handled.
    pub fn running(&self) -> bool {
        !self.registry.all_empty() || self.registry.in_flight() > 0
    }

    /// Poll [`running`](Self::running) until it turns false or `timeout` passes.
    pub fn wait_until_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.running() {
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(IDLE_POLL_INTERVAL);
        }
        true
    }

    /// Readings from every operation that exposes a sensor, in node order.
    pub fn read_sensors(&self) -> Vec<SensorReading> {
        self.graph
            .nodes()
            .iter()
            .filter_map(|node| {
                let value = node.operation.as_ref()?.read_sensor()?;
                Some(SensorReading {
                    operation_name: node.operation_name.clone().unwrap_or_else(|| node.id.clone()),
                    value,
                })
            })
            .collect()
    }

    /// Stop and join every thread. Items still queued are abandoned.
    pub fn shutdown(&mut self) {
        let started = Instant::now();
        let thread_count = self.worker_count() + self.handlers.len();
        self.stop_threads();
        self.state = PipelineState::Terminated;
        PipelineShutdown {
            thread_count,
            duration: started.elapsed(),
        }
        .log();
    }

    fn stop_threads(&mut self) {
        // workers first so their last replies still reach a handler
        for (node_id, handles) in self.workers.drain(..) {
            let queue = self.registry.get_queue(&node_id);
            stop_consumers(&queue, handles, || Envelope::Signal(Signal::Terminate));
        }

        let reply = self.registry.reply_queue();
        stop_consumers(&reply, std::mem::take(&mut self.handlers), || {
            Reply::Signal(Signal::Terminate)
        });
    }

    pub fn entry_nodes(&self) -> &EntryPoints {
        &self.entry_nodes
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn queues(&self) -> &QueueRegistry {
        &self.registry
    }

    pub fn graph(&self) -> &PipelineGraph {
        &self.graph
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("state", &self.state)
            .field("entry_nodes", &self.entry_nodes)
            .field("threads", &(self.worker_count() + self.handlers.len()))
            .field("queues", &self.registry)
            .finish()
    }
}
