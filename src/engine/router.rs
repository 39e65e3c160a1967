// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Reply routing.
//!
//! Workers publish `(respondent, message)` pairs to the shared reply queue. A pool of
//! [`REPLY_HANDLER_THREADS`] handlers drains that queue and forwards each message to
//! the downstream nodes whose edge filter accepts it. Routes are resolved once into a
//! [`RoutingTable`] before any handler starts and are read-only afterwards.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::config::consts::REPLY_HANDLER_THREADS;
use crate::config::{Filter, PipelineGraph};
use crate::engine::fabric::{panic_message, stop_consumers, Fabric};
use crate::engine::{Queue, QueueRegistry};
use crate::errors::ExecutionError;
use crate::message::{Envelope, Message, Reply, Signal};
use crate::observability::messages::engine::{FilterPanicked, ReplyHandlerPanicked};
use crate::observability::messages::StructuredLog;

/// A downstream hop: the target node, its input queue and the edge filter.
#[derive(Clone)]
pub struct Route {
    pub target: String,
    pub filter: Filter,
    queue: Queue<Envelope>,
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route").field("target", &self.target).finish()
    }
}

/// Routes per respondent, in edge declaration order.
#[derive(Debug, Default)]
pub struct RoutingTable {
    routes: HashMap<String, Vec<Route>>,
}

impl RoutingTable {
    pub fn build(graph: &PipelineGraph, registry: &QueueRegistry) -> Self {
        let mut routes: HashMap<String, Vec<Route>> = HashMap::new();
        for edge in graph.edges() {
            routes.entry(edge.source.clone()).or_default().push(Route {
                target: edge.target.clone(),
                filter: edge.filter_or_default(),
                queue: registry.get_queue(&edge.target),
            });
        }
        Self { routes }
    }

    /// Routes leaving `respondent`; empty for terminal nodes.
    pub fn routes(&self, respondent: &str) -> &[Route] {
        self.routes
            .get(respondent)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Names of the nodes `respondent` routes to.
    pub fn targets(&self, respondent: &str) -> Vec<&str> {
        self.routes(respondent)
            .iter()
            .map(|route| route.target.as_str())
            .collect()
    }
}

pub struct ReplyRouter;

impl ReplyRouter {
    /// Start the reply handler threads.
    pub(crate) fn start(
        table: Arc<RoutingTable>,
        fabric: &Fabric,
    ) -> Result<Vec<JoinHandle<()>>, ExecutionError> {
        let handler = Handler {
            table,
            reply: fabric.registry.reply_queue(),
            fabric: fabric.clone(),
        };

        let mut handles = Vec::with_capacity(REPLY_HANDLER_THREADS);
        for index in 0..REPLY_HANDLER_THREADS {
            let thread_name = format!("reply-handler-{}", index);
            let spawned = {
                let handler = handler.clone();
                let name = thread_name.clone();
                thread::Builder::new()
                    .name(thread_name.clone())
                    .spawn(move || handler.run(&name))
            };
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(source) => {
                    stop_consumers(&handler.reply, handles, || Reply::Signal(Signal::Terminate));
                    return Err(ExecutionError::SpawnFailed {
                        thread: thread_name,
                        source,
                    });
                }
            }
        }
        Ok(handles)
    }
}

#[derive(Clone)]
struct Handler {
    table: Arc<RoutingTable>,
    reply: Queue<Reply>,
    fabric: Fabric,
}

impl Handler {
    fn run(&self, thread_name: &str) {
        while let Ok(reply) = self.reply.take() {
            match reply {
                Reply::Signal(Signal::Terminate) => {
                    self.reply.settle();
                    tracing::debug!(thread = thread_name, "Reply handler stopped");
                    break;
                }
                Reply::Signal(signal) => {
                    tracing::debug!(thread = thread_name, %signal, "Ignoring signal on reply queue");
                }
                Reply::Data {
                    respondent,
                    message,
                } => {
                    let routed = panic::catch_unwind(AssertUnwindSafe(|| {
                        self.route(&respondent, message)
                    }));
                    if let Err(payload) = routed {
                        self.fabric.stats.record_panicked();
                        ReplyHandlerPanicked {
                            handler: thread_name,
                            panic: &panic_message(payload.as_ref()),
                        }
                        .log();
                    }
                }
            }
            self.reply.settle();
        }
    }

    fn route(&self, respondent: &str, message: Message) {
        let accepted: Vec<&Route> = self
            .table
            .routes(respondent)
            .iter()
            .filter(|route| self.accepts(respondent, route, &message))
            .collect();

        let Some((last, rest)) = accepted.split_last() else {
            return;
        };
        for route in rest {
            self.forward(respondent, route, message.clone());
        }
        self.forward(respondent, last, message);
    }

    fn accepts(&self, respondent: &str, route: &Route, message: &Message) -> bool {
        match panic::catch_unwind(AssertUnwindSafe(|| (route.filter)(message))) {
            Ok(true) => true,
            Ok(false) => {
                self.fabric.stats.record_filtered();
                false
            }
            Err(payload) => {
                self.fabric.stats.record_panicked();
                FilterPanicked {
                    source: respondent,
                    target: &route.target,
                    panic: &panic_message(payload.as_ref()),
                }
                .log();
                false
            }
        }
    }

    fn forward(&self, respondent: &str, route: &Route, message: Message) {
        if self
            .fabric
            .deliver(&route.queue, Envelope::Data(message), respondent)
        {
            self.fabric.stats.record_routed();
        }
    }
}
