// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-node configuration and worker threads.
//!
//! [`OperationRunner::configure_and_start`] clamps a node's settings, runs the
//! operation's `init` exactly once and then starts `threads` OS threads that all
//! read the node's input queue. Each worker loops until it takes a TERMINATE
//! signal:
//!
//! * data is handed to `Operation::execute`, retrying transient failures up to the
//!   node's `retry_count`, and forwarded to the reply queue unless consumed
//! * EMIT and RESET go to `Operation::signal`; a returned message is forwarded
//! * errors and panics are logged and counted, the message is dropped and the
//!   worker carries on with the next item

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::config::{NodeSettings, OperationNode};
use crate::engine::fabric::{panic_message, stop_consumers, Fabric};
use crate::engine::Queue;
use crate::errors::{ExecutionError, OperationError};
use crate::message::{Envelope, Message, Reply, Signal};
use crate::observability::messages::operation::{
    MessageTraced, OperationFailed, OperationPanicked, OperationRetrying, WorkerStopped,
    WorkersStarted,
};
use crate::observability::messages::StructuredLog;
use crate::traits::{InitConfig, Operation, OperationContext, Outcome};

pub struct OperationRunner;

impl OperationRunner {
    /// Clamp `node`, initialize its operation and start its workers.
    ///
    /// The clamped settings are written back to `node` and `operation_name` is set
    /// to the node id. Returns one handle per started thread.
    pub(crate) fn configure_and_start(
        node: &mut OperationNode,
        shared_config: &InitConfig,
        fabric: &Fabric,
    ) -> Result<Vec<JoinHandle<()>>, ExecutionError> {
        let settings = NodeSettings::for_node(node);
        node.sample_rate = settings.sample_rate;
        node.retry_count = i64::from(settings.retry_count);
        node.threads = settings.threads as i64;
        node.operation_name = Some(node.id.clone());

        let operation = node
            .operation
            .clone()
            .ok_or_else(|| ExecutionError::InitFailed {
                operation: node.id.clone(),
                source: OperationError::failed("node has no operation"),
            })?;

        operation
            .init(shared_config)
            .map_err(|source| ExecutionError::InitFailed {
                operation: node.id.clone(),
                source,
            })?;

        let worker = Worker {
            operation,
            context: OperationContext {
                operation_name: node.id.clone(),
                settings,
            },
            input: fabric.registry.get_queue(&node.id),
            reply: fabric.registry.reply_queue(),
            fabric: fabric.clone(),
        };

        let mut handles = Vec::with_capacity(settings.threads);
        for index in 0..settings.threads {
            let thread_name = format!("{}-worker-{}", node.id, index);
            let spawned = {
                let worker = worker.clone();
                let name = thread_name.clone();
                thread::Builder::new()
                    .name(thread_name.clone())
                    .spawn(move || worker.run(&name))
            };
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(source) => {
                    stop_workers(&worker.input, handles);
                    worker.operation.close();
                    return Err(ExecutionError::SpawnFailed {
                        thread: thread_name,
                        source,
                    });
                }
            }
        }

        WorkersStarted {
            operation_name: &node.id,
            threads: settings.threads,
            retry_count: settings.retry_count,
            sample_rate: settings.sample_rate,
        }
        .log();

        Ok(handles)
    }
}

/// Stop and join workers that read `input`.
fn stop_workers(input: &Queue<Envelope>, handles: Vec<JoinHandle<()>>) {
    stop_consumers(input, handles, || Envelope::Signal(Signal::Terminate));
}

#[derive(Clone)]
struct Worker {
    operation: Arc<dyn Operation>,
    context: OperationContext,
    input: Queue<Envelope>,
    reply: Queue<Reply>,
    fabric: Fabric,
}

impl Worker {
    fn run(&self, thread_name: &str) {
        while let Ok(envelope) = self.input.take() {
            if matches!(envelope, Envelope::Signal(Signal::Terminate)) {
                self.input.settle();
                WorkerStopped {
                    thread: thread_name,
                }
                .log();
                break;
            }

            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| self.handle(envelope)))
            {
                self.fabric.stats.record_panicked();
                OperationPanicked {
                    operation_name: &self.context.operation_name,
                    panic: &panic_message(payload.as_ref()),
                }
                .log();
            }

            // successors are enqueued by now
            self.input.settle();
        }
    }

    fn handle(&self, envelope: Envelope) {
        match envelope {
            Envelope::Data(message) => self.handle_message(message),
            Envelope::Signal(signal) => self.handle_signal(signal),
        }
    }

    fn handle_message(&self, mut message: Message) {
        let (attempts, result) = self.execute_with_retries(&mut message);
        match result {
            Ok(outcome) => {
                self.trace(&mut message, attempts);
                if outcome == Outcome::Forward {
                    self.publish(message);
                }
            }
            Err(error) => self.fail(attempts, &error),
        }
    }

    fn handle_signal(&self, signal: Signal) {
        match self.operation.signal(signal, &self.context) {
            Ok(Some(mut message)) => {
                self.trace(&mut message, 1);
                self.publish(message);
            }
            Ok(None) => {}
            Err(error) => self.fail(1, &error),
        }
    }

    fn execute_with_retries(&self, message: &mut Message) -> (u32, Result<Outcome, OperationError>) {
        let retry_count = self.context.settings.retry_count;
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.operation.execute(message) {
                Err(error) if error.is_transient() && attempts <= retry_count => {
                    OperationRetrying {
                        operation_name: &self.context.operation_name,
                        attempt: attempts,
                        retry_count,
                        error: &error,
                    }
                    .log();
                }
                result => return (attempts, result),
            }
        }
    }

    fn trace(&self, message: &mut Message, attempts: u32) {
        if !message.traced {
            return;
        }
        message.record(&self.context.operation_name, attempts);
        MessageTraced {
            message_id: message.id,
            operation_name: &self.context.operation_name,
            hop: message.trace.len(),
            attempts,
        }
        .log();
    }

    fn publish(&self, message: Message) {
        let reply = Reply::Data {
            respondent: self.context.operation_name.clone(),
            message,
        };
        self.fabric
            .deliver(&self.reply, reply, &self.context.operation_name);
    }

    fn fail(&self, attempts: u32, error: &OperationError) {
        self.fabric.stats.record_failed();
        OperationFailed {
            operation_name: &self.context.operation_name,
            attempts,
            error,
        }
        .log();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::{FailingOperation, FlakyOperation, RecordingOperation, StubOperation};
    use crate::config::BackpressurePolicy;
    use crate::engine::{PipelineStats, QueueRegistry};
    use crate::message::create_new_message;
    use serde_json::json;
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(5);

    fn fabric() -> Fabric {
        Fabric {
            registry: Arc::new(QueueRegistry::new(None)),
            stats: Arc::new(PipelineStats::default()),
            backpressure: BackpressurePolicy::Drop,
        }
    }

    fn stop(fabric: &Fabric, node: &str, handles: Vec<JoinHandle<()>>) {
        stop_workers(&fabric.registry.get_queue(node), handles);
    }

    fn next_reply(fabric: &Fabric) -> (String, Message) {
        match fabric.registry.reply_queue().get_timeout(WAIT) {
            Some(Reply::Data {
                respondent,
                message,
            }) => (respondent, message),
            other => panic!("expected a data reply, got {:?}", other),
        }
    }

    #[test]
    fn test_settings_are_clamped_and_name_assigned() {
        let fabric = fabric();
        let mut node = OperationNode::new("busy", Arc::new(StubOperation::new("busy")))
            .with_threads(100)
            .with_retry_count(-4)
            .with_sample_rate(7.5);

        let handles = OperationRunner::configure_and_start(&mut node, &InitConfig::new(), &fabric)
            .unwrap();

        assert_eq!(handles.len(), 5);
        assert_eq!(node.threads, 5);
        assert_eq!(node.retry_count, 0);
        assert_eq!(node.sample_rate, 1.0);
        assert_eq!(node.operation_name.as_deref(), Some("busy"));
        stop(&fabric, "busy", handles);
    }

    #[test]
    fn test_forwards_with_respondent_name() {
        let fabric = fabric();
        let mut node = OperationNode::new("entry", Arc::new(StubOperation::new("entry")));
        let handles = OperationRunner::configure_and_start(&mut node, &InitConfig::new(), &fabric)
            .unwrap();

        fabric
            .registry
            .get_queue("entry")
            .put(Envelope::Data(create_new_message(json!(3), 0.0)))
            .unwrap();

        let (respondent, message) = next_reply(&fabric);
        assert_eq!(respondent, "entry");
        assert_eq!(message.payload, json!(3));
        stop(&fabric, "entry", handles);
    }

    #[test]
    fn test_init_runs_once_for_all_threads() {
        let fabric = fabric();
        let sink = Arc::new(RecordingOperation::new());
        let mut node = OperationNode::new("sink", sink.clone()).with_threads(3);
        let mut config = InitConfig::new();
        config.insert("region".to_string(), json!("eu"));

        let handles = OperationRunner::configure_and_start(&mut node, &config, &fabric).unwrap();
        assert_eq!(handles.len(), 3);
        assert_eq!(sink.init_calls(), 1);
        assert_eq!(sink.init_config(), Some(config));
        stop(&fabric, "sink", handles);
    }

    #[test]
    fn test_stopping_workers_behind_a_bounded_queue() {
        let fabric = Fabric {
            registry: Arc::new(QueueRegistry::new(Some(1))),
            ..fabric()
        };
        let sink = Arc::new(RecordingOperation::new());
        let mut node = OperationNode::new("sink", sink.clone()).with_threads(2);
        let handles =
            OperationRunner::configure_and_start(&mut node, &InitConfig::new(), &fabric).unwrap();

        let input = fabric.registry.get_queue("sink");
        input
            .put_timeout(Envelope::Data(create_new_message(json!(1), 0.0)), WAIT)
            .unwrap();
        stop_workers(&input, handles);

        assert_eq!(sink.received(), vec![json!(1)]);
        assert!(input.is_empty());
    }

    #[test]
    fn test_init_failure_starts_nothing() {
        let fabric = fabric();
        let mut node = OperationNode::new("broken", Arc::new(FailingOperation::on_init()));

        let error = OperationRunner::configure_and_start(&mut node, &InitConfig::new(), &fabric)
            .unwrap_err();
        assert!(matches!(error, ExecutionError::InitFailed { ref operation, .. } if operation == "broken"));
    }

    #[test]
    fn test_transient_failures_are_retried() {
        let fabric = fabric();
        let mut node = OperationNode::new("flaky", Arc::new(FlakyOperation::new(2)))
            .with_retry_count(3);
        let handles = OperationRunner::configure_and_start(&mut node, &InitConfig::new(), &fabric)
            .unwrap();

        fabric
            .registry
            .get_queue("flaky")
            .put(Envelope::Data(create_new_message(json!("x"), 1.0)))
            .unwrap();

        let (_, message) = next_reply(&fabric);
        assert_eq!(message.journey(), vec!["flaky"]);
        assert_eq!(message.trace[0].attempts, 3);
        assert_eq!(fabric.stats.snapshot().failed, 0);
        stop(&fabric, "flaky", handles);
    }

    #[test]
    fn test_exhausted_retries_drop_and_count() {
        let fabric = fabric();
        let mut node = OperationNode::new("flaky", Arc::new(FlakyOperation::new(5)))
            .with_retry_count(1);
        let handles = OperationRunner::configure_and_start(&mut node, &InitConfig::new(), &fabric)
            .unwrap();

        let queue = fabric.registry.get_queue("flaky");
        queue
            .put(Envelope::Data(create_new_message(json!("x"), 0.0)))
            .unwrap();
        stop(&fabric, "flaky", handles);

        assert_eq!(fabric.stats.snapshot().failed, 1);
        assert!(fabric.registry.reply_queue().is_empty());
        assert_eq!(fabric.registry.in_flight(), 0);
    }

    #[test]
    fn test_worker_survives_panic() {
        let fabric = fabric();
        let sink = Arc::new(RecordingOperation::new());
        let mut node = OperationNode::new("sink", sink.clone());
        let handles = OperationRunner::configure_and_start(&mut node, &InitConfig::new(), &fabric)
            .unwrap();

        let queue = fabric.registry.get_queue("sink");
        queue
            .put(Envelope::Data(create_new_message(json!("panic"), 0.0)))
            .unwrap();
        queue
            .put(Envelope::Data(create_new_message(json!("after"), 0.0)))
            .unwrap();
        stop(&fabric, "sink", handles);

        assert_eq!(sink.received(), vec![json!("after")]);
        assert_eq!(fabric.stats.snapshot().panicked, 1);
        assert_eq!(fabric.registry.in_flight(), 0);
    }

    #[test]
    fn test_signal_result_is_published() {
        let fabric = fabric();
        let sink = Arc::new(RecordingOperation::new());
        let mut node = OperationNode::new("sink", sink.clone());
        let handles = OperationRunner::configure_and_start(&mut node, &InitConfig::new(), &fabric)
            .unwrap();

        let queue = fabric.registry.get_queue("sink");
        queue
            .put(Envelope::Data(create_new_message(json!(1), 0.0)))
            .unwrap();
        queue.put(Envelope::Signal(Signal::Emit)).unwrap();

        let (respondent, message) = next_reply(&fabric);
        assert_eq!(respondent, "sink");
        assert_eq!(message.payload, json!([1]));
        stop(&fabric, "sink", handles);
    }
}
