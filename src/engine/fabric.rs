// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! State shared by every worker and reply handler of one pipeline.

use std::any::Any;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::config::consts::STOP_RETRY_INTERVAL_MS;
use crate::config::BackpressurePolicy;
use crate::engine::{PipelineStats, Queue, QueueRegistry};
use crate::errors::QueueError;
use crate::observability::messages::engine::MessageDropped;
use crate::observability::messages::StructuredLog;

#[derive(Clone)]
pub(crate) struct Fabric {
    pub registry: Arc<QueueRegistry>,
    pub stats: Arc<PipelineStats>,
    pub backpressure: BackpressurePolicy,
}

impl Fabric {
    /// Enqueue `item` under the backpressure policy. A refused item is dropped,
    /// logged and counted.
    pub fn deliver<T>(&self, queue: &Queue<T>, item: T, source: &str) -> bool {
        let result = match self.backpressure {
            BackpressurePolicy::Drop => queue.put(item),
            BackpressurePolicy::Block { timeout_ms } => {
                queue.put_timeout(item, Duration::from_millis(timeout_ms))
            }
        };

        match result {
            Ok(()) => true,
            Err(error) => {
                self.stats.record_dropped();
                MessageDropped {
                    source,
                    target: queue.name(),
                    reason: &error,
                }
                .log();
                false
            }
        }
    }
}

/// Stop every thread in `handles` by sending TERMINATE through `queue`, then join.
///
/// Any live consumer may take any TERMINATE, so signals are sent until the ones
/// still queued cover every live thread. Threads that have already exited are not
/// signalled, and a full queue is only waited on while some thread can still
/// drain it.
pub(crate) fn stop_consumers<T>(
    queue: &Queue<T>,
    handles: Vec<JoinHandle<()>>,
    terminate: impl Fn() -> T,
) {
    let retry = Duration::from_millis(STOP_RETRY_INTERVAL_MS);
    let finished = || handles.iter().filter(|handle| handle.is_finished()).count();
    let finished_before = finished();
    let mut sent = 0;

    loop {
        let finished_now = finished();
        let alive = handles.len() - finished_now;
        // threads that exited since we started may each have taken one of ours
        let queued = sent - (finished_now - finished_before).min(sent);
        if alive == 0 || queued >= alive {
            break;
        }
        match queue.put_timeout(terminate(), retry) {
            Ok(()) => sent += 1,
            Err(QueueError::Timeout { .. }) => continue,
            Err(error) => {
                tracing::error!(queue = queue.name(), %error, "Failed to signal threads");
                break;
            }
        }
    }

    for handle in handles {
        let thread = handle.thread().name().unwrap_or("unnamed").to_string();
        if handle.join().is_err() {
            tracing::error!(thread = thread.as_str(), "Thread panicked");
        }
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        text.to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
