// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Lowest allowed per-node sampling rate
pub const MIN_SAMPLE_RATE: f64 = 0.0;
/// Highest allowed per-node sampling rate (every message traced)
pub const MAX_SAMPLE_RATE: f64 = 1.0;
/// Sampling rate used when a node or pipeline does not specify one
pub const DEFAULT_SAMPLE_RATE: f64 = 0.001;

/// Lowest allowed retry count for transient `execute` failures
pub const MIN_RETRY_COUNT: i64 = 0;
/// Highest allowed retry count
pub const MAX_RETRY_COUNT: i64 = 10;
/// Retry count used when a node does not specify one
pub const DEFAULT_RETRY_COUNT: i64 = 0;

/// Fewest worker threads a node may run
pub const MIN_THREADS: i64 = 1;
/// Most worker threads a node may run
pub const MAX_THREADS: i64 = 5;
/// Worker threads used when a node does not specify a count
pub const DEFAULT_THREADS: i64 = 1;

/// Number of reply-handler threads draining the shared reply queue
pub const REPLY_HANDLER_THREADS: usize = 2;

/// Name under which the shared reply queue is reported
pub const REPLY_QUEUE_NAME: &str = "reply";

/// Default timeout for the `block` backpressure policy
pub const DEFAULT_BLOCK_TIMEOUT_MS: u64 = 250;

/// How long a shutdown waits on a full queue before checking whether the
/// thread it is trying to stop has already exited
pub const STOP_RETRY_INTERVAL_MS: u64 = 20;
