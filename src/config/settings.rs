// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{
    MAX_RETRY_COUNT, MAX_SAMPLE_RATE, MAX_THREADS, MIN_RETRY_COUNT, MIN_SAMPLE_RATE, MIN_THREADS,
};
use crate::config::OperationNode;

/// Clamp a sampling rate to [0, 1]. NaN is treated as 0.
pub fn clamp_sample_rate(requested: f64) -> f64 {
    if requested.is_nan() {
        return MIN_SAMPLE_RATE;
    }
    requested.clamp(MIN_SAMPLE_RATE, MAX_SAMPLE_RATE)
}

/// Clamp a retry count to [0, 10].
pub fn clamp_retry_count(requested: i64) -> u32 {
    requested.clamp(MIN_RETRY_COUNT, MAX_RETRY_COUNT) as u32
}

/// Clamp a worker thread count to [1, 5].
pub fn clamp_threads(requested: i64) -> usize {
    requested.clamp(MIN_THREADS, MAX_THREADS) as usize
}

/// Effective per-node configuration after clamping.
///
/// Out-of-range values saturate at the nearest bound; nothing is rejected.
///
/// # Example
/// ```
/// use cronicl::config::NodeSettings;
///
/// let settings = NodeSettings::clamped(2.0, 50, 100);
/// assert_eq!(settings.sample_rate, 1.0);
/// assert_eq!(settings.retry_count, 10);
/// assert_eq!(settings.threads, 5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeSettings {
    pub sample_rate: f64,
    pub retry_count: u32,
    pub threads: usize,
}

impl NodeSettings {
    pub fn clamped(sample_rate: f64, retry_count: i64, threads: i64) -> Self {
        Self {
            sample_rate: clamp_sample_rate(sample_rate),
            retry_count: clamp_retry_count(retry_count),
            threads: clamp_threads(threads),
        }
    }

    /// Clamp the raw values a node was declared with.
    pub fn for_node(node: &OperationNode) -> Self {
        Self::clamped(node.sample_rate, node.retry_count, node.threads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threads_are_clamped() {
        assert_eq!(clamp_threads(100), 5);
        assert_eq!(clamp_threads(0), 1);
        assert_eq!(clamp_threads(-3), 1);
        assert_eq!(clamp_threads(3), 3);
    }

    #[test]
    fn test_retry_count_is_clamped() {
        assert_eq!(clamp_retry_count(-5), 0);
        assert_eq!(clamp_retry_count(50), 10);
        assert_eq!(clamp_retry_count(i64::MAX), 10);
        assert_eq!(clamp_retry_count(4), 4);
    }

    #[test]
    fn test_sample_rate_is_clamped() {
        assert_eq!(clamp_sample_rate(2.0), 1.0);
        assert_eq!(clamp_sample_rate(-1.0), 0.0);
        assert_eq!(clamp_sample_rate(f64::NAN), 0.0);
        assert_eq!(clamp_sample_rate(f64::INFINITY), 1.0);
        assert_eq!(clamp_sample_rate(0.25), 0.25);
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let low = NodeSettings::clamped(0.0, 0, 1);
        assert_eq!(low, NodeSettings { sample_rate: 0.0, retry_count: 0, threads: 1 });
        let high = NodeSettings::clamped(1.0, 10, 5);
        assert_eq!(high, NodeSettings { sample_rate: 1.0, retry_count: 10, threads: 5 });
    }
}
