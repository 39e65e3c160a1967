// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{
    DEFAULT_BLOCK_TIMEOUT_MS, DEFAULT_RETRY_COUNT, DEFAULT_SAMPLE_RATE, DEFAULT_THREADS,
};
use crate::config::FilterConfig;
use crate::errors::ConfigError;
use crate::traits::InitConfig;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// A pipeline definition, typically loaded from a YAML file.
///
/// # Fields
/// * `options` - Pipeline-wide settings (optional)
/// * `init` - Map handed to every operation's `init` (optional)
/// * `nodes` - The operations making up the graph
/// * `edges` - Connections between nodes, optionally filtered
///
/// # Example
/// ```yaml
/// options:
///   sample_rate: 0.01
///   queue_capacity: 1024
///   backpressure: { policy: block, timeout_ms: 250 }
/// nodes:
///   - id: entry
///     operation: pass_through
///     threads: 2
///   - id: double
///     operation: multiply
///     options: { factor: 2 }
/// edges:
///   - from: entry
///     to: double
///     filter: { op: gt, value: 0 }
/// ```
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub options: PipelineOptions,
    #[serde(default)]
    pub init: InitConfig,
    pub nodes: Vec<NodeConfig>,
    #[serde(default)]
    pub edges: Vec<EdgeConfig>,
}

/// Pipeline-wide settings.
///
/// # Fields
/// * `sample_rate` - Probability that a message created by `execute` is traced
/// * `queue_capacity` - Bound for every queue; unbounded when absent (0 is raised to 1)
/// * `backpressure` - What the router does when a downstream queue is full
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PipelineOptions {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: f64,
    #[serde(default)]
    pub queue_capacity: Option<usize>,
    #[serde(default)]
    pub backpressure: BackpressurePolicy,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            queue_capacity: None,
            backpressure: BackpressurePolicy::default(),
        }
    }
}

/// Behavior when a bounded downstream queue is full.
///
/// * `Drop` - Give up immediately; the message is dropped and counted
/// * `Block` - Wait up to `timeout_ms` for room, then drop and count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum BackpressurePolicy {
    #[default]
    Drop,
    Block {
        #[serde(default = "default_block_timeout_ms")]
        timeout_ms: u64,
    },
}

/// Configuration for a single node.
///
/// # Example
/// ```yaml
/// id: "double"
/// operation: "multiply"
/// threads: 3
/// retry_count: 2
/// options:
///   factor: 2
/// ```
#[derive(Debug, Deserialize)]
pub struct NodeConfig {
    pub id: String,
    pub operation: Option<String>,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: f64,
    #[serde(default = "default_retry_count")]
    pub retry_count: i64,
    #[serde(default = "default_threads")]
    pub threads: i64,
    #[serde(default)]
    pub options: HashMap<String, serde_yaml::Value>, // operation-specific options
}

/// Configuration for a single edge.
#[derive(Debug, Deserialize)]
pub struct EdgeConfig {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub filter: Option<FilterConfig>,
}

fn default_sample_rate() -> f64 {
    DEFAULT_SAMPLE_RATE
}

fn default_retry_count() -> i64 {
    DEFAULT_RETRY_COUNT
}

fn default_threads() -> i64 {
    DEFAULT_THREADS
}

fn default_block_timeout_ms() -> u64 {
    DEFAULT_BLOCK_TIMEOUT_MS
}

/// Parse a pipeline definition from YAML text.
pub fn parse_config(yaml: &str) -> Result<Config, ConfigError> {
    Ok(serde_yaml::from_str(yaml)?)
}

/// Load a pipeline definition from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content)
}

/// Load a pipeline definition and make sure it builds into a valid graph.
///
/// Operation names are resolved through the local operation factory, so unknown
/// operations are reported here alongside graph shape problems.
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let cfg = load_config(path)?;
    let (graph, _, _) = crate::config::RuntimeBuilder::from_config(&cfg)?;
    crate::config::validate_graph(&graph).map_err(|errors| ConfigError::Validation(errors.into()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parse_basic_config() {
        let yaml = r#"
nodes:
  - id: entry
    operation: pass_through
  - id: double
    operation: multiply
    threads: 3
    options:
      factor: 2
edges:
  - from: entry
    to: double
"#;

        let cfg = parse_config(yaml).unwrap();
        assert_eq!(cfg.nodes.len(), 2);
        assert_eq!(cfg.nodes[1].threads, 3);
        assert_eq!(cfg.nodes[0].threads, DEFAULT_THREADS);
        assert_eq!(cfg.nodes[0].retry_count, DEFAULT_RETRY_COUNT);
        assert_eq!(cfg.edges[0].from, "entry");
        assert!(cfg.edges[0].filter.is_none());
        assert_eq!(cfg.options, PipelineOptions::default());
        assert!(cfg.init.is_empty());
    }

    #[test]
    fn parse_options_and_init() {
        let yaml = r#"
options:
  sample_rate: 0.5
  queue_capacity: 16
  backpressure:
    policy: block
    timeout_ms: 40
init:
  region: eu
  limit: 3
nodes:
  - id: only
    operation: counter
"#;

        let cfg = parse_config(yaml).unwrap();
        assert_eq!(cfg.options.sample_rate, 0.5);
        assert_eq!(cfg.options.queue_capacity, Some(16));
        assert_eq!(
            cfg.options.backpressure,
            BackpressurePolicy::Block { timeout_ms: 40 }
        );
        assert_eq!(cfg.init.get("region"), Some(&serde_json::json!("eu")));
        assert_eq!(cfg.init.get("limit"), Some(&serde_json::json!(3)));
    }

    #[test]
    fn parse_block_policy_default_timeout() {
        let yaml = r#"
options:
  backpressure: { policy: block }
nodes: []
"#;
        let cfg = parse_config(yaml).unwrap();
        assert_eq!(
            cfg.options.backpressure,
            BackpressurePolicy::Block {
                timeout_ms: DEFAULT_BLOCK_TIMEOUT_MS
            }
        );
    }

    #[test]
    fn test_load_and_validate_valid_config() {
        let yaml = r#"
nodes:
  - id: entry
    operation: pass_through
  - id: double
    operation: multiply
edges:
  - from: entry
    to: double
    filter: { op: gt, value: 0 }
"#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let result = load_and_validate_config(file.path());
        assert!(result.is_ok());
    }

    #[test]
    fn test_load_and_validate_cyclic_config() {
        let yaml = r#"
nodes:
  - id: a
    operation: pass_through
  - id: b
    operation: pass_through
edges:
  - from: a
    to: b
  - from: b
    to: a
"#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let error_msg = load_and_validate_config(file.path()).unwrap_err().to_string();
        assert!(error_msg.contains("Cycle detected"));
    }

    #[test]
    fn test_load_and_validate_unknown_operation() {
        let yaml = r#"
nodes:
  - id: mystery
    operation: teleport
"#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let error_msg = load_and_validate_config(file.path()).unwrap_err().to_string();
        assert!(error_msg.contains("operation 'teleport' which has no implementation"));
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config("/definitely/not/here.yaml");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
