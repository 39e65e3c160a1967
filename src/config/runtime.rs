// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::backends::local::LocalOperationFactory;
use crate::config::{Config, Edge, OperationNode, PipelineGraph, PipelineOptions};
use crate::engine::Pipeline;
use crate::errors::{ConfigError, ValidationErrors};
use crate::traits::InitConfig;

/// Pipeline runtime builder - turns a loaded [`Config`] into the pieces a
/// [`Pipeline`] is made of.
///
/// Operation names are resolved through [`LocalOperationFactory`]; every unknown
/// name is reported together in one `ConfigError::Validation`.
///
/// # Examples
///
/// ```
/// use cronicl::config::{parse_config, RuntimeBuilder};
///
/// let config = parse_config(r#"
/// nodes:
///   - id: entry
///     operation: pass_through
///   - id: double
///     operation: multiply
/// edges:
///   - { from: entry, to: double }
/// "#).unwrap();
///
/// let (graph, options, init) = RuntimeBuilder::from_config(&config).unwrap();
/// assert_eq!(graph.len(), 2);
/// assert_eq!(graph.entry_nodes().0, vec!["entry".to_string()]);
/// assert!(init.is_empty());
/// # let _ = options;
/// ```
pub struct RuntimeBuilder;

impl RuntimeBuilder {
    /// Build the graph, options and init map described by `cfg`.
    pub fn from_config(
        cfg: &Config,
    ) -> Result<(PipelineGraph, PipelineOptions, InitConfig), ConfigError> {
        let mut graph = PipelineGraph::new();
        let mut unknown = Vec::new();

        for node_cfg in &cfg.nodes {
            let mut node = match &node_cfg.operation {
                Some(_) => match LocalOperationFactory::create_operation(node_cfg) {
                    Ok(operation) => OperationNode::new(node_cfg.id.clone(), operation),
                    Err(ConfigError::Validation(errors)) => {
                        unknown.extend(errors.0);
                        continue;
                    }
                    Err(other) => return Err(other),
                },
                None => OperationNode::without_operation(node_cfg.id.clone()),
            };
            node.sample_rate = node_cfg.sample_rate;
            node.retry_count = node_cfg.retry_count;
            node.threads = node_cfg.threads;
            graph.add_node(node);
        }

        if !unknown.is_empty() {
            return Err(ConfigError::Validation(ValidationErrors(unknown)));
        }

        for edge_cfg in &cfg.edges {
            let mut edge = Edge::new(edge_cfg.from.clone(), edge_cfg.to.clone());
            if let Some(filter) = &edge_cfg.filter {
                edge.filter = Some(filter.clone().into_filter());
            }
            graph.push_edge(edge);
        }

        Ok((graph, cfg.options.clone(), cfg.init.clone()))
    }

    /// Build and validate a ready-to-init [`Pipeline`].
    pub fn build_pipeline(cfg: &Config) -> Result<(Pipeline, InitConfig), ConfigError> {
        let (graph, options, init) = Self::from_config(cfg)?;
        let pipeline = Pipeline::new(graph, options)?;
        Ok((pipeline, init))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::errors::ValidationError;
    use crate::message::create_new_message;
    use serde_json::json;

    #[test]
    fn test_node_settings_carry_over() {
        let cfg = parse_config(
            r#"
nodes:
  - id: busy
    operation: pass_through
    threads: 9
    retry_count: -2
    sample_rate: 0.3
"#,
        )
        .unwrap();

        let (graph, _, _) = RuntimeBuilder::from_config(&cfg).unwrap();
        let node = graph.node("busy").unwrap();
        // raw values are kept; clamping happens at init
        assert_eq!(node.threads, 9);
        assert_eq!(node.retry_count, -2);
        assert_eq!(node.sample_rate, 0.3);
    }

    #[test]
    fn test_edge_filters_are_built() {
        let cfg = parse_config(
            r#"
nodes:
  - { id: r, operation: pass_through }
  - { id: a, operation: pass_through }
edges:
  - from: r
    to: a
    filter: { op: gt, value: 0 }
"#,
        )
        .unwrap();

        let (graph, _, _) = RuntimeBuilder::from_config(&cfg).unwrap();
        let filter = graph.edges()[0].filter_or_default();
        assert!(filter(&create_new_message(json!(5), 0.0)));
        assert!(!filter(&create_new_message(json!(-1), 0.0)));
    }

    #[test]
    fn test_unknown_operations_are_all_reported() {
        let cfg = parse_config(
            r#"
nodes:
  - { id: a, operation: warp }
  - { id: b, operation: pass_through }
  - { id: c, operation: fold }
"#,
        )
        .unwrap();

        match RuntimeBuilder::from_config(&cfg) {
            Err(ConfigError::Validation(errors)) => {
                assert_eq!(errors.len(), 2);
                assert!(errors
                    .iter()
                    .all(|e| matches!(e, ValidationError::UnknownOperation { .. })));
            }
            other => panic!("Expected unknown operation errors, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_node_without_operation_fails_pipeline_construction() {
        let cfg = parse_config(
            r#"
nodes:
  - { id: empty }
"#,
        )
        .unwrap();

        match RuntimeBuilder::build_pipeline(&cfg) {
            Err(ConfigError::Validation(errors)) => {
                assert_eq!(
                    errors.0,
                    vec![ValidationError::MissingOperation {
                        node_id: "empty".to_string()
                    }]
                );
            }
            other => panic!("Expected validation failure, got {:?}", other.map(|_| ())),
        }
    }
}
