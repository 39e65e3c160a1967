// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Construction-time validation of pipeline graphs.
//!
//! A pipeline routes every message along exactly one path from an entry node, so the
//! graph must be a forest once edge direction is ignored and no node may have more
//! than one incoming edge. The checks run in this order:
//!
//! 1. **Uniqueness**: node ids are unique
//! 2. **Operations**: every node has an operation to run
//! 3. **References**: every edge names existing nodes
//! 4. **Fan-in**: no node has two incoming edges
//! 5. **Forest**: no cycle in the undirected graph
//!
//! Steps 4 and 5 need a structurally sound graph, so they only run when steps 1 and
//! 3 found nothing. Errors are accumulated so callers see every problem at once.
//!
//! # Cycle Detection
//!
//! Depth-first search over the undirected adjacency list, remembering which edge led
//! into each node. Reaching an already visited node through any other edge closes a
//! cycle; self-loops and parallel edges are caught the same way.
//! **Time Complexity**: O(V + E)
//!
//! # Example
//! ```
//! use std::sync::Arc;
//! use cronicl::backends::local::PassThroughOperation;
//! use cronicl::config::{validate_graph, OperationNode, PipelineGraph};
//! use cronicl::errors::ValidationError;
//!
//! let mut graph = PipelineGraph::new();
//! graph
//!     .add_node(OperationNode::new("a", Arc::new(PassThroughOperation)))
//!     .add_node(OperationNode::new("b", Arc::new(PassThroughOperation)))
//!     .add_edge("a", "b")
//!     .add_edge("b", "a");
//!
//! let errors = validate_graph(&graph).unwrap_err();
//! assert!(errors.iter().any(|e| matches!(e, ValidationError::CyclicGraph { .. })));
//! ```

use std::collections::{HashMap, HashSet};

use crate::config::PipelineGraph;
use crate::errors::ValidationError;

/// Validates a pipeline graph for structural integrity.
///
/// # Returns
///
/// * `Ok(())` - The graph can be run as a pipeline
/// * `Err(Vec<ValidationError>)` - Every validation error found
pub fn validate_graph(graph: &PipelineGraph) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut structurally_sound = true;

    if let Err(duplicate_errors) = validate_unique_node_ids(graph) {
        errors.extend(duplicate_errors);
        structurally_sound = false;
    }

    if let Err(operation_errors) = validate_operations_present(graph) {
        errors.extend(operation_errors);
    }

    if let Err(reference_errors) = validate_edge_references(graph) {
        errors.extend(reference_errors);
        structurally_sound = false;
    }

    if structurally_sound {
        if let Err(fan_in_errors) = validate_no_fan_in(graph) {
            errors.extend(fan_in_errors);
        }
        if let Err(cycle_errors) = validate_undirected_acyclic(graph) {
            errors.extend(cycle_errors);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_unique_node_ids(graph: &PipelineGraph) -> Result<(), Vec<ValidationError>> {
    let mut seen_ids = HashSet::new();
    let mut errors = Vec::new();

    for node in graph.nodes() {
        if !seen_ids.insert(node.id.as_str()) {
            errors.push(ValidationError::DuplicateNode {
                node_id: node.id.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_operations_present(graph: &PipelineGraph) -> Result<(), Vec<ValidationError>> {
    let errors: Vec<ValidationError> = graph
        .nodes()
        .iter()
        .filter(|node| node.operation.is_none())
        .map(|node| ValidationError::MissingOperation {
            node_id: node.id.clone(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_edge_references(graph: &PipelineGraph) -> Result<(), Vec<ValidationError>> {
    let node_ids: HashSet<&str> = graph.nodes().iter().map(|n| n.id.as_str()).collect();
    let mut errors = Vec::new();

    for edge in graph.edges() {
        for endpoint in [&edge.source, &edge.target] {
            if !node_ids.contains(endpoint.as_str()) {
                errors.push(ValidationError::UnresolvedEdge {
                    source: edge.source.clone(),
                    target: edge.target.clone(),
                    missing: endpoint.clone(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_no_fan_in(graph: &PipelineGraph) -> Result<(), Vec<ValidationError>> {
    let mut sources_by_target: HashMap<&str, Vec<String>> = HashMap::new();
    for edge in graph.edges() {
        sources_by_target
            .entry(edge.target.as_str())
            .or_default()
            .push(edge.source.clone());
    }

    let mut errors = Vec::new();
    for node in graph.nodes() {
        if let Some(sources) = sources_by_target.remove(node.id.as_str()) {
            if sources.len() > 1 {
                errors.push(ValidationError::FanIn {
                    node_id: node.id.clone(),
                    sources,
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_undirected_acyclic(graph: &PipelineGraph) -> Result<(), Vec<ValidationError>> {
    // node -> [(neighbor, edge index)], both directions
    let mut adjacency: HashMap<&str, Vec<(&str, usize)>> = HashMap::new();
    for node in graph.nodes() {
        adjacency.insert(node.id.as_str(), Vec::new());
    }
    for (index, edge) in graph.edges().iter().enumerate() {
        if let Some(neighbors) = adjacency.get_mut(edge.source.as_str()) {
            neighbors.push((edge.target.as_str(), index));
        }
        if let Some(neighbors) = adjacency.get_mut(edge.target.as_str()) {
            neighbors.push((edge.source.as_str(), index));
        }
    }

    let mut visited = HashSet::new();

    for node in graph.nodes() {
        if !visited.contains(node.id.as_str()) {
            if let Some(cycle) = undirected_cycle(node.id.as_str(), &adjacency, &mut visited) {
                return Err(vec![ValidationError::CyclicGraph { cycle }]);
            }
        }
    }

    Ok(())
}

/// DFS from `root` that returns the first cycle found, closed by repeating its
/// first node.
///
/// Each stack frame holds a node, the edge used to reach it and the index of the
/// next neighbor to look at. Walking back along the edge a node was reached by is
/// not a cycle, but walking back along a parallel edge is.
fn undirected_cycle<'a>(
    root: &'a str,
    adjacency: &HashMap<&'a str, Vec<(&'a str, usize)>>,
    visited: &mut HashSet<&'a str>,
) -> Option<Vec<String>> {
    let mut stack: Vec<(&'a str, Option<usize>, usize)> = vec![(root, None, 0)];
    visited.insert(root);

    while let Some(&(node, via, next)) = stack.last() {
        let neighbors = adjacency.get(node).map(Vec::as_slice).unwrap_or_default();
        let Some(&(neighbor, edge_index)) = neighbors.get(next) else {
            stack.pop();
            continue;
        };
        let top = stack.len() - 1;
        stack[top].2 += 1;

        if Some(edge_index) == via {
            continue;
        }
        if visited.contains(neighbor) {
            let start = stack.iter().position(|(id, _, _)| *id == neighbor).unwrap_or(0);
            let mut cycle: Vec<String> = stack[start..].iter().map(|(id, _, _)| id.to_string()).collect();
            cycle.push(neighbor.to_string());
            return Some(cycle);
        }
        visited.insert(neighbor);
        stack.push((neighbor, Some(edge_index), 0));
    }

    None
}
