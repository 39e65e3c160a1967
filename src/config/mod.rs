// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod entry_points;
mod filters;
mod graph;
mod loader;
mod runtime;
mod settings;
mod validation;

pub mod consts;

pub use entry_points::EntryPoints;
pub use filters::{is_truthy, FilterConfig, FilterOp};
pub use graph::{always, Edge, Filter, OperationNode, PipelineGraph};
pub use loader::{
    load_and_validate_config, load_config, parse_config, BackpressurePolicy, Config, EdgeConfig,
    NodeConfig, PipelineOptions,
};
pub use runtime::RuntimeBuilder;
pub use settings::{clamp_retry_count, clamp_sample_rate, clamp_threads, NodeSettings};
pub use validation::validate_graph;
