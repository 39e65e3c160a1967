// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod fabric;
pub mod pipeline;
pub mod queues;
pub mod router;
pub mod runner;
pub mod stats;

pub use pipeline::{Pipeline, PipelineState, SensorReading};
pub use queues::{Queue, QueueRegistry};
pub use router::{ReplyRouter, Route, RoutingTable};
pub use runner::OperationRunner;
pub use stats::{PipelineStats, StatsSnapshot};
