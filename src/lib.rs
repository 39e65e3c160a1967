// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;   // operation implementations
pub mod config;     // graph, validation, pipeline files
pub mod engine;     // queues, workers, reply routing, controller
pub mod errors;     // error handling
pub mod message;    // message envelope and signals
pub mod observability;
pub mod traits;     // operation capability set
