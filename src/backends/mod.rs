// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Operation implementations.
//!
//! ## Local Backend
//! In-process operations that can be named from a pipeline file:
//! - **Transformation**: `pass_through`, `multiply`, `change_text_case`
//! - **Aggregation**: `collector` (EMIT / RESET aware), `counter` (sensor)
//!
//! Instances are created by [`LocalOperationFactory`](local::LocalOperationFactory)
//! from a node's `operation` name and `options`, or constructed directly when a graph
//! is built in code.
//!
//! ## Stub Backend (Test-Only)
//! Operations that fail, panic, flake or record everything they see. Only available
//! in test builds.
//!
//! # Example
//! ```rust
//! use cronicl::backends::local::LocalOperationFactory;
//! use cronicl::config::parse_config;
//!
//! let config = parse_config("nodes:\n  - { id: shout, operation: change_text_case }\n")?;
//! let operation = LocalOperationFactory::create_operation(&config.nodes[0])?;
//! assert_eq!(operation.name(), "change_text_case");
//! # Ok::<(), cronicl::errors::ConfigError>(())
//! ```

pub mod local;
#[cfg(test)]
pub mod stub;
