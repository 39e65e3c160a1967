// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Structured logging for the pipeline engine.
//!
//! Every diagnostic the engine emits is a small struct with a `Display`
//! implementation and a [`StructuredLog`](messages::StructuredLog) implementation
//! that attaches the struct's fields to the `tracing` event. Keeping the text in one
//! place keeps log lines consistent between the controller, workers and reply
//! handlers.
//!
//! Messages are organized by subsystem:
//! * `messages::engine` - pipeline lifecycle, routing and backpressure events
//! * `messages::operation` - worker and operation events
//! * `messages::validation` - graph validation events
//!
//! # Usage
//!
//! ```rust
//! use cronicl::observability::messages::operation::OperationFailed;
//! use cronicl::observability::messages::StructuredLog;
//!
//! let error = std::io::Error::new(std::io::ErrorKind::Other, "test error");
//! let msg = OperationFailed {
//!     operation_name: "double",
//!     attempts: 3,
//!     error: &error,
//! };
//!
//! msg.log();
//! ```

pub mod messages;
