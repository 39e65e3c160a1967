// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::Value;

use crate::config::NodeSettings;
use crate::errors::OperationError;
use crate::message::{Message, Signal};

/// Configuration handed once to every operation's `init`.
pub type InitConfig = serde_json::Map<String, Value>;

/// What the worker should do with a message once `execute` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Publish the message to the reply queue for routing downstream.
    Forward,
    /// The operation kept or discarded the message; nothing is published.
    Consume,
}

/// Identity and effective settings of the node an operation runs in.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationContext {
    pub operation_name: String,
    pub settings: NodeSettings,
}

/// A unit of work hosted by a pipeline node.
///
/// Only `execute` is required. The remaining capabilities default to doing nothing:
/// `init` runs once per node before its workers start, `signal` sees EMIT and RESET,
/// `close` runs when the pipeline is closed and `read_sensor` feeds
/// `Pipeline::read_sensors`.
///
/// A node with several worker threads calls `execute` concurrently on the same
/// instance, so implementations keep any mutable state behind their own locks.
pub trait Operation: Send + Sync {
    fn execute(&self, message: &mut Message) -> Result<Outcome, OperationError>;

    fn name(&self) -> &'static str;

    fn init(&self, _config: &InitConfig) -> Result<(), OperationError> {
        Ok(())
    }

    /// Handle a non-terminating signal. A returned message is routed like any other.
    fn signal(
        &self,
        _signal: Signal,
        _context: &OperationContext,
    ) -> Result<Option<Message>, OperationError> {
        Ok(None)
    }

    fn close(&self) {}

    fn read_sensor(&self) -> Option<Value> {
        None
    }
}
