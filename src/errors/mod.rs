// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod execution;

pub use config::{ConfigError, ValidationError, ValidationErrors};
pub use execution::{ExecutionError, OperationError, QueueError};
