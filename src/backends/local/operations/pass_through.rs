// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::OperationError;
use crate::message::Message;
use crate::traits::{Operation, Outcome};

/// Forwards every message unchanged. Useful as a fan-out point.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughOperation;

impl Operation for PassThroughOperation {
    fn execute(&self, _message: &mut Message) -> Result<Outcome, OperationError> {
        Ok(Outcome::Forward)
    }

    fn name(&self) -> &'static str {
        "pass_through"
    }
}
