// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use super::operations::*;
use crate::config::NodeConfig;
use crate::errors::{ConfigError, ValidationError, ValidationErrors};
use crate::traits::Operation;

/// Factory for creating local (in-process) operation instances
pub struct LocalOperationFactory;

impl LocalOperationFactory {
    /// Create an operation instance from node configuration
    ///
    /// The `operation` field determines which operation to create:
    /// - "pass_through" -> PassThroughOperation
    /// - "multiply" -> MultiplyOperation (option `factor`, default 2)
    /// - "change_text_case" -> ChangeTextCaseOperation (option `case`: upper, lower, proper)
    /// - "collector" -> CollectorOperation
    /// - "counter" -> CounterOperation
    ///
    /// Unknown names are reported as `ValidationError::UnknownOperation` so callers can
    /// collect them alongside other graph problems.
    pub fn create_operation(config: &NodeConfig) -> Result<Arc<dyn Operation>, ConfigError> {
        let Some(name) = config.operation.as_deref() else {
            return Err(ValidationErrors(vec![ValidationError::MissingOperation {
                node_id: config.id.clone(),
            }])
            .into());
        };

        match name {
            "pass_through" => Ok(Arc::new(PassThroughOperation)),
            "multiply" => {
                let factor = match config.options.get("factor") {
                    None => multiply::DEFAULT_FACTOR,
                    Some(value) => value
                        .as_f64()
                        .filter(|factor| factor.is_finite())
                        .ok_or_else(|| invalid_option(config, "factor", "expected a finite number"))?,
                };
                Ok(Arc::new(MultiplyOperation::new(factor)))
            }
            "change_text_case" => {
                let case = match config.options.get("case") {
                    None => TextCase::default(),
                    Some(value) => value
                        .as_str()
                        .ok_or_else(|| invalid_option(config, "case", "expected a string"))?
                        .parse::<TextCase>()
                        .map_err(|reason| invalid_option(config, "case", &reason))?,
                };
                Ok(Arc::new(ChangeTextCaseOperation::new(case)))
            }
            "collector" => Ok(Arc::new(CollectorOperation::new())),
            "counter" => Ok(Arc::new(CounterOperation::new())),
            _ => Err(ValidationErrors(vec![ValidationError::UnknownOperation {
                node_id: config.id.clone(),
                operation: name.to_string(),
            }])
            .into()),
        }
    }

    /// List all available local operation implementations
    pub fn list_available_implementations() -> Vec<&'static str> {
        vec![
            "pass_through",
            "multiply",
            "change_text_case",
            "collector",
            "counter",
        ]
    }

    /// Check if an implementation is available
    pub fn is_implementation_available(name: &str) -> bool {
        Self::list_available_implementations().contains(&name)
    }
}

fn invalid_option(config: &NodeConfig, option: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidOption {
        node_id: config.id.clone(),
        option: option.to_string(),
        reason: reason.to_string(),
    }
}
