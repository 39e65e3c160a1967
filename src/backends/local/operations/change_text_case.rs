// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::OperationError;
use crate::message::Message;
use crate::traits::{Operation, Outcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextCase {
    #[default]
    Upper,
    Lower,
    /// First letter of each word capitalized, the rest lowercased
    Proper,
}

impl FromStr for TextCase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upper" => Ok(TextCase::Upper),
            "lower" => Ok(TextCase::Lower),
            "proper" => Ok(TextCase::Proper),
            other => Err(format!(
                "unknown case '{}', expected one of: upper, lower, proper",
                other
            )),
        }
    }
}

/// Change Text Case operation - converts string payloads to another case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChangeTextCaseOperation {
    case: TextCase,
}

impl ChangeTextCaseOperation {
    pub fn new(case: TextCase) -> Self {
        Self { case }
    }

    pub fn upper() -> Self {
        Self::new(TextCase::Upper)
    }

    pub fn lower() -> Self {
        Self::new(TextCase::Lower)
    }

    pub fn proper() -> Self {
        Self::new(TextCase::Proper)
    }

    fn convert(&self, input: &str) -> String {
        match self.case {
            TextCase::Upper => input.to_uppercase(),
            TextCase::Lower => input.to_lowercase(),
            TextCase::Proper => input
                .split_whitespace()
                .map(|word| {
                    let mut chars = word.chars();
                    match chars.next() {
                        None => String::new(),
                        Some(first) => {
                            first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                        }
                    }
                })
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

impl Operation for ChangeTextCaseOperation {
    fn execute(&self, message: &mut Message) -> Result<Outcome, OperationError> {
        let Value::String(text) = &message.payload else {
            return Err(OperationError::failed(format!(
                "change_text_case expects a string, got {}",
                message.payload
            )));
        };
        message.payload = Value::String(self.convert(text));
        Ok(Outcome::Forward)
    }

    fn name(&self) -> &'static str {
        "change_text_case"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::create_new_message;
    use serde_json::json;

    fn run(operation: ChangeTextCaseOperation, payload: Value) -> Result<Value, OperationError> {
        let mut message = create_new_message(payload, 0.0);
        operation.execute(&mut message)?;
        Ok(message.payload)
    }

    #[test]
    fn test_cases() {
        let cases = vec![
            (ChangeTextCaseOperation::upper(), "hello World", "HELLO WORLD"),
            (ChangeTextCaseOperation::lower(), "HELLO World", "hello world"),
            (ChangeTextCaseOperation::proper(), "the qUICK  fox", "The Quick Fox"),
        ];
        for (operation, input, expected) in cases {
            assert_eq!(run(operation, json!(input)).unwrap(), json!(expected));
        }
    }

    #[test]
    fn test_parse_case() {
        assert_eq!("lower".parse::<TextCase>(), Ok(TextCase::Lower));
        assert!("sideways".parse::<TextCase>().unwrap_err().contains("sideways"));
    }

    #[test]
    fn test_non_string_payload_fails() {
        let error = run(ChangeTextCaseOperation::upper(), json!(12)).unwrap_err();
        assert!(error.to_string().contains("expects a string"));
    }
}
