// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::{Number, Value};

use crate::errors::OperationError;
use crate::message::Message;
use crate::traits::{Operation, Outcome};

pub const DEFAULT_FACTOR: f64 = 2.0;

/// Multiplies numeric payloads by a fixed factor.
///
/// Integers stay integers when the factor is whole and the product fits in an
/// `i64`; everything else is computed as `f64`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MultiplyOperation {
    factor: f64,
}

impl MultiplyOperation {
    pub fn new(factor: f64) -> Self {
        Self { factor }
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    fn multiply(&self, value: &Value) -> Option<Value> {
        if let Some(n) = value.as_i64() {
            if self.factor.fract() == 0.0 {
                if let Some(product) = n.checked_mul(self.factor as i64) {
                    return Some(Value::from(product));
                }
            }
        }
        let product = value.as_f64()? * self.factor;
        Number::from_f64(product).map(Value::Number)
    }
}

impl Default for MultiplyOperation {
    fn default() -> Self {
        Self::new(DEFAULT_FACTOR)
    }
}

impl Operation for MultiplyOperation {
    fn execute(&self, message: &mut Message) -> Result<Outcome, OperationError> {
        let product = self.multiply(&message.payload).ok_or_else(|| {
            OperationError::failed(format!(
                "multiply expects a finite number, got {}",
                message.payload
            ))
        })?;
        message.payload = product;
        Ok(Outcome::Forward)
    }

    fn name(&self) -> &'static str {
        "multiply"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::create_new_message;
    use serde_json::json;

    fn run(operation: MultiplyOperation, payload: Value) -> Result<Value, OperationError> {
        let mut message = create_new_message(payload, 0.0);
        operation.execute(&mut message)?;
        Ok(message.payload)
    }

    #[test]
    fn test_integers_stay_integers() {
        assert_eq!(run(MultiplyOperation::default(), json!(21)).unwrap(), json!(42));
        assert_eq!(run(MultiplyOperation::new(-3.0), json!(4)).unwrap(), json!(-12));
    }

    #[test]
    fn test_fractional_values() {
        assert_eq!(run(MultiplyOperation::new(0.5), json!(3)).unwrap(), json!(1.5));
        assert_eq!(run(MultiplyOperation::new(2.0), json!(1.25)).unwrap(), json!(2.5));
    }

    #[test]
    fn test_overflow_falls_back_to_float() {
        let result = run(MultiplyOperation::new(2.0), json!(i64::MAX)).unwrap();
        assert!(result.is_f64());
    }

    #[test]
    fn test_non_numeric_payload_fails() {
        let error = run(MultiplyOperation::default(), json!("seven")).unwrap_err();
        assert!(!error.is_transient());
        assert!(error.to_string().contains("multiply expects a finite number"));
    }
}
