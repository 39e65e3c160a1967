// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::{Mutex, PoisonError};

use serde_json::Value;

use crate::errors::OperationError;
use crate::message::{create_new_message, Message, Signal};
use crate::traits::{Operation, OperationContext, Outcome};

/// Buffers payloads until told to emit them.
///
/// * data - the payload is buffered and the message consumed
/// * EMIT - the buffer is published as one array message and cleared; an empty
///   buffer publishes nothing
/// * RESET - the buffer is cleared
///
/// The sensor reports how many payloads are buffered.
#[derive(Debug, Default)]
pub struct CollectorOperation {
    buffer: Mutex<Vec<Value>>,
}

impl CollectorOperation {
    pub fn new() -> Self {
        Self::default()
    }

    fn buffer(&self) -> std::sync::MutexGuard<'_, Vec<Value>> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Operation for CollectorOperation {
    fn execute(&self, message: &mut Message) -> Result<Outcome, OperationError> {
        self.buffer().push(message.payload.take());
        Ok(Outcome::Consume)
    }

    fn name(&self) -> &'static str {
        "collector"
    }

    fn signal(
        &self,
        signal: Signal,
        context: &OperationContext,
    ) -> Result<Option<Message>, OperationError> {
        match signal {
            Signal::Emit => {
                let collected = std::mem::take(&mut *self.buffer());
                if collected.is_empty() {
                    return Ok(None);
                }
                Ok(Some(create_new_message(
                    Value::Array(collected),
                    context.settings.sample_rate,
                )))
            }
            Signal::Reset => {
                self.buffer().clear();
                Ok(None)
            }
            Signal::Terminate => Ok(None),
        }
    }

    fn read_sensor(&self) -> Option<Value> {
        Some(Value::from(self.buffer().len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NodeSettings;
    use serde_json::json;

    fn context() -> OperationContext {
        OperationContext {
            operation_name: "collect".to_string(),
            settings: NodeSettings::clamped(0.0, 0, 1),
        }
    }

    fn feed(collector: &CollectorOperation, values: &[Value]) {
        for value in values {
            let mut message = create_new_message(value.clone(), 0.0);
            assert_eq!(collector.execute(&mut message).unwrap(), Outcome::Consume);
        }
    }

    #[test]
    fn test_emit_publishes_and_clears() {
        let collector = CollectorOperation::new();
        feed(&collector, &[json!(1), json!("two"), json!({"three": 3})]);
        assert_eq!(collector.read_sensor(), Some(json!(3)));

        let emitted = collector.signal(Signal::Emit, &context()).unwrap().unwrap();
        assert_eq!(emitted.payload, json!([1, "two", {"three": 3}]));
        assert_eq!(collector.read_sensor(), Some(json!(0)));
    }

    #[test]
    fn test_reset_discards_buffer() {
        let collector = CollectorOperation::new();
        feed(&collector, &[json!(1), json!(2)]);

        assert!(collector.signal(Signal::Reset, &context()).unwrap().is_none());
        assert!(collector.signal(Signal::Emit, &context()).unwrap().is_none());
    }

    #[test]
    fn test_emit_on_empty_buffer_publishes_nothing() {
        let collector = CollectorOperation::new();
        assert!(collector.signal(Signal::Emit, &context()).unwrap().is_none());
    }
}
