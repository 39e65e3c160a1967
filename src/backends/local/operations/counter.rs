// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;

use crate::errors::OperationError;
use crate::message::{Message, Signal};
use crate::traits::{Operation, OperationContext, Outcome};

/// Counts the messages passing through and forwards them. RESET zeroes the count.
#[derive(Debug, Default)]
pub struct CounterOperation {
    count: AtomicU64,
}

impl CounterOperation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

impl Operation for CounterOperation {
    fn execute(&self, _message: &mut Message) -> Result<Outcome, OperationError> {
        self.count.fetch_add(1, Ordering::Relaxed);
        Ok(Outcome::Forward)
    }

    fn name(&self) -> &'static str {
        "counter"
    }

    fn signal(
        &self,
        signal: Signal,
        _context: &OperationContext,
    ) -> Result<Option<Message>, OperationError> {
        if signal == Signal::Reset {
            self.count.store(0, Ordering::Relaxed);
        }
        Ok(None)
    }

    fn read_sensor(&self) -> Option<Value> {
        Some(Value::from(self.count()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NodeSettings;
    use crate::message::create_new_message;
    use serde_json::json;

    #[test]
    fn test_counts_and_resets() {
        let counter = CounterOperation::new();
        for i in 0..4 {
            let mut message = create_new_message(json!(i), 0.0);
            assert_eq!(counter.execute(&mut message).unwrap(), Outcome::Forward);
        }
        assert_eq!(counter.read_sensor(), Some(json!(4)));

        let context = OperationContext {
            operation_name: "count".to_string(),
            settings: NodeSettings::clamped(0.0, 0, 1),
        };
        counter.signal(Signal::Reset, &context).unwrap();
        assert_eq!(counter.count(), 0);
    }
}
