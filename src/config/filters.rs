// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Declarative edge filters for pipelines loaded from YAML.
//!
//! ```yaml
//! edges:
//!   - from: entry
//!     to: positives
//!     filter: { op: gt, value: 0 }
//!   - from: entry
//!     to: urgent
//!     filter: { field: "order.priority", op: eq, value: "high" }
//! ```

use std::cmp::Ordering;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::config::Filter;
use crate::message::Message;

/// Comparison applied by a [`FilterConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Truthy,
    Exists,
}

/// A filter over a message payload, optionally narrowed to a dotted `field` path.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub field: Option<String>,
    pub op: FilterOp,
    #[serde(default)]
    pub value: Option<Value>,
}

impl FilterConfig {
    pub fn matches(&self, payload: &Value) -> bool {
        let selected = match &self.field {
            Some(path) => select(payload, path),
            None => Some(payload),
        };
        let Some(actual) = selected else {
            return false;
        };
        let expected = self.value.as_ref().unwrap_or(&Value::Null);

        match self.op {
            FilterOp::Exists => true,
            FilterOp::Truthy => is_truthy(actual),
            FilterOp::Eq => loosely_equal(actual, expected),
            FilterOp::Ne => !loosely_equal(actual, expected),
            FilterOp::Gt => compare(actual, expected) == Some(Ordering::Greater),
            FilterOp::Gte => matches!(
                compare(actual, expected),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOp::Lt => compare(actual, expected) == Some(Ordering::Less),
            FilterOp::Lte => matches!(
                compare(actual, expected),
                Some(Ordering::Less | Ordering::Equal)
            ),
        }
    }

    pub fn into_filter(self) -> Filter {
        Arc::new(move |message: &Message| self.matches(&message.payload))
    }
}

/// Truthiness of a payload: null, false, zero and empty containers are false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

fn select<'a>(payload: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(payload, |current, segment| match current {
            Value::Object(fields) => fields.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

fn loosely_equal(actual: &Value, expected: &Value) -> bool {
    match (actual.as_f64(), expected.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => actual == expected,
    }
}

fn compare(actual: &Value, expected: &Value) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (actual.as_f64(), expected.as_f64()) {
        return a.partial_cmp(&b);
    }
    match (actual, expected) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}
