// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::fmt;

/// Control sentinel placed on a queue alongside ordinary messages.
///
/// Signals never carry payload data and are compared by value, so they can be
/// serialized or logged like any other enum.
///
/// * `Terminate` - stops the worker or reply handler that receives it
/// * `Emit` - asks a collector-style operation to publish what it has buffered
/// * `Reset` - asks a collector-style operation to discard its buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Terminate,
    Emit,
    Reset,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Signal::Terminate => "TERMINATE",
            Signal::Emit => "EMIT",
            Signal::Reset => "RESET",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signals_compare_by_value() {
        assert_eq!(Signal::Terminate, Signal::Terminate);
        assert_ne!(Signal::Emit, Signal::Reset);
    }

    #[test]
    fn test_signal_serializes_as_tag() {
        let json = serde_json::to_string(&Signal::Emit).unwrap();
        assert_eq!(json, "\"emit\"");
        let back: Signal = serde_json::from_str("\"terminate\"").unwrap();
        assert_eq!(back, Signal::Terminate);
    }

    #[test]
    fn test_signal_display() {
        assert_eq!(Signal::Reset.to_string(), "RESET");
    }
}
