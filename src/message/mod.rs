// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message envelope, control signals and the items carried by pipeline queues.
//!
//! A [`Message`] is created once per logical input value by [`create_new_message`]
//! and then travels through the graph by ownership: each operation mutates it in
//! place and hands it back to the reply queue. The only time a message is cloned is
//! when the router fans it out to more than one downstream node, or when a single
//! input is broadcast to several entry nodes. Clones keep the original `id`, so a
//! traced journey can be followed across branches.
//!
//! # Sampling
//!
//! Every message carries a `traced` flag drawn with probability `sample_rate` when it
//! is created. Traced messages accumulate a [`TraceEntry`] per node they visit.
//!
//! ```
//! use cronicl::message::create_new_message;
//! use serde_json::json;
//!
//! let always = create_new_message(json!(21), 1.0);
//! assert!(always.traced);
//!
//! let never = create_new_message(json!(21), 0.0);
//! assert!(!never.traced);
//! ```

mod signal;

pub use signal::Signal;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::config::clamp_sample_rate;

/// One hop of a traced message's journey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub operation: String,
    pub at: DateTime<Utc>,
    /// Number of `execute` attempts the hop needed (1 when no retry happened).
    pub attempts: u32,
}

/// The envelope carried between pipeline nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub payload: Value,
    pub traced: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub trace: Vec<TraceEntry>,
}

impl Message {
    /// Record a visit to `operation`. Untraced messages are left untouched.
    pub fn record(&mut self, operation: &str, attempts: u32) {
        if !self.traced {
            return;
        }
        self.trace.push(TraceEntry {
            operation: operation.to_string(),
            at: Utc::now(),
            attempts,
        });
    }

    /// Names of the operations this message has visited, oldest first.
    pub fn journey(&self) -> Vec<&str> {
        self.trace.iter().map(|entry| entry.operation.as_str()).collect()
    }
}

/// Wrap `value` in a fresh message with its own sampling decision.
///
/// `sample_rate` is clamped to [0, 1] before drawing; NaN counts as 0.
pub fn create_new_message(value: impl Into<Value>, sample_rate: f64) -> Message {
    let rate = clamp_sample_rate(sample_rate);
    let traced = rate > 0.0 && rand::thread_rng().gen_bool(rate);
    Message {
        id: Uuid::new_v4(),
        payload: value.into(),
        traced,
        created_at: Utc::now(),
        trace: Vec::new(),
    }
}

/// Item on a node's input queue.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Data(Message),
    Signal(Signal),
}

/// Item on the shared reply queue.
///
/// `respondent` is the operation name of the node that just finished with the message.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Data { respondent: String, message: Message },
    Signal(Signal),
}
