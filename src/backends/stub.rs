// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;

use crossbeam_channel::{Receiver, Sender};
use serde_json::Value;

use crate::errors::OperationError;
use crate::message::{create_new_message, Message, Signal};
use crate::traits::{InitConfig, Operation, OperationContext, Outcome};

/// Forwards every message unchanged.
pub struct StubOperation {
    pub id: String,
}

impl StubOperation {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl Operation for StubOperation {
    fn execute(&self, _message: &mut Message) -> Result<Outcome, OperationError> {
        Ok(Outcome::Forward)
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// Fails every `execute`, or fails `init` when built with [`FailingOperation::on_init`].
pub struct FailingOperation {
    fail_init: bool,
}

impl FailingOperation {
    pub fn new() -> Self {
        Self { fail_init: false }
    }

    pub fn on_init() -> Self {
        Self { fail_init: true }
    }
}

impl Operation for FailingOperation {
    fn execute(&self, _message: &mut Message) -> Result<Outcome, OperationError> {
        Err(OperationError::failed("always fails"))
    }

    fn name(&self) -> &'static str {
        "failing"
    }

    fn init(&self, _config: &InitConfig) -> Result<(), OperationError> {
        if self.fail_init {
            return Err(OperationError::failed("init refused"));
        }
        Ok(())
    }
}

/// Returns a transient error for the first `failures` calls, then forwards.
pub struct FlakyOperation {
    remaining: AtomicU32,
}

impl FlakyOperation {
    pub fn new(failures: u32) -> Self {
        Self {
            remaining: AtomicU32::new(failures),
        }
    }
}

impl Operation for FlakyOperation {
    fn execute(&self, _message: &mut Message) -> Result<Outcome, OperationError> {
        let failed = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(OperationError::transient("not yet"));
        }
        Ok(Outcome::Forward)
    }

    fn name(&self) -> &'static str {
        "flaky"
    }
}

/// Sink that records every payload and every lifecycle call.
///
/// A payload of `"panic"` makes `execute` panic. EMIT publishes the recorded payloads
/// as an array; RESET forgets them.
#[derive(Default)]
pub struct RecordingOperation {
    received: Mutex<Vec<Value>>,
    journeys: Mutex<Vec<Vec<String>>>,
    init_config: Mutex<Option<InitConfig>>,
    init_calls: AtomicUsize,
    close_calls: AtomicUsize,
}

impl RecordingOperation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn received(&self) -> Vec<Value> {
        self.received.lock().unwrap().clone()
    }

    /// The operations each received message had visited before arriving here.
    pub fn journeys(&self) -> Vec<Vec<String>> {
        self.journeys.lock().unwrap().clone()
    }

    pub fn init_calls(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }

    pub fn init_config(&self) -> Option<InitConfig> {
        self.init_config.lock().unwrap().clone()
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }
}

impl Operation for RecordingOperation {
    fn execute(&self, message: &mut Message) -> Result<Outcome, OperationError> {
        if message.payload == Value::from("panic") {
            panic!("asked to panic");
        }
        self.received.lock().unwrap().push(message.payload.clone());
        self.journeys
            .lock()
            .unwrap()
            .push(message.journey().into_iter().map(String::from).collect());
        Ok(Outcome::Consume)
    }

    fn name(&self) -> &'static str {
        "recording"
    }

    fn init(&self, config: &InitConfig) -> Result<(), OperationError> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        *self.init_config.lock().unwrap() = Some(config.clone());
        Ok(())
    }

    fn signal(
        &self,
        signal: Signal,
        context: &OperationContext,
    ) -> Result<Option<Message>, OperationError> {
        let mut received = self.received.lock().unwrap();
        match signal {
            Signal::Emit => Ok(Some(create_new_message(
                Value::Array(received.clone()),
                context.settings.sample_rate,
            ))),
            Signal::Reset => {
                received.clear();
                Ok(None)
            }
            Signal::Terminate => Ok(None),
        }
    }

    fn close(&self) {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn read_sensor(&self) -> Option<Value> {
        Some(Value::from(self.received.lock().unwrap().len()))
    }
}

/// Holds every message in `execute` until its gate is released.
pub struct GatedOperation {
    gate: Receiver<()>,
}

impl GatedOperation {
    /// The operation and the sender that opens it; dropping the sender opens it for good.
    pub fn new() -> (Self, Sender<()>) {
        let (sender, gate) = crossbeam_channel::unbounded();
        (Self { gate }, sender)
    }
}

impl Operation for GatedOperation {
    fn execute(&self, _message: &mut Message) -> Result<Outcome, OperationError> {
        let _ = self.gate.recv();
        Ok(Outcome::Forward)
    }

    fn name(&self) -> &'static str {
        "gated"
    }
}
