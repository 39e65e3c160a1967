// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod change_text_case;
pub mod collector;
pub mod counter;
pub mod multiply;
pub mod pass_through;

pub use change_text_case::{ChangeTextCaseOperation, TextCase};
pub use collector::CollectorOperation;
pub use counter::CounterOperation;
pub use multiply::MultiplyOperation;
pub use pass_through::PassThroughOperation;
