// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod factory;
pub mod operations;

pub use factory::LocalOperationFactory;
pub use operations::*;
