// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod cleanup;
pub mod extract;
pub mod input;
pub mod instance;
pub mod marshal;
pub mod stager;


pub use input::{InputMap, InputValue};
pub use instance::{Instance, InstanceOptions, RunOptions, RunResult};

pub use crate::engine::{ProgressEvent, ProgressSink, StreamSink};
