// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod capability;
pub mod handle;
pub mod loader;
pub mod variant;

pub use handle::{EngineHandle, ProgressEvent, ProgressSink, StreamSink};
pub use variant::{EngineVariant, ASSET_VERSION};
