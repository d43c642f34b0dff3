// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod bridge;     // staging, marshaling, extraction, cleanup, host API
pub mod config;     // engine configuration loading
pub mod engine;     // capability detection, variant selection, wasmtime handle
pub mod errors;     // error handling
pub mod observability;
