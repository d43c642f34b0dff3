// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Error types for the engine bridge.
//!
//! This module defines the error taxonomy for every stage of a bridged
//! invocation: engine construction, input staging, the invocation itself,
//! and output extraction. All errors implement `std::error::Error` via the
//! `thiserror` crate.
//!
//! Cleanup failures deliberately have no variant here: the cleanup
//! coordinator is best-effort and swallows its own errors so they can never
//! mask the result of the invocation.

use thiserror::Error;

/// Error type for all bridge operations.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// A staged file value was not text, bytes, or a byte-convertible value.
    ///
    /// Raised before any staging side effect, aborting the request before
    /// the engine is ever invoked.
    #[error("unsupported input type for '{path}': expected text, bytes, or a byte-convertible value")]
    UnsupportedInputType { path: String },

    /// A virtual path named a host location outside the engine's private
    /// filesystem.
    ///
    /// Absolute paths and `..` components are rejected wherever a
    /// caller-supplied path is mapped onto the host, before any side effect.
    #[error("path '{path}' escapes the engine filesystem")]
    PathEscape { path: String },

    /// The engine's entry point returned a nonzero exit status.
    ///
    /// Raised after invocation; staged inputs are still cleaned up.
    #[error("engine exited with code {0}")]
    EngineExit(i32),

    /// Engine variant loading or instantiation failed. Fatal at `create()`
    /// time; no instance is returned.
    #[error("engine construction failed: {0}")]
    Construction(String),

    /// Engine asset validation error (size limits, binary encoding).
    #[error("invalid engine asset: {0}")]
    Validation(String),

    /// Host filesystem I/O error during staging.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Engine linear memory marshaling error.
    #[error("engine memory error: {0}")]
    Memory(String),

    /// Engine trap or other wasmtime execution failure.
    #[error("engine execution error: {0}")]
    Wasm(#[from] wasmtime::Error),
}

/// Result type alias for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors raised while loading bridge configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration content failed to parse as YAML.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
}
