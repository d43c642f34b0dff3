// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Output extraction
//!
//! Retrieval is an explicit two-step lookup with defined precedence: the
//! declared output path on the engine filesystem is tried first, and the
//! engine's direct output buffer is the fallback. Finding nothing at all is
//! a valid (empty) result, not an error.

use crate::bridge::instance::RunResult;
use crate::bridge::stager;
use crate::observability::messages::bridge::DeclaredOutputUnreadable;
use std::fs;
use std::path::Path;

/// Reads the artifact from the declared output path, deleting the path on
/// success. Any read failure logs and yields `None` so the caller falls
/// back to the direct buffer channel. A declared path that escapes the
/// engine filesystem is never touched on the host side.
pub fn read_declared(root: &Path, declared: &str) -> Option<Vec<u8>> {
    let path = match stager::resolve_virtual(root, declared) {
        Ok(path) => path,
        Err(error) => {
            tracing::debug!(
                "{}",
                DeclaredOutputUnreadable {
                    path: declared,
                    error: &error,
                }
            );
            return None;
        }
    };
    match fs::read(&path) {
        Ok(bytes) => {
            // Best effort; the artifact is already captured.
            let _ = fs::remove_file(&path);
            Some(bytes)
        }
        Err(error) => {
            tracing::debug!(
                "{}",
                DeclaredOutputUnreadable {
                    path: declared,
                    error: &error,
                }
            );
            None
        }
    }
}

/// Wraps an optional artifact into a [`RunResult`], maintaining the size
/// invariant.
pub fn into_result(artifact: Option<Vec<u8>>) -> RunResult {
    let output_size = artifact.as_ref().map_or(0, Vec::len);
    RunResult {
        artifact,
        output_size,
    }
}
