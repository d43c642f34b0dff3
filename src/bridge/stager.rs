// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Filesystem staging
//!
//! Writes each input buffer into the engine's private filesystem before an
//! invocation. All paths and values are validated first so an unsupported
//! input type or an escaping path aborts the request with zero staging side
//! effects. Directory creation is idempotent and reports an explicit
//! tri-state outcome; only genuine errors propagate.

use crate::bridge::input::InputMap;
use crate::errors::{BridgeError, BridgeResult};
use crate::observability::messages::bridge::InputsStaged;
use std::borrow::Cow;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Outcome of an idempotent directory creation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DirOutcome {
    Created,
    AlreadyPresent,
}

/// Creates a directory and any missing parents. "Already exists" is not an
/// error.
pub fn ensure_dir(path: &Path) -> std::io::Result<DirOutcome> {
    if path.is_dir() {
        return Ok(DirOutcome::AlreadyPresent);
    }
    fs::create_dir_all(path)?;
    Ok(DirOutcome::Created)
}

/// Maps a virtual engine path onto the host directory backing the engine
/// filesystem.
///
/// Absolute paths and `..` components are rejected, so no caller-supplied
/// path can name a host location outside `root`.
pub fn resolve_virtual(root: &Path, path: &str) -> BridgeResult<PathBuf> {
    let contained = Path::new(path)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if !contained {
        return Err(BridgeError::PathEscape {
            path: path.to_string(),
        });
    }
    Ok(root.join(path))
}

/// Stages every input buffer under `root`, the engine's filesystem.
///
/// # Errors
/// * `BridgeError::UnsupportedInputType` - some value is not text, bytes,
///   or byte-convertible; raised before anything is written
/// * `BridgeError::PathEscape` - some path resolves outside `root`; raised
///   before anything is written
/// * `BridgeError::Io` - the host filesystem rejected a write
pub fn stage(root: &Path, files: &InputMap) -> BridgeResult<()> {
    // Validate everything up front; a bad path or value must not leave
    // earlier entries behind on the engine filesystem.
    let mut normalized: Vec<(PathBuf, Cow<'_, [u8]>)> = Vec::with_capacity(files.len());
    for (path, value) in files {
        let target = resolve_virtual(root, path)?;
        let bytes = value
            .as_bytes()
            .ok_or_else(|| BridgeError::UnsupportedInputType { path: path.clone() })?;
        normalized.push((target, bytes));
    }

    for (target, bytes) in &normalized {
        if let Some(parent) = target.parent() {
            ensure_dir(parent)?;
        }
        fs::write(target, bytes)?;
    }

    if !normalized.is_empty() {
        tracing::debug!(
            "{}",
            InputsStaged {
                count: normalized.len(),
            }
        );
    }
    Ok(())
}

/// Creates the missing parent directories of a declared output path so the
/// engine can open it, even when the path is nested.
pub fn prepare_output_parents(root: &Path, declared: &str) -> BridgeResult<()> {
    let target = resolve_virtual(root, declared)?;
    if let Some(parent) = target.parent() {
        ensure_dir(parent)?;
    }
    Ok(())
}
