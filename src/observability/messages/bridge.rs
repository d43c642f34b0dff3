// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for staging, invocation, extraction, and cleanup events.

use std::fmt::{Display, Formatter};

/// Input buffers written to the engine filesystem.
pub struct InputsStaged {
    pub count: usize,
}

impl Display for InputsStaged {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Staged {} input file(s)", self.count)
    }
}

/// Engine entry point returned.
pub struct InvocationFinished {
    pub status: i32,
    pub elapsed_ms: u64,
}

impl Display for InvocationFinished {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Engine invocation finished with status {} in {} ms",
            self.status, self.elapsed_ms
        )
    }
}

/// Artifact captured from one of the two retrieval channels.
pub struct ArtifactRecovered<'a> {
    pub source: &'a str,
    pub size_bytes: usize,
}

impl Display for ArtifactRecovered<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Recovered artifact from {} ({} bytes)",
            self.source, self.size_bytes
        )
    }
}

/// The declared output path could not be read; extraction falls back to the
/// direct buffer channel.
///
/// # Log Level
/// `debug!` - Expected on runs that only use the direct buffer
pub struct DeclaredOutputUnreadable<'a> {
    pub path: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for DeclaredOutputUnreadable<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Declared output '{}' unreadable ({}); falling back to direct buffer",
            self.path, self.error
        )
    }
}

/// A staged input path could not be removed during cleanup. Always
/// swallowed.
pub struct StagedPathRemovalFailed<'a> {
    pub path: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for StagedPathRemovalFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Failed to remove staged input '{}': {}",
            self.path, self.error
        )
    }
}

/// The engine rejected the output buffer release. Always swallowed.
pub struct OutputReleaseFailed<'a> {
    pub error: &'a str,
}

impl Display for OutputReleaseFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Failed to release engine output buffer: {}", self.error)
    }
}
