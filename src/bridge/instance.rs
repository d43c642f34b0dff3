// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Bridge instance: the host-facing API
//!
//! An [`Instance`] wraps exactly one [`EngineHandle`] and drives the
//! per-call sequence: stage inputs, resolve the declared output path,
//! invoke, extract, clean up. Cleanup always runs after extraction,
//! regardless of the invocation's outcome.
//!
//! `run` takes `&mut self`: the engine handle and its private filesystem
//! are not safe for concurrent invocations, and the bridge adds no internal
//! serialization. Callers needing concurrency construct one instance per
//! concurrent job.

use crate::bridge::input::InputMap;
use crate::bridge::{cleanup, extract, marshal, stager};
use crate::engine::{EngineHandle, EngineVariant, ProgressSink, StreamSink};
use crate::errors::{BridgeError, BridgeResult};
use crate::observability::messages::bridge::{ArtifactRecovered, InvocationFinished};
use crate::observability::messages::engine::VariantSelected;
use std::path::PathBuf;
use std::time::Instant;

/// Default engine memory ceiling (2 GB).
pub const DEFAULT_MEMORY_CEILING_BYTES: u64 = 2 * 1024 * 1024 * 1024;

/// Options for [`Instance::create`].
pub struct InstanceOptions {
    /// Use the parallel-capable engine build when the host supports it.
    pub enable_parallel: bool,
    /// Engine memory ceiling in bytes.
    pub memory_ceiling_bytes: u64,
    /// Directory holding the versioned engine build assets.
    pub asset_dir: PathBuf,
    /// Subscriber for engine stdout lines; defaults to console logging.
    pub on_stdout: Option<StreamSink>,
    /// Subscriber for engine stderr lines; defaults to console logging.
    pub on_stderr: Option<StreamSink>,
}

impl Default for InstanceOptions {
    fn default() -> Self {
        Self {
            enable_parallel: true,
            memory_ceiling_bytes: DEFAULT_MEMORY_CEILING_BYTES,
            asset_dir: PathBuf::from("assets"),
            on_stdout: None,
            on_stderr: None,
        }
    }
}

/// Per-call options for [`Instance::run`].
#[derive(Default)]
pub struct RunOptions {
    /// Subscriber for progress events emitted during this invocation.
    pub on_progress: Option<ProgressSink>,
}

/// Result of one successful invocation.
///
/// `output_size` always equals the artifact length when one is present and
/// 0 otherwise. An absent artifact means both the declared output path and
/// the fallback buffer yielded nothing; that is a valid outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub artifact: Option<Vec<u8>>,
    pub output_size: usize,
}

/// One live bridge over one engine build.
pub struct Instance {
    handle: EngineHandle,
}

impl Instance {
    /// Selects an engine build, loads it, and constructs the bridge.
    ///
    /// # Errors
    /// `BridgeError::Construction` / `BridgeError::Validation` when the
    /// engine asset cannot be loaded or instantiated; no instance results.
    pub async fn create(options: InstanceOptions) -> BridgeResult<Self> {
        let variant = EngineVariant::select(options.enable_parallel);
        tracing::info!(
            "{}",
            VariantSelected {
                variant: variant.as_str(),
                parallel_requested: options.enable_parallel,
            }
        );

        let handle = EngineHandle::construct(
            variant,
            &options.asset_dir,
            options.memory_ceiling_bytes,
            options.on_stdout,
            options.on_stderr,
        )
        .await?;

        Ok(Self { handle })
    }

    /// Which engine build this instance runs.
    pub fn variant(&self) -> EngineVariant {
        self.handle.variant()
    }

    /// Runs the engine with CLI-style arguments and named input buffers.
    ///
    /// The argument sequence is forwarded to the engine verbatim; only the
    /// four output-flag forms are interpreted, and only to route
    /// extraction. Staged inputs never outlive the call, whether it
    /// fulfills or rejects.
    ///
    /// # Errors
    /// * `BridgeError::UnsupportedInputType` - before any invocation
    /// * `BridgeError::PathEscape` - an input or output path resolved
    ///   outside the engine filesystem; before any invocation
    /// * `BridgeError::EngineExit` - the engine returned a nonzero status
    /// * `BridgeError::Wasm` - the engine trapped
    pub async fn run(
        &mut self,
        args: &[String],
        files: InputMap,
        options: RunOptions,
    ) -> BridgeResult<RunResult> {
        let staged: Vec<String> = files.keys().cloned().collect();

        let outcome = self.drive(args, &files, options).await;

        // Unconditional hygiene; never masks the outcome above.
        cleanup::sweep(&mut self.handle, &staged).await;
        self.handle.flush_streams();

        outcome
    }

    async fn drive(
        &mut self,
        args: &[String],
        files: &InputMap,
        options: RunOptions,
    ) -> BridgeResult<RunResult> {
        stager::stage(self.handle.root(), files)?;

        let declared = marshal::resolve_output_path(args).filter(|path| !path.is_empty());
        if let Some(path) = declared.as_deref() {
            stager::prepare_output_parents(self.handle.root(), path)?;
        }

        let started = Instant::now();
        let status = self.handle.invoke(args, options.on_progress).await?;
        tracing::debug!(
            "{}",
            InvocationFinished {
                status,
                elapsed_ms: started.elapsed().as_millis() as u64,
            }
        );

        if status != 0 {
            return Err(BridgeError::EngineExit(status));
        }

        let (artifact, source) = match declared.as_deref() {
            Some(path) => match extract::read_declared(self.handle.root(), path) {
                Some(bytes) => (Some(bytes), "declared path"),
                None => (self.handle.copy_output().await?, "direct buffer"),
            },
            None => (self.handle.copy_output().await?, "direct buffer"),
        };

        if let Some(bytes) = artifact.as_ref() {
            tracing::debug!(
                "{}",
                ArtifactRecovered {
                    source,
                    size_bytes: bytes.len(),
                }
            );
        }

        Ok(extract::into_result(artifact))
    }

    /// Releases the engine's output buffer.
    ///
    /// The engine handle and its filesystem stay alive; further `run` calls
    /// on this instance remain valid. Releasing when no buffer remains is a
    /// no-op.
    pub async fn dispose(&mut self) {
        self.handle.release_output().await;
    }

    #[cfg(test)]
    pub(crate) fn engine_root(&self) -> &std::path::Path {
        self.handle.root()
    }
}
