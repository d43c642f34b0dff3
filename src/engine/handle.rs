// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Engine handle: one live instance of a selected engine build
//!
//! An [`EngineHandle`] owns a wasmtime store and instance over the loaded
//! engine module, the typed entry points of the engine ABI, and a private
//! temp directory preopened into the engine's WASI context as its virtual
//! filesystem. The handle is exclusively owned by one bridge instance and
//! is not safe for concurrent invocations; callers serialize through
//! `&mut self`.
//!
//! ## Engine ABI
//! The pre-built engine binary must export:
//! - `memory` - linear memory
//! - `allocate(size: i32) -> i32` - engine-side allocator
//! - `run_args(ptr: i32, len: i32) -> i32` - entry point; takes one
//!   newline-joined argument string, returns an exit status
//! - `output_ptr() -> i32` / `output_len() -> i32` - direct buffer of the
//!   last produced artifact (length 0 when none)
//! - `free_output()` - releases the output buffer; idempotent
//!
//! It may import `env.report_progress` and WASI preview-1 functions, and
//! may export a reactor-style `_initialize` which is called once after
//! instantiation.

use crate::engine::loader;
use crate::engine::variant::EngineVariant;
use crate::errors::{BridgeError, BridgeResult};
use std::path::Path;
use tempfile::TempDir;
use wasmtime::{
    Caller, Config, Engine, Extern, Linker, Memory, Module, Store, StoreLimits,
    StoreLimitsBuilder, TypedFunc, WasmParams, WasmResults,
};
use wasmtime_wasi::p1::{self, WasiP1Ctx};
use wasmtime_wasi::p2::pipe::MemoryOutputPipe;
use wasmtime_wasi::{DirPerms, FilePerms, WasiCtxBuilder};

/// Capacity of each captured output stream (8 MB).
///
/// The pipes are drained at invocation boundaries, not during a call, so
/// this caps what one invocation can emit on stdout or stderr; once full,
/// further engine writes to that stream fail inside the sandbox with an
/// I/O error.
const STREAM_CAPACITY: usize = 8 * 1024 * 1024;

/// A progress report emitted by the engine during one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    pub phase: String,
    /// Percent complete, clamped to `[0, 100]`.
    pub percent: f64,
    pub message: String,
}

/// Subscriber for progress events, installed per invocation.
pub type ProgressSink = Box<dyn Fn(ProgressEvent) + Send + Sync>;

/// Subscriber for one line of engine stdout or stderr.
pub type StreamSink = Box<dyn Fn(&str) + Send + Sync>;

/// Store data threaded through host calls.
///
/// The progress slot is set immediately before an invocation and cleared
/// unconditionally after it, so no subscriber state survives across calls.
struct HostState {
    wasi: WasiP1Ctx,
    limits: StoreLimits,
    progress: Option<ProgressSink>,
}

/// One live instance of the selected engine build.
pub struct EngineHandle {
    variant: EngineVariant,
    store: Store<HostState>,
    memory: Memory,
    allocate: TypedFunc<i32, i32>,
    run_args: TypedFunc<(i32, i32), i32>,
    output_ptr: TypedFunc<(), i32>,
    output_len: TypedFunc<(), i32>,
    free_output: TypedFunc<(), ()>,
    root: TempDir,
    stdout_pipe: MemoryOutputPipe,
    stdout_cursor: usize,
    stdout_sink: StreamSink,
    stderr_pipe: MemoryOutputPipe,
    stderr_cursor: usize,
    stderr_sink: StreamSink,
}

impl EngineHandle {
    /// Loads the given engine build and instantiates it.
    ///
    /// Applies the memory ceiling, preopens a fresh private filesystem,
    /// wires stdout/stderr to the supplied sinks (default: console logging
    /// via `tracing`), and resolves the engine ABI entry points. Any failure
    /// is fatal and surfaced as `BridgeError::Construction`.
    pub async fn construct(
        variant: EngineVariant,
        asset_dir: &Path,
        memory_ceiling_bytes: u64,
        on_stdout: Option<StreamSink>,
        on_stderr: Option<StreamSink>,
    ) -> BridgeResult<Self> {
        let asset_path = asset_dir.join(variant.asset_file());
        let engine_bytes = loader::load_engine_bytes(&asset_path)?;

        let mut config = Config::new();
        config.async_support(true);
        config.wasm_threads(variant.is_parallel());
        let engine = Engine::new(&config)
            .map_err(|e| BridgeError::Construction(format!("engine configuration rejected: {e}")))?;
        let module = Module::new(&engine, &engine_bytes)
            .map_err(|e| BridgeError::Construction(format!("engine build failed to compile: {e}")))?;

        let root = tempfile::tempdir().map_err(|e| {
            BridgeError::Construction(format!("failed to create engine filesystem: {e}"))
        })?;

        let stdout_pipe = MemoryOutputPipe::new(STREAM_CAPACITY);
        let stderr_pipe = MemoryOutputPipe::new(STREAM_CAPACITY);
        let mut wasi_builder = WasiCtxBuilder::new();
        wasi_builder
            .stdout(stdout_pipe.clone())
            .stderr(stderr_pipe.clone());
        wasi_builder
            .preopened_dir(root.path(), ".", DirPerms::all(), FilePerms::all())
            .map_err(|e| {
                BridgeError::Construction(format!("failed to preopen engine filesystem: {e}"))
            })?;
        let wasi = wasi_builder.build_p1();

        let limits = StoreLimitsBuilder::new()
            .memory_size(memory_ceiling_bytes as usize)
            .build();
        let mut store = Store::new(
            &engine,
            HostState {
                wasi,
                limits,
                progress: None,
            },
        );
        store.limiter(|state| &mut state.limits);

        let mut linker: Linker<HostState> = Linker::new(&engine);
        p1::add_to_linker_async(&mut linker, |state: &mut HostState| &mut state.wasi)
            .map_err(|e| BridgeError::Construction(format!("failed to link WASI: {e}")))?;
        Self::link_progress(&mut linker)?;

        let instance = linker
            .instantiate_async(&mut store, &module)
            .await
            .map_err(|e| BridgeError::Construction(format!("engine instantiation failed: {e}")))?;

        let memory = instance
            .get_memory(&mut store, "memory")
            .ok_or_else(|| BridgeError::Construction("engine build must export 'memory'".to_string()))?;
        let allocate = Self::entry_point(&instance, &mut store, "allocate")?;
        let run_args = Self::entry_point(&instance, &mut store, "run_args")?;
        let output_ptr = Self::entry_point(&instance, &mut store, "output_ptr")?;
        let output_len = Self::entry_point(&instance, &mut store, "output_len")?;
        let free_output = Self::entry_point(&instance, &mut store, "free_output")?;

        // Reactor-style builds run their constructors from _initialize.
        if let Ok(init) = instance.get_typed_func::<(), ()>(&mut store, "_initialize") {
            init.call_async(&mut store, ())
                .await
                .map_err(|e| BridgeError::Construction(format!("engine _initialize failed: {e}")))?;
        }

        let default_stdout: StreamSink =
            Box::new(|line: &str| tracing::info!(target: "tilebridge::engine", "{}", line));
        let default_stderr: StreamSink =
            Box::new(|line: &str| tracing::warn!(target: "tilebridge::engine", "{}", line));

        let mut handle = Self {
            variant,
            store,
            memory,
            allocate,
            run_args,
            output_ptr,
            output_len,
            free_output,
            root,
            stdout_pipe,
            stdout_cursor: 0,
            stdout_sink: on_stdout.unwrap_or(default_stdout),
            stderr_pipe,
            stderr_cursor: 0,
            stderr_sink: on_stderr.unwrap_or(default_stderr),
        };
        handle.flush_streams();
        Ok(handle)
    }

    /// Which build this handle runs.
    pub fn variant(&self) -> EngineVariant {
        self.variant
    }

    /// Root of the engine's private filesystem on the host side.
    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Invokes the engine entry point with the given argument sequence.
    ///
    /// The arguments are joined into a single newline-delimited string; the
    /// engine's call boundary accepts one string, not a list. The progress
    /// sink, when given, is installed for the duration of this call only.
    ///
    /// Returns the engine's integer exit status. Status interpretation is
    /// the caller's job; a trap is surfaced as `BridgeError::Wasm`.
    pub async fn invoke(
        &mut self,
        args: &[String],
        progress: Option<ProgressSink>,
    ) -> BridgeResult<i32> {
        self.store.data_mut().progress = progress;
        let outcome = self.call_run_args(&args.join("\n")).await;
        self.store.data_mut().progress = None;
        outcome
    }

    async fn call_run_args(&mut self, blob: &str) -> BridgeResult<i32> {
        let len = blob.len() as i32;
        let ptr = self.allocate.call_async(&mut self.store, len).await?;
        if ptr == 0 {
            return Err(BridgeError::Memory(
                "engine allocator returned a null pointer".to_string(),
            ));
        }
        self.memory
            .write(&mut self.store, ptr as usize, blob.as_bytes())
            .map_err(|e| BridgeError::Memory(format!("failed to write arguments: {e}")))?;

        let status = self.run_args.call_async(&mut self.store, (ptr, len)).await?;
        Ok(status)
    }

    /// Copies the engine's last-produced output buffer out of linear memory.
    ///
    /// This is the secondary output channel, independent of the engine
    /// filesystem. Returns `None` when the buffer is empty.
    pub async fn copy_output(&mut self) -> BridgeResult<Option<Vec<u8>>> {
        let len = self.output_len.call_async(&mut self.store, ()).await?;
        if len <= 0 {
            return Ok(None);
        }
        let ptr = self.output_ptr.call_async(&mut self.store, ()).await?;

        let mut buffer = vec![0u8; len as usize];
        self.memory
            .read(&self.store, ptr as usize, &mut buffer)
            .map_err(|e| BridgeError::Memory(format!("failed to read output buffer: {e}")))?;
        Ok(Some(buffer))
    }

    /// Asks the engine to release its output buffer. Idempotent; failures
    /// are logged and swallowed.
    pub async fn release_output(&mut self) {
        use crate::observability::messages::bridge::OutputReleaseFailed;

        if let Err(e) = self.free_output.call_async(&mut self.store, ()).await {
            tracing::debug!(
                "{}",
                OutputReleaseFailed {
                    error: &e.to_string(),
                }
            );
        }
    }

    /// Forwards any newly captured complete stdout/stderr lines to the
    /// sinks. A trailing partial line stays buffered until its newline
    /// arrives, so a line split across two flushes reaches the sink once.
    pub fn flush_streams(&mut self) {
        Self::drain(&self.stdout_pipe, &mut self.stdout_cursor, &self.stdout_sink);
        Self::drain(&self.stderr_pipe, &mut self.stderr_cursor, &self.stderr_sink);
    }

    fn drain(pipe: &MemoryOutputPipe, cursor: &mut usize, sink: &StreamSink) {
        let contents = pipe.contents();
        if contents.len() <= *cursor {
            return;
        }
        *cursor += emit_complete_lines(&contents[*cursor..], sink);
    }

    fn entry_point<Params, Results>(
        instance: &wasmtime::Instance,
        store: &mut Store<HostState>,
        name: &str,
    ) -> BridgeResult<TypedFunc<Params, Results>>
    where
        Params: WasmParams,
        Results: WasmResults,
    {
        instance
            .get_typed_func::<Params, Results>(&mut *store, name)
            .map_err(|_| BridgeError::Construction(format!("engine build must export '{name}'")))
    }

    /// Installs the `env.report_progress` host function.
    ///
    /// The engine's raw (phase, percent, message) callback is translated
    /// into a [`ProgressEvent`] and delivered to the per-call subscriber,
    /// if one is installed.
    fn link_progress(linker: &mut Linker<HostState>) -> BridgeResult<()> {
        linker
            .func_wrap(
                "env",
                "report_progress",
                |mut caller: Caller<'_, HostState>,
                 phase_ptr: i32,
                 phase_len: i32,
                 percent: f64,
                 msg_ptr: i32,
                 msg_len: i32| {
                    let memory = match caller.get_export("memory") {
                        Some(Extern::Memory(memory)) => memory,
                        _ => return,
                    };
                    let (phase, message) = {
                        let data = memory.data(&caller);
                        (
                            read_lossy(data, phase_ptr, phase_len),
                            read_lossy(data, msg_ptr, msg_len),
                        )
                    };
                    let event = ProgressEvent {
                        phase,
                        percent: percent.clamp(0.0, 100.0),
                        message,
                    };
                    if let Some(sink) = caller.data().progress.as_deref() {
                        sink(event);
                    }
                },
            )
            .map_err(|e| {
                BridgeError::Construction(format!("failed to install progress hook: {e}"))
            })?;
        Ok(())
    }
}

/// Emits the complete lines in `fresh` to the sink and returns the number
/// of bytes consumed. Bytes after the last newline are not consumed; they
/// belong to a line still being written.
fn emit_complete_lines(fresh: &[u8], sink: &StreamSink) -> usize {
    let Some(last_newline) = fresh.iter().rposition(|&b| b == b'\n') else {
        return 0;
    };
    for line in String::from_utf8_lossy(&fresh[..=last_newline]).lines() {
        if !line.is_empty() {
            sink(line);
        }
    }
    last_newline + 1
}

/// Reads a lossy UTF-8 string out of engine memory; out-of-bounds ranges
/// yield an empty string rather than a trap.
fn read_lossy(data: &[u8], ptr: i32, len: i32) -> String {
    let start = ptr.max(0) as usize;
    let end = start.saturating_add(len.max(0) as usize);
    match data.get(start..end) {
        Some(slice) => String::from_utf8_lossy(slice).into_owned(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_construct_fails_without_asset() {
        let empty_dir = tempfile::tempdir().unwrap();
        let result = EngineHandle::construct(
            EngineVariant::SingleThread,
            empty_dir.path(),
            2 * 1024 * 1024 * 1024,
            None,
            None,
        )
        .await;

        assert!(matches!(result, Err(BridgeError::Construction(_))));
    }

    #[tokio::test]
    async fn test_construct_rejects_module_without_engine_exports() {
        let dir = tempfile::tempdir().unwrap();
        let wasm = wat::parse_str("(module (memory (export \"memory\") 1))").unwrap();
        std::fs::write(
            dir.path().join(EngineVariant::SingleThread.asset_file()),
            &wasm,
        )
        .unwrap();

        let result = EngineHandle::construct(
            EngineVariant::SingleThread,
            dir.path(),
            64 * 1024 * 1024,
            None,
            None,
        )
        .await;

        if let Err(BridgeError::Construction(msg)) = result {
            assert!(msg.contains("must export"));
        } else {
            panic!("Expected Construction error for ABI-incomplete module");
        }
    }

    #[test]
    fn test_emit_complete_lines_holds_back_partial() {
        use std::sync::{Arc, Mutex};

        let captured = Arc::new(Mutex::new(Vec::new()));
        let sink: StreamSink = {
            let captured = captured.clone();
            Box::new(move |line: &str| captured.lock().unwrap().push(line.to_string()))
        };

        // "par" is mid-line; it must wait for the rest.
        assert_eq!(emit_complete_lines(b"one\ntwo\npar", &sink), 8);
        assert_eq!(*captured.lock().unwrap(), ["one", "two"]);

        // The same bytes plus their completion arrive as one line.
        assert_eq!(emit_complete_lines(b"partial done\n", &sink), 13);
        assert_eq!(captured.lock().unwrap().last().unwrap(), "partial done");

        assert_eq!(emit_complete_lines(b"no newline yet", &sink), 0);
        assert_eq!(captured.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_read_lossy_out_of_bounds() {
        let data = [1u8, 2, 3];
        assert_eq!(read_lossy(&data, 10, 5), "");
        assert_eq!(read_lossy(&data, -1, 2), "\u{1}\u{2}");
        assert_eq!(read_lossy(&data, 0, 3), "\u{1}\u{2}\u{3}");
    }
}
