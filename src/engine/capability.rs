// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Shared-memory capability detection
//!
//! The parallel engine build relies on shared linear memory for its internal
//! worker pool. Whether the host runtime can actually allocate shared memory
//! is probed here rather than assumed: a failed probe selects the
//! single-threaded build instead of surfacing an error.

use wasmtime::{Config, Engine, MemoryType, SharedMemory};

/// Returns true if the host can allocate shared-memory-backed buffers.
///
/// The probe configures a wasmtime engine with the threads proposal enabled
/// and attempts to allocate a minimal one-page shared memory. Any failure is
/// reported as "unsupported"; nothing propagates. The probe allocation is
/// dropped immediately.
pub fn supports_shared_memory() -> bool {
    let mut config = Config::new();
    config.wasm_threads(true);

    let engine = match Engine::new(&config) {
        Ok(engine) => engine,
        Err(_) => return false,
    };

    SharedMemory::new(&engine, MemoryType::shared(1, 1)).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_does_not_panic() {
        // The result is host-dependent; the contract is only that the probe
        // answers with a boolean instead of an error.
        let _ = supports_shared_memory();
    }

    #[test]
    fn test_probe_is_repeatable() {
        assert_eq!(supports_shared_memory(), supports_shared_memory());
    }
}
