// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Engine build variant selection
//!
//! The engine ships as two pre-built WASM binaries: a parallel-capable build
//! that uses shared-memory workers internally, and a single-threaded build.
//! Selection combines the caller's preference with the runtime capability
//! probe; when either says no, the single-threaded build is chosen silently.
//!
//! Assets are addressed with a version tag baked into the filename so that a
//! rebuilt engine can never be served from a stale cache. The tag is an
//! opaque integer bumped on each engine rebuild.

use crate::engine::capability;

/// Cache-busting version tag for the engine build assets.
pub const ASSET_VERSION: u32 = 6;

const ASSET_STEM: &str = "tilegen";
const SINGLE_THREAD_SUFFIX: &str = "-st";

/// One of the two pre-built engine forms.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EngineVariant {
    /// Parallel-capable build; requires shared-memory support.
    Parallel,
    /// Single-threaded fallback build.
    SingleThread,
}

impl EngineVariant {
    /// Selects the variant to load.
    ///
    /// The parallel build is used only when the caller did not disable it
    /// AND the capability probe reports shared-memory support. Otherwise the
    /// single-threaded build is selected.
    pub fn select(enable_parallel: bool) -> Self {
        if enable_parallel && capability::supports_shared_memory() {
            Self::Parallel
        } else {
            Self::SingleThread
        }
    }

    /// Returns true for the parallel-capable build.
    #[inline]
    pub fn is_parallel(self) -> bool {
        matches!(self, Self::Parallel)
    }

    /// Versioned asset filename for this variant.
    pub fn asset_file(self) -> String {
        match self {
            Self::Parallel => format!("{ASSET_STEM}.v{ASSET_VERSION}.wasm"),
            Self::SingleThread => {
                format!("{ASSET_STEM}{SINGLE_THREAD_SUFFIX}.v{ASSET_VERSION}.wasm")
            }
        }
    }

    /// Short name for logging.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Parallel => "parallel",
            Self::SingleThread => "single-thread",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_parallel_always_selects_single_thread() {
        // Regardless of what the host supports, an explicit opt-out wins.
        assert_eq!(EngineVariant::select(false), EngineVariant::SingleThread);
    }

    #[test]
    fn test_selection_matches_capability_when_enabled() {
        let expected = if capability::supports_shared_memory() {
            EngineVariant::Parallel
        } else {
            EngineVariant::SingleThread
        };
        assert_eq!(EngineVariant::select(true), expected);
    }

    #[test]
    fn test_asset_files_are_versioned() {
        assert_eq!(EngineVariant::Parallel.asset_file(), "tilegen.v6.wasm");
        assert_eq!(
            EngineVariant::SingleThread.asset_file(),
            "tilegen-st.v6.wasm"
        );
    }

    #[test]
    fn test_variant_helpers() {
        assert!(EngineVariant::Parallel.is_parallel());
        assert!(!EngineVariant::SingleThread.is_parallel());
        assert_eq!(EngineVariant::Parallel.as_str(), "parallel");
        assert_eq!(EngineVariant::SingleThread.as_str(), "single-thread");
    }
}
