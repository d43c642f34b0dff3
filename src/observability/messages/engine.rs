// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for engine loading and variant selection events.

use std::fmt::{Display, Formatter};

/// Engine build asset loaded and validated.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use tilebridge::observability::messages::engine::AssetLoaded;
///
/// let msg = AssetLoaded {
///     asset_path: "assets/tilegen.v6.wasm",
///     size_bytes: 4096,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct AssetLoaded<'a> {
    pub asset_path: &'a str,
    pub size_bytes: usize,
}

impl Display for AssetLoaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Loaded engine asset: {} ({} bytes)",
            self.asset_path, self.size_bytes
        )
    }
}

/// Engine build variant selected at instance creation.
///
/// When the parallel build was requested but the single-threaded build is
/// logged here, the shared-memory capability probe failed.
pub struct VariantSelected<'a> {
    pub variant: &'a str,
    pub parallel_requested: bool,
}

impl Display for VariantSelected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Selected {} engine build (parallel requested: {})",
            self.variant, self.parallel_requested
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_selected_wording() {
        let msg = VariantSelected {
            variant: "single-thread",
            parallel_requested: true,
        };
        assert_eq!(
            msg.to_string(),
            "Selected single-thread engine build (parallel requested: true)"
        );
    }
}
