// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Engine asset loading and validation
//!
//! This module reads a pre-built engine binary from disk and performs size
//! and encoding validation. The engine ABI is a classic core WASM module;
//! component-model binaries are rejected here, before any compilation work
//! happens.

use crate::errors::{BridgeError, BridgeResult};
use crate::observability::messages::engine::AssetLoaded;
use std::path::Path;
use wasmparser::{Encoding, Parser, Payload};

/// Maximum allowed size for an engine build asset (64 MB).
const MAX_ENGINE_ASSET_SIZE: usize = 64 * 1024 * 1024;

/// Loads engine bytes from a versioned asset file and validates them.
///
/// # Errors
/// * `BridgeError::Construction` - the asset file cannot be read
/// * `BridgeError::Validation` - the asset exceeds the size limit or is not
///   a classic core WASM module
pub fn load_engine_bytes(path: &Path) -> BridgeResult<Vec<u8>> {
    let bytes = std::fs::read(path).map_err(|e| {
        BridgeError::Construction(format!(
            "failed to read engine asset '{}': {}",
            path.display(),
            e
        ))
    })?;

    if bytes.len() > MAX_ENGINE_ASSET_SIZE {
        return Err(BridgeError::Validation(format!(
            "engine asset too large: {} bytes (max: {} bytes)",
            bytes.len(),
            MAX_ENGINE_ASSET_SIZE
        )));
    }

    verify_core_module(&bytes)?;

    tracing::info!(
        "{}",
        AssetLoaded {
            asset_path: &path.display().to_string(),
            size_bytes: bytes.len(),
        }
    );

    Ok(bytes)
}

/// Verifies that the binary is a classic core module, not a component.
fn verify_core_module(bytes: &[u8]) -> BridgeResult<()> {
    let parser = Parser::new(0);
    let mut encoding = None;

    for payload in parser.parse_all(bytes) {
        let payload =
            payload.map_err(|e| BridgeError::Validation(format!("malformed engine asset: {e}")))?;
        if let Payload::Version { encoding: enc, .. } = payload {
            encoding = Some(enc);
            break;
        }
    }

    match encoding {
        Some(Encoding::Module) => Ok(()),
        Some(Encoding::Component) => Err(BridgeError::Validation(
            "engine asset is a component-model binary; expected a core module build".to_string(),
        )),
        None => Err(BridgeError::Validation(
            "engine asset has no WASM version header".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_valid_core_module() {
        let wasm = wat::parse_str("(module)").unwrap();
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(&wasm).unwrap();

        let bytes = load_engine_bytes(temp_file.path()).unwrap();
        assert_eq!(bytes, wasm);
    }

    #[test]
    fn test_missing_asset_is_construction_failure() {
        let result = load_engine_bytes(Path::new("/nonexistent/tilegen.v6.wasm"));
        assert!(matches!(result, Err(BridgeError::Construction(_))));
    }

    #[test]
    fn test_asset_too_large() {
        let mut temp_file = NamedTempFile::new().unwrap();
        let large_data = vec![0u8; MAX_ENGINE_ASSET_SIZE + 1];
        temp_file.write_all(&large_data).unwrap();

        let result = load_engine_bytes(temp_file.path());
        if let Err(BridgeError::Validation(msg)) = result {
            assert!(msg.contains("too large"));
        } else {
            panic!("Expected Validation error for oversized asset");
        }
    }

    #[test]
    fn test_garbage_bytes_rejected() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"\x00\x00\x00\x00not wasm").unwrap();

        let result = load_engine_bytes(temp_file.path());
        assert!(matches!(result, Err(BridgeError::Validation(_))));
    }

    #[test]
    fn test_component_binary_rejected() {
        let component = wat::parse_str("(component)").unwrap();
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(&component).unwrap();

        let result = load_engine_bytes(temp_file.path());
        if let Err(BridgeError::Validation(msg)) = result {
            assert!(msg.contains("component-model"));
        } else {
            panic!("Expected Validation error for component binary");
        }
    }
}
