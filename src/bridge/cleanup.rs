// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Cleanup coordination
//!
//! Runs unconditionally after every invocation, successful or not: staged
//! input paths are removed and the engine's output buffer is released. This
//! is pure best-effort hygiene. It never returns an error and must not mask
//! whatever result or error the invocation produced; failures are logged at
//! debug level only.

use crate::bridge::stager;
use crate::engine::EngineHandle;
use crate::observability::messages::bridge::StagedPathRemovalFailed;
use std::io::ErrorKind;
use std::path::Path;

/// Removes every staged input path and releases the engine output buffer.
///
/// A path that is already gone is not a failure. Releasing an already-empty
/// output buffer is a no-op on the engine side.
pub async fn sweep(handle: &mut EngineHandle, staged: &[String]) {
    remove_staged(handle.root(), staged);
    handle.release_output().await;
}

/// Removes the staged paths that resolve inside `root`. A path that escapes
/// was never written and is skipped.
fn remove_staged(root: &Path, staged: &[String]) {
    for path in staged {
        let Ok(target) = stager::resolve_virtual(root, path) else {
            continue;
        };
        match std::fs::remove_file(&target) {
            Ok(()) => {}
            Err(error) if error.kind() == ErrorKind::NotFound => {}
            Err(error) => {
                tracing::debug!(
                    "{}",
                    StagedPathRemovalFailed {
                        path,
                        error: &error,
                    }
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_remove_staged_deletes_inside_root_only() {
        let outer = tempfile::tempdir().unwrap();
        let root = outer.path().join("engine");
        fs::create_dir(&root).unwrap();
        fs::write(root.join("in.geojson"), b"x").unwrap();
        let victim = outer.path().join("victim.bin");
        fs::write(&victim, b"host data").unwrap();

        remove_staged(
            &root,
            &[
                "in.geojson".to_string(),
                "../victim.bin".to_string(),
                "already-gone.bin".to_string(),
            ],
        );

        assert!(!root.join("in.geojson").exists());
        assert!(victim.is_file());
    }
}
