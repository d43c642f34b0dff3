// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Argument inspection
//!
//! The bridge forwards the argument sequence to the engine verbatim; it
//! never validates or rewrites flags. The one thing it reads out of the
//! list is the caller-declared output path, so the extractor knows where to
//! look after a successful run.

/// Scans the arguments for the first occurrence of an output declaration.
///
/// Four equivalent forms are recognized, first match wins:
/// - `-o <path>`
/// - `--output <path>`
/// - `-o<path>`
/// - `--output=<path>`
///
/// A bare trailing `-o`/`--output` with no following token resolves to
/// nothing.
pub fn resolve_output_path(args: &[String]) -> Option<String> {
    for (index, arg) in args.iter().enumerate() {
        if arg == "-o" || arg == "--output" {
            return args.get(index + 1).cloned();
        }
        if let Some(rest) = arg.strip_prefix("--output=") {
            return Some(rest.to_string());
        }
        if let Some(rest) = arg.strip_prefix("-o") {
            if !rest.is_empty() {
                return Some(rest.to_string());
            }
        }
    }
    None
}
