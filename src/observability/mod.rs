// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging.
//!
//! Diagnostic and operational log lines are emitted through struct-based
//! message types with `Display` implementations rather than ad-hoc format
//! strings. This keeps wording in one place per subsystem:
//!
//! * `messages::engine` - engine asset loading and variant selection
//! * `messages::bridge` - staging, invocation, extraction, and cleanup

pub mod messages;
