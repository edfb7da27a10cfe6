// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Structured logging shared by every crate in the revision store.
//!
//! Usage:
//! - Set REVS_LOG=off (default) - no logs
//! - Set REVS_LOG=error | warn | info - progressively chattier
//! - Set REVS_LOG=debug - every append, seed and lifecycle step
//!
//! Crates bring the macros in with `use diagnostics::*;` and log with
//! emit's named-property syntax: `info!("seeded {path}", path: p)`.

use std::sync::Once;

// Re-export emit so macros can use it
pub use emit;

/// Environment variable consulted by [`init_diagnostics`].
pub const LOG_ENV_VAR: &str = "REVS_LOG";

static INIT: Once = Once::new();

/// Maps a `REVS_LOG` value onto a minimum emit level.
///
/// `Ok(None)` means logging is switched off; `Err` carries the value that
/// was not understood.
pub fn parse_level(value: &str) -> Result<Option<emit::Level>, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "off" => Ok(None),
        "debug" => Ok(Some(emit::Level::Debug)),
        "info" => Ok(Some(emit::Level::Info)),
        "warn" => Ok(Some(emit::Level::Warn)),
        "error" => Ok(Some(emit::Level::Error)),
        other => Err(other.to_string()),
    }
}

/// Initialize diagnostics based on the REVS_LOG environment variable
///
/// Call once at application startup. Later calls are ignored.
pub fn init_diagnostics() {
    INIT.call_once(|| {
        let raw = std::env::var(LOG_ENV_VAR).unwrap_or_else(|_| "off".to_string());

        let (level, unknown) = match parse_level(&raw) {
            Ok(None) => return,
            Ok(Some(level)) => (level, None),
            Err(other) => (emit::Level::Info, Some(other)),
        };

        let rt = emit::setup()
            .emit_to(emit_term::stderr())
            .emit_when(emit::level::min_filter(level))
            .init();

        if let Some(value) = unknown {
            emit::warn!("unknown {var} value {value}, using info", var: LOG_ENV_VAR, value);
        }

        // The runtime must outlive every emitter for the life of the process.
        std::mem::forget(rt);
    });
}

/// Re-export the init function for convenience
pub use init_diagnostics as init;

/// Routine operations: log created, record appended, history moved.
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::emit::info!($($arg)*)
    };
}

/// Step-by-step detail useful when chasing an ordering or parsing problem.
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::emit::debug!($($arg)*)
    };
}

/// Recoverable failures, including every fail-soft lifecycle error.
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::emit::warn!($($arg)*)
    };
}

/// Failures that halt an operation.
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::emit::error!($($arg)*)
    };
}
