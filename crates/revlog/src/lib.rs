// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! RevLog - per-file revision history kept as append-only JSON-lines logs
//!
//! Every tracked file `<dir>/<name>` has a log at
//! `<root>/<dir>/<name>.<suffix>` holding one patch per line. Replaying the
//! patches in timestamp order from the empty string yields any stored
//! version of the file.
//!
//! Set REVS_LOG to control logging:
//! - REVS_LOG=off (default) - silent
//! - REVS_LOG=info - log creation, moves and removals
//! - REVS_LOG=debug - every append and queue step

/// Storage layout and save behavior
pub mod config;

/// Error types
pub mod error;

/// Character diffs between revisions
pub mod patch;

/// Logical path to log path mapping
pub mod path;

/// Revision records
pub mod schema;

// Log creation and appends
pub mod store;

// Parsing and replay
pub mod reconstruct;

// Serialized saves
pub mod queue;

// Moves and deletes
pub mod lifecycle;

pub mod engine;

pub use config::{FirstSavePolicy, RevisionConfig};
pub use engine::RevisionEngine;
pub use error::{Result, RevLogError};
pub use lifecycle::LifecycleOutcome;
pub use patch::{Applied, CharDiffer, Differ, Hunk, PatchSet};
pub use path::PathMapper;
pub use queue::{PendingSave, SaveQueue};
pub use schema::{RevisionInfo, RevisionMap, RevisionRecord};
