// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Revision records and the in-memory history map

use crate::error::Result;
use crate::patch::{Differ, PatchSet};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::PathBuf;

/// History of one file keyed by record timestamp.
///
/// Lookup by exact `ts` is O(1); iteration order is arbitrary, callers
/// that need chronological order sort the keys.
pub type RevisionMap = HashMap<i64, RevisionRecord>;

/// One line of a revision log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevisionRecord {
    /// Milliseconds since the epoch; unique within a log
    pub ts: i64,
    #[serde(default)]
    pub silentsave: bool,
    #[serde(default)]
    pub restoring: bool,
    /// Single-element list: the diff from the previous revision to this one
    pub patch: Vec<PatchSet>,
    /// Character length of the content after this revision
    pub length: usize,
    /// Fields the client attached that the store does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RevisionRecord {
    /// Record describing the change from `old` to `new`
    pub fn from_diff(ts: i64, old: &str, new: &str, differ: &dyn Differ) -> Self {
        Self::from_patch(ts, differ.make_patch(old, new), new)
    }

    /// Record carrying an already computed `patch` that produces `new`
    pub fn from_patch(ts: i64, patch: PatchSet, new: &str) -> Self {
        Self {
            ts,
            silentsave: false,
            restoring: false,
            patch: vec![patch],
            length: new.chars().count(),
            extra: Map::new(),
        }
    }

    /// First record of a new log: the whole of `content`, diffed from empty
    pub fn seed(ts: i64, content: &str, differ: &dyn Differ) -> Self {
        Self {
            silentsave: true,
            ..Self::from_diff(ts, "", content, differ)
        }
    }

    /// The patch this record contributes during reconstruction
    #[must_use]
    pub fn patch_set(&self) -> Option<&PatchSet> {
        self.patch.first()
    }

    /// JSON encoding terminated by a newline, ready to append to a log
    pub fn to_line(&self) -> Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

/// Metadata reported for a persisted save
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionInfo {
    pub log_path: PathBuf,
    pub logical_path: PathBuf,
    pub ts: i64,
}

/// Current wall-clock time in milliseconds
#[must_use]
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
