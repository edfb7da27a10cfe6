// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Revision reconstructor: parses a log and replays its patches

use crate::error::{Result, RevLogError};
use crate::patch::Differ;
use crate::path::PathMapper;
use crate::schema::{RevisionMap, RevisionRecord};
use diagnostics::*;
use std::path::Path;
use std::sync::Arc;
use workfs::WorkspaceFs;

/// Parse the text of a log into a map keyed by `ts`.
///
/// Blank lines are skipped. The first malformed line fails the whole
/// parse; no partial map is returned. A later record with a duplicate
/// `ts` replaces the earlier one.
pub fn parse_log(log_path: &Path, text: &str) -> Result<RevisionMap> {
    let mut revisions = RevisionMap::new();
    for (index, line) in text.split('\n').enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record: RevisionRecord =
            serde_json::from_str(line).map_err(|source| RevLogError::Parse {
                path: log_path.to_path_buf(),
                line: index + 1,
                source,
            })?;
        let _ = revisions.insert(record.ts, record);
    }
    Ok(revisions)
}

/// Timestamps in numeric order, cut after `upper_bound` when it names an
/// existing revision. A bound that matches nothing leaves the list whole.
#[must_use]
pub fn sorted_timestamps(revisions: &RevisionMap, upper_bound: Option<i64>) -> Vec<i64> {
    let mut timestamps: Vec<i64> = revisions.keys().copied().collect();
    timestamps.sort_unstable();
    if let Some(bound) = upper_bound {
        if let Some(index) = timestamps.iter().position(|ts| *ts == bound) {
            timestamps.truncate(index + 1);
        }
    }
    timestamps
}

/// Replay every patch in `ts` order starting from the empty string
pub fn reconstruct(differ: &dyn Differ, revisions: &RevisionMap, upper_bound: Option<i64>) -> Result<String> {
    if revisions.is_empty() {
        return Err(RevLogError::EmptyHistory);
    }

    let mut content = String::new();
    for ts in sorted_timestamps(revisions, upper_bound) {
        let Some(patch) = revisions.get(&ts).and_then(RevisionRecord::patch_set) else {
            continue;
        };
        let applied = differ.apply_patch(patch, &content);
        if !applied.clean {
            debug!("revision {rev_ts} did not apply cleanly", rev_ts: ts);
        }
        content = applied.text;
    }
    Ok(content)
}

/// Reads logs through the filesystem collaborator
pub struct Reconstructor {
    fs: Arc<dyn WorkspaceFs>,
    differ: Arc<dyn Differ>,
    mapper: PathMapper,
}

impl Reconstructor {
    pub fn new(fs: Arc<dyn WorkspaceFs>, differ: Arc<dyn Differ>, mapper: PathMapper) -> Self {
        Self { fs, differ, mapper }
    }

    /// Load the whole history of `logical`
    pub async fn load_all(&self, logical: &Path) -> Result<RevisionMap> {
        let log_path = self.mapper.log_path(logical);
        let text = self.fs.read_to_string(&log_path).await.map_err(|e| {
            if e.is_not_found() {
                RevLogError::NotFound(log_path.clone())
            } else {
                e.into()
            }
        })?;
        let revisions = parse_log(&log_path, &text)?;
        debug!(
            "loaded {count} revisions from {log}",
            count: revisions.len(),
            log: log_path.display().to_string()
        );
        Ok(revisions)
    }

    pub fn reconstruct(&self, revisions: &RevisionMap, upper_bound: Option<i64>) -> Result<String> {
        reconstruct(self.differ.as_ref(), revisions, upper_bound)
    }

    #[must_use]
    pub fn differ(&self) -> &dyn Differ {
        self.differ.as_ref()
    }
}
