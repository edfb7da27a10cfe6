// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Revision log store: creates, seeds and appends to per-file logs

use crate::config::FirstSavePolicy;
use crate::error::{Result, RevLogError};
use crate::patch::Differ;
use crate::path::PathMapper;
use crate::schema::{RevisionInfo, RevisionRecord, now_millis};
use diagnostics::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use workfs::WorkspaceFs;
use workfs::path::dirname;

/// A log known to exist on disk
#[derive(Debug, Clone, PartialEq)]
pub struct LogHandle {
    pub log_path: PathBuf,
    pub logical_path: PathBuf,
    /// Set when this call created the log
    pub seed: Option<RevisionRecord>,
}

impl LogHandle {
    #[must_use]
    pub fn created(&self) -> bool {
        self.seed.is_some()
    }

    fn seed_info(&self) -> Option<RevisionInfo> {
        self.seed.as_ref().map(|seed| RevisionInfo {
            log_path: self.log_path.clone(),
            logical_path: self.logical_path.clone(),
            ts: seed.ts,
        })
    }
}

/// Sole writer of revision logs
pub struct LogStore {
    fs: Arc<dyn WorkspaceFs>,
    differ: Arc<dyn Differ>,
    mapper: PathMapper,
    first_save: FirstSavePolicy,
}

impl LogStore {
    pub fn new(
        fs: Arc<dyn WorkspaceFs>,
        differ: Arc<dyn Differ>,
        mapper: PathMapper,
        first_save: FirstSavePolicy,
    ) -> Self {
        Self {
            fs,
            differ,
            mapper,
            first_save,
        }
    }

    #[must_use]
    pub fn mapper(&self) -> &PathMapper {
        &self.mapper
    }

    pub async fn log_exists(&self, logical: &Path) -> Result<bool> {
        Ok(self.fs.exists(&self.mapper.log_path(logical)).await?)
    }

    /// Create and seed the log for `logical` unless it already exists.
    ///
    /// The seed is written with an exclusive create, so when two callers
    /// race to create the same log exactly one seed lands and the loser
    /// gets the existing-log handle.
    pub async fn ensure_log(&self, logical: &Path) -> Result<LogHandle> {
        let (handle, _) = self.seed_log(logical, now_millis()).await?;
        Ok(handle)
    }

    /// Like [`Self::ensure_log`] with a chosen seed timestamp; also returns
    /// the seeded content when this call created the log.
    async fn seed_log(&self, logical: &Path, ts: i64) -> Result<(LogHandle, Option<String>)> {
        let log_path = self.mapper.log_path(logical);
        let existing = LogHandle {
            log_path: log_path.clone(),
            logical_path: logical.to_path_buf(),
            seed: None,
        };

        if self.fs.exists(&log_path).await? {
            return Ok((existing, None));
        }

        let content = self.fs.read_to_string(logical).await?;

        if let Some(parent) = dirname(&log_path) {
            self.fs.create_dir_all(&parent).await?;
        }

        let seed = RevisionRecord::seed(ts, &content, self.differ.as_ref());
        let line = seed.to_line()?;

        match self.fs.write_new(&log_path, line.as_bytes()).await {
            Ok(()) => {
                info!(
                    "created revision log {log} with seed of {length} chars",
                    log: log_path.display().to_string(),
                    length: seed.length
                );
                let handle = LogHandle {
                    seed: Some(seed),
                    ..existing
                };
                Ok((handle, Some(content)))
            }
            Err(e) if e.is_already_exists() => {
                debug!("revision log {log} appeared while seeding", log: log_path.display().to_string());
                Ok((existing, None))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Append one record to an existing log
    pub async fn append_record(&self, logical: &Path, record: &RevisionRecord) -> Result<RevisionInfo> {
        let log_path = self.mapper.log_path(logical);
        if !self.fs.exists(&log_path).await? {
            return Err(RevLogError::NotFound(log_path));
        }

        let line = record.to_line()?;
        self.fs
            .append(&log_path, line.as_bytes())
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    RevLogError::NotFound(log_path.clone())
                } else {
                    e.into()
                }
            })?;

        debug!(
            "appended revision {rev_ts} to {log}",
            rev_ts: record.ts,
            log: log_path.display().to_string()
        );

        Ok(RevisionInfo {
            log_path,
            logical_path: logical.to_path_buf(),
            ts: record.ts,
        })
    }

    /// Persist a save request: seed a missing log, otherwise append.
    ///
    /// What happens to `revision` when the log had to be created depends
    /// on the configured [`FirstSavePolicy`]. Under
    /// [`FirstSavePolicy::SeedThenAppend`] the seed is stamped before
    /// `revision.ts`, and `revision` is appended only when its patch applies
    /// cleanly to the seeded content and changes it.
    pub async fn save(&self, logical: &Path, revision: RevisionRecord) -> Result<RevisionInfo> {
        if self.log_exists(logical).await? {
            return self.append_record(logical, &revision).await;
        }

        let seed_ts = match self.first_save {
            FirstSavePolicy::SeedOnly => now_millis(),
            FirstSavePolicy::SeedThenAppend => now_millis().min(revision.ts.saturating_sub(1)),
        };
        let (handle, seeded) = self.seed_log(logical, seed_ts).await?;
        let (Some(info), Some(content)) = (handle.seed_info(), seeded) else {
            return self.append_record(logical, &revision).await;
        };

        if self.first_save == FirstSavePolicy::SeedThenAppend && self.extends_seed(&revision, &content) {
            return self.append_record(logical, &revision).await;
        }
        debug!(
            "first save of {path} persisted as seed only",
            path: logical.display().to_string()
        );
        Ok(info)
    }

    fn extends_seed(&self, revision: &RevisionRecord, content: &str) -> bool {
        let Some(patch) = revision.patch_set() else {
            return false;
        };
        !patch.is_identity() && self.differ.apply_patch(patch, content).clean
    }

    /// Current content of the logical file itself
    pub async fn read_live(&self, logical: &Path) -> Result<String> {
        Ok(self.fs.read_to_string(logical).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::CharDiffer;
    use workfs::MemoryFs;

    fn store(fs: &MemoryFs, policy: FirstSavePolicy) -> LogStore {
        LogStore::new(
            Arc::new(fs.clone()),
            Arc::new(CharDiffer),
            PathMapper::new(".revisions", "rev"),
            policy,
        )
    }

    async fn workspace_with(path: &str, content: &str) -> MemoryFs {
        let fs = MemoryFs::new();
        if let Some(parent) = dirname(path) {
            fs.create_dir_all(&parent).await.unwrap();
        }
        fs.write(Path::new(path), content.as_bytes()).await.unwrap();
        fs
    }

    #[tokio::test]
    async fn test_ensure_log_seeds_from_live_file() {
        let fs = workspace_with("docs/foo.txt", "hello").await;
        let store = store(&fs, FirstSavePolicy::SeedOnly);

        let handle = store.ensure_log(Path::new("docs/foo.txt")).await.unwrap();
        assert!(handle.created());
        assert_eq!(handle.log_path, PathBuf::from(".revisions/docs/foo.txt.rev"));

        let text = fs.read_to_string(&handle.log_path).await.unwrap();
        assert_eq!(text.lines().count(), 1);
        let seed: RevisionRecord = serde_json::from_str(text.trim_end()).unwrap();
        assert_eq!(seed.length, 5);
        assert!(seed.silentsave);
    }

    #[tokio::test]
    async fn test_ensure_log_is_noop_when_present() {
        let fs = workspace_with("foo.txt", "hello").await;
        let store = store(&fs, FirstSavePolicy::SeedOnly);

        let _ = store.ensure_log(Path::new("foo.txt")).await.unwrap();
        fs.write(Path::new("foo.txt"), b"changed").await.unwrap();
        let again = store.ensure_log(Path::new("foo.txt")).await.unwrap();

        assert!(!again.created());
        let text = fs.read_to_string(&again.log_path).await.unwrap();
        assert_eq!(text.lines().count(), 1);
    }

    #[tokio::test]
    async fn test_ensure_log_missing_live_file() {
        let fs = MemoryFs::new();
        let store = store(&fs, FirstSavePolicy::SeedOnly);
        let result = store.ensure_log(Path::new("ghost.txt")).await;
        assert!(matches!(result, Err(RevLogError::Fs(workfs::Error::NotFound(_)))));
        assert!(fs.list_files().await.is_empty());
    }

    #[tokio::test]
    async fn test_append_requires_log() {
        let fs = workspace_with("foo.txt", "hello").await;
        let store = store(&fs, FirstSavePolicy::SeedOnly);
        let record = RevisionRecord::from_diff(10, "hello", "hello!", &CharDiffer);

        let result = store.append_record(Path::new("foo.txt"), &record).await;
        assert!(matches!(result, Err(RevLogError::NotFound(p)) if p == Path::new(".revisions/foo.txt.rev")));
    }

    #[tokio::test]
    async fn test_save_seed_only_drops_first_payload() {
        let fs = workspace_with("foo.txt", "hello").await;
        let store = store(&fs, FirstSavePolicy::SeedOnly);
        let payload = RevisionRecord::from_diff(1, "", "hello", &CharDiffer);

        let info = store.save(Path::new("foo.txt"), payload).await.unwrap();
        assert_ne!(info.ts, 1);

        let text = fs.read_to_string(&info.log_path).await.unwrap();
        assert_eq!(text.lines().count(), 1);
    }

    #[tokio::test]
    async fn test_save_seed_then_append_keeps_first_payload() {
        let fs = workspace_with("foo.txt", "hello").await;
        let store = store(&fs, FirstSavePolicy::SeedThenAppend);
        let ts = now_millis() - 50;
        let payload = RevisionRecord::from_diff(ts, "hello", "hello!", &CharDiffer);

        let info = store.save(Path::new("foo.txt"), payload).await.unwrap();
        assert_eq!(info.ts, ts);

        let text = fs.read_to_string(&info.log_path).await.unwrap();
        let records: Vec<RevisionRecord> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(records.len(), 2);
        assert!(records[0].silentsave);
        assert!(records[0].ts < ts);
    }

    #[tokio::test]
    async fn test_save_seed_then_append_skips_payload_already_in_seed() {
        let fs = workspace_with("foo.txt", "hello").await;
        let store = store(&fs, FirstSavePolicy::SeedThenAppend);
        let ts = now_millis() - 50;

        // Diffed from the client's empty buffer; the seed already holds "hello".
        let payload = RevisionRecord::from_diff(ts, "", "hello", &CharDiffer);
        let info = store.save(Path::new("foo.txt"), payload).await.unwrap();
        assert_eq!(info.ts, ts - 1);
        let text = fs.read_to_string(&info.log_path).await.unwrap();
        assert_eq!(text.lines().count(), 1);

        fs.write(Path::new("bar.txt"), b"same").await.unwrap();
        let identity = RevisionRecord::from_diff(ts, "same", "same", &CharDiffer);
        let info = store.save(Path::new("bar.txt"), identity).await.unwrap();
        let text = fs.read_to_string(&info.log_path).await.unwrap();
        assert_eq!(text.lines().count(), 1);
    }

    #[tokio::test]
    async fn test_save_appends_when_log_exists() {
        let fs = workspace_with("foo.txt", "hello").await;
        let store = store(&fs, FirstSavePolicy::SeedOnly);
        let _ = store.ensure_log(Path::new("foo.txt")).await.unwrap();

        let record = RevisionRecord::from_diff(42, "hello", "hello world", &CharDiffer);
        let info = store.save(Path::new("foo.txt"), record).await.unwrap();
        assert_eq!(info.ts, 42);
        assert_eq!(info.logical_path, PathBuf::from("foo.txt"));

        let text = fs.read_to_string(&info.log_path).await.unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.ends_with('\n'));
    }
}
