// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Revision engine: owns the store, the reconstructor, the lifecycle
//! manager and the save queue for one workspace

use crate::config::RevisionConfig;
use crate::error::Result;
use crate::lifecycle::{Lifecycle, LifecycleOutcome};
use crate::patch::{CharDiffer, Differ};
use crate::path::PathMapper;
use crate::queue::{PendingSave, SaveQueue};
use crate::reconstruct::{Reconstructor, sorted_timestamps};
use crate::schema::{RevisionInfo, RevisionMap, RevisionRecord, now_millis};
use crate::store::LogStore;
use diagnostics::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use workfs::WorkspaceFs;

pub struct RevisionEngine {
    config: RevisionConfig,
    store: Arc<LogStore>,
    reconstructor: Reconstructor,
    lifecycle: Lifecycle,
    queue: SaveQueue,
}

impl RevisionEngine {
    /// Build an engine over `fs`. Spawns the save worker, so this must be
    /// called from inside a tokio runtime.
    pub fn new(fs: Arc<dyn WorkspaceFs>, differ: Arc<dyn Differ>, config: RevisionConfig) -> Result<Self> {
        config.validate()?;
        let mapper = PathMapper::new(config.root.clone(), config.suffix.clone());

        let store = Arc::new(LogStore::new(
            fs.clone(),
            differ.clone(),
            mapper.clone(),
            config.first_save,
        ));
        let reconstructor = Reconstructor::new(fs.clone(), differ, mapper.clone());
        let lifecycle = Lifecycle::new(fs, mapper);
        let queue = SaveQueue::start(store.clone());

        debug!(
            "revision engine ready: root {root}, suffix {suffix}",
            root: config.root.display().to_string(),
            suffix: config.suffix.as_str()
        );

        Ok(Self {
            config,
            store,
            reconstructor,
            lifecycle,
            queue,
        })
    }

    /// Engine with the character differ and default layout
    pub fn with_defaults(fs: Arc<dyn WorkspaceFs>) -> Result<Self> {
        Self::new(fs, Arc::new(CharDiffer), RevisionConfig::default())
    }

    #[must_use]
    pub fn config(&self) -> &RevisionConfig {
        &self.config
    }

    #[must_use]
    pub fn mapper(&self) -> &PathMapper {
        self.store.mapper()
    }

    /// Queue a save. Its place in the queue is fixed on return.
    pub fn submit_save(&self, logical: &Path, revision: RevisionRecord) -> PendingSave {
        self.queue.submit(logical.to_path_buf(), revision)
    }

    pub async fn save(&self, logical: &Path, revision: RevisionRecord) -> Result<RevisionInfo> {
        self.submit_save(logical, revision).wait().await
    }

    /// History of `logical`, creating and seeding its log on first use
    pub async fn get_revisions(&self, logical: &Path) -> Result<RevisionMap> {
        let handle = self.store.ensure_log(logical).await?;
        if let Some(seed) = handle.seed {
            let mut revisions = RevisionMap::new();
            let _ = revisions.insert(seed.ts, seed);
            return Ok(revisions);
        }
        self.reconstructor.load_all(logical).await
    }

    pub async fn load_all(&self, logical: &Path) -> Result<RevisionMap> {
        self.reconstructor.load_all(logical).await
    }

    pub fn reconstruct(&self, revisions: &RevisionMap, upper_bound: Option<i64>) -> Result<String> {
        self.reconstructor.reconstruct(revisions, upper_bound)
    }

    /// Content of `logical` as of `upper_bound` (or the latest revision)
    pub async fn content_at(&self, logical: &Path, upper_bound: Option<i64>) -> Result<String> {
        let revisions = self.load_all(logical).await?;
        self.reconstruct(&revisions, upper_bound)
    }

    /// Latest stored content, seeding the log if there is none yet
    pub async fn previous_content(&self, logical: &Path) -> Result<String> {
        let revisions = self.get_revisions(logical).await?;
        self.reconstruct(&revisions, None)
    }

    /// Store the live content of `logical` as a new revision.
    ///
    /// The record is the diff from the latest stored content to the live
    /// file. Its `ts` is the current time, bumped past the newest existing
    /// revision so that it always sorts last. A file whose log had to be
    /// created is fully captured by its seed and nothing else is queued;
    /// likewise nothing is queued when the live file matches the history.
    pub async fn record_snapshot(&self, logical: &Path) -> Result<RevisionInfo> {
        let handle = self.store.ensure_log(logical).await?;
        if let Some(seed) = &handle.seed {
            return Ok(RevisionInfo {
                log_path: handle.log_path.clone(),
                logical_path: handle.logical_path.clone(),
                ts: seed.ts,
            });
        }

        let revisions = self.load_all(logical).await?;
        let previous = self.reconstruct(&revisions, None)?;
        let live = self.read_live(logical).await?;
        let last = sorted_timestamps(&revisions, None).last().copied().unwrap_or(0);

        let patch = self.differ().make_patch(&previous, &live);
        if patch.is_identity() {
            debug!("{path} unchanged since {rev_ts}", path: logical.display().to_string(), rev_ts: last);
            return Ok(RevisionInfo {
                log_path: handle.log_path,
                logical_path: handle.logical_path,
                ts: last,
            });
        }

        let ts = now_millis().max(last.saturating_add(1));
        let record = RevisionRecord::from_patch(ts, patch, &live);
        self.save(logical, record).await
    }

    /// Current content of the logical file itself
    pub async fn read_live(&self, logical: &Path) -> Result<String> {
        self.store.read_live(logical).await
    }

    pub async fn move_revisions(&self, from: &Path, to: &Path, is_folder: bool) -> LifecycleOutcome {
        self.lifecycle.move_revisions(from, to, is_folder).await
    }

    pub async fn remove_revisions(&self, logical: &Path, is_folder: bool) -> LifecycleOutcome {
        self.lifecycle.remove_revisions(logical, is_folder).await
    }

    /// Log file that holds the history of `logical`
    #[must_use]
    pub fn log_path(&self, logical: &Path) -> PathBuf {
        self.mapper().log_path(logical)
    }

    fn differ(&self) -> &dyn Differ {
        self.reconstructor.differ()
    }
}
