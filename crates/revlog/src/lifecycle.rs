// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Lifecycle manager: mirrors moves and deletes onto the revision tree
//!
//! Both operations fail softly. Errors are logged and surface only as
//! [`LifecycleOutcome::Failed`]; nothing here returns `Err`.

use crate::error::Result;
use crate::path::PathMapper;
use diagnostics::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use workfs::WorkspaceFs;
use workfs::path::dirname;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleOutcome {
    Moved { from: PathBuf, to: PathBuf },
    Removed(PathBuf),
    /// Nothing was stored for the source path
    NoSource(PathBuf),
    Failed(String),
}

pub struct Lifecycle {
    fs: Arc<dyn WorkspaceFs>,
    mapper: PathMapper,
}

impl Lifecycle {
    pub fn new(fs: Arc<dyn WorkspaceFs>, mapper: PathMapper) -> Self {
        Self { fs, mapper }
    }

    /// Move the history of `from` (a file, or a folder's whole subtree) to `to`
    pub async fn move_revisions(&self, from: &Path, to: &Path, is_folder: bool) -> LifecycleOutcome {
        let from_path = self.mapper.map_path(from, is_folder);
        let to_path = self.mapper.map_path(to, is_folder);

        match self.try_move(&from_path, &to_path).await {
            Ok(outcome) => outcome,
            Err(e) => {
                let reason = e.to_string();
                warn!(
                    "could not move revisions {source} to {dest}: {reason}",
                    source: from_path.display().to_string(),
                    dest: to_path.display().to_string(),
                    reason: reason.as_str()
                );
                LifecycleOutcome::Failed(reason)
            }
        }
    }

    async fn try_move(&self, from: &Path, to: &Path) -> Result<LifecycleOutcome> {
        if !self.fs.exists(from).await? {
            debug!("no revisions at {source}, nothing to move", source: from.display().to_string());
            return Ok(LifecycleOutcome::NoSource(from.to_path_buf()));
        }

        if let Some(parent) = dirname(to) {
            if !self.fs.exists(&parent).await? {
                self.fs.create_dir_all(&parent).await?;
            }
        }

        self.fs.rename(from, to).await?;
        info!(
            "moved revisions {source} to {dest}",
            source: from.display().to_string(),
            dest: to.display().to_string()
        );
        Ok(LifecycleOutcome::Moved {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
        })
    }

    /// Delete the log of a file, or the mirrored subtree of a folder
    pub async fn remove_revisions(&self, logical: &Path, is_folder: bool) -> LifecycleOutcome {
        let path = self.mapper.map_path(logical, is_folder);
        let result = if is_folder {
            self.fs.remove_dir_all(&path).await
        } else {
            self.fs.remove_file(&path).await
        };

        match result {
            Ok(()) => {
                info!("removed revisions {path}", path: path.display().to_string());
                LifecycleOutcome::Removed(path)
            }
            Err(e) if e.is_not_found() => {
                debug!("no revisions at {path}, nothing to remove", path: path.display().to_string());
                LifecycleOutcome::NoSource(path)
            }
            Err(e) => {
                let reason = e.to_string();
                warn!(
                    "could not remove revisions {path}: {reason}",
                    path: path.display().to_string(),
                    reason: reason.as_str()
                );
                LifecycleOutcome::Failed(reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use workfs::MemoryFs;

    async fn tracked(fs: &MemoryFs, files: &[&str]) {
        for file in files {
            if let Some(parent) = dirname(file) {
                fs.create_dir_all(&parent).await.unwrap();
            }
            fs.write(Path::new(file), b"{}\n").await.unwrap();
        }
    }

    fn lifecycle(fs: &MemoryFs) -> Lifecycle {
        Lifecycle::new(Arc::new(fs.clone()), PathMapper::new(".revisions", "rev"))
    }

    #[tokio::test]
    async fn test_move_file_creates_destination_parent() {
        let fs = MemoryFs::new();
        tracked(&fs, &[".revisions/a.txt.rev"]).await;

        let outcome = lifecycle(&fs)
            .move_revisions(Path::new("a.txt"), Path::new("deep/er/b.txt"), false)
            .await;

        assert_eq!(
            outcome,
            LifecycleOutcome::Moved {
                from: PathBuf::from(".revisions/a.txt.rev"),
                to: PathBuf::from(".revisions/deep/er/b.txt.rev"),
            }
        );
        assert_eq!(fs.list_files().await, vec![PathBuf::from(".revisions/deep/er/b.txt.rev")]);
    }

    #[tokio::test]
    async fn test_move_missing_source_is_silent() {
        let fs = MemoryFs::new();
        let outcome = lifecycle(&fs)
            .move_revisions(Path::new("never.txt"), Path::new("other.txt"), false)
            .await;
        assert!(matches!(outcome, LifecycleOutcome::NoSource(_)));
        assert!(!fs.exists(Path::new(".revisions")).await.unwrap());
    }

    #[tokio::test]
    async fn test_move_folder_moves_subtree() {
        let fs = MemoryFs::new();
        tracked(&fs, &[".revisions/src/a.rs.rev", ".revisions/src/lib/b.rs.rev", ".revisions/top.rev"]).await;

        let outcome = lifecycle(&fs)
            .move_revisions(Path::new("src"), Path::new("crates/core/src"), true)
            .await;
        assert!(matches!(outcome, LifecycleOutcome::Moved { .. }));

        assert_eq!(
            fs.list_files().await,
            vec![
                PathBuf::from(".revisions/crates/core/src/a.rs.rev"),
                PathBuf::from(".revisions/crates/core/src/lib/b.rs.rev"),
                PathBuf::from(".revisions/top.rev"),
            ]
        );
    }

    #[tokio::test]
    async fn test_remove_file_and_folder() {
        let fs = MemoryFs::new();
        tracked(&fs, &[".revisions/d/x.rev", ".revisions/d/y.rev", ".revisions/dz/z.rev", ".revisions/d.rev"]).await;
        let lifecycle = lifecycle(&fs);

        let outcome = lifecycle.remove_revisions(Path::new("d/x"), false).await;
        assert_eq!(outcome, LifecycleOutcome::Removed(PathBuf::from(".revisions/d/x.rev")));

        let outcome = lifecycle.remove_revisions(Path::new("d"), true).await;
        assert_eq!(outcome, LifecycleOutcome::Removed(PathBuf::from(".revisions/d")));

        assert_eq!(
            fs.list_files().await,
            vec![PathBuf::from(".revisions/d.rev"), PathBuf::from(".revisions/dz/z.rev")]
        );
    }

    #[tokio::test]
    async fn test_remove_untracked_is_no_source() {
        let fs = MemoryFs::new();
        let outcome = lifecycle(&fs).remove_revisions(Path::new("nothing.txt"), false).await;
        assert_eq!(outcome, LifecycleOutcome::NoSource(PathBuf::from(".revisions/nothing.txt.rev")));
    }

    #[tokio::test]
    async fn test_failures_are_reported_not_returned() {
        let fs = MemoryFs::new();
        // A file where the destination's parent directory should go.
        tracked(&fs, &[".revisions/a.txt.rev", ".revisions/blocker.rev", "blocker"]).await;
        fs.write(Path::new(".revisions/blocker"), b"not a dir").await.unwrap();

        let outcome = lifecycle(&fs)
            .move_revisions(Path::new("a.txt"), Path::new("blocker/a.txt"), false)
            .await;
        assert!(matches!(outcome, LifecycleOutcome::Failed(_)));
        assert!(fs.exists(Path::new(".revisions/a.txt.rev")).await.unwrap());
    }
}
