// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::error::{Error, Result};
use crate::path::normalize;
use crate::WorkspaceFs;
use async_trait::async_trait;
use diagnostics::*;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Host filesystem rooted at a workspace directory.
///
/// Workspace-relative paths are normalized and joined onto the root; a
/// path that climbs out of the root is refused before touching the disk.
#[derive(Debug, Clone)]
pub struct HostFs {
    root: PathBuf,
}

impl HostFs {
    /// Create a host filesystem rooted at `root`.
    ///
    /// The directory must exist and be a directory.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        let canonical = root.canonicalize().map_err(|e| Error::from_io(root, e))?;
        if !canonical.is_dir() {
            return Err(Error::not_a_directory(canonical));
        }
        Ok(Self { root: canonical })
    }

    /// The host directory that workspace paths resolve against
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> Result<PathBuf> {
        Ok(self.root.join(normalize(path)?))
    }
}

#[async_trait]
impl WorkspaceFs for HostFs {
    async fn exists(&self, path: &Path) -> Result<bool> {
        let full = self.resolve(path)?;
        tokio::fs::try_exists(&full)
            .await
            .map_err(|e| Error::from_io(path, e))
    }

    async fn read_to_string(&self, path: &Path) -> Result<String> {
        let full = self.resolve(path)?;
        tokio::fs::read_to_string(&full)
            .await
            .map_err(|e| Error::from_io(path, e))
    }

    async fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let full = self.resolve(path)?;
        tokio::fs::write(&full, contents)
            .await
            .map_err(|e| Error::from_io(path, e))
    }

    async fn write_new(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let full = self.resolve(path)?;
        let dir = full.parent().map_or_else(|| self.root.clone(), Path::to_path_buf);
        let contents = contents.to_vec();

        // The contents go into a temp file that is then linked into place, so
        // the file never becomes visible half written.
        let linked = tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            use std::io::Write as _;
            let mut temp = tempfile::NamedTempFile::new_in(dir)?;
            temp.write_all(&contents)?;
            temp.flush()?;
            let _file = temp.persist_noclobber(full).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| Error::from_io(path, std::io::Error::other(e)))?;
        linked.map_err(|e| Error::from_io(path, e))
    }

    async fn append(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let full = self.resolve(path)?;
        let mut file = tokio::fs::OpenOptions::new()
            .append(true)
            .open(&full)
            .await
            .map_err(|e| Error::from_io(path, e))?;
        file.write_all(contents)
            .await
            .map_err(|e| Error::from_io(path, e))?;
        file.flush().await.map_err(|e| Error::from_io(path, e))
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let from_full = self.resolve(from)?;
        let to_full = self.resolve(to)?;
        debug!("host rename {source} -> {dest}", source: from.display().to_string(), dest: to.display().to_string());
        tokio::fs::rename(&from_full, &to_full)
            .await
            .map_err(|e| Error::from_io(from, e))
    }

    async fn create_dir_all(&self, path: &Path) -> Result<()> {
        let full = self.resolve(path)?;
        tokio::fs::create_dir_all(&full)
            .await
            .map_err(|e| Error::from_io(path, e))
    }

    async fn remove_file(&self, path: &Path) -> Result<()> {
        let full = self.resolve(path)?;
        tokio::fs::remove_file(&full)
            .await
            .map_err(|e| Error::from_io(path, e))
    }

    async fn remove_dir_all(&self, path: &Path) -> Result<()> {
        let full = self.resolve(path)?;
        if full == self.root {
            return Err(Error::escapes_root(path));
        }
        tokio::fs::remove_dir_all(&full)
            .await
            .map_err(|e| Error::from_io(path, e))
    }
}
