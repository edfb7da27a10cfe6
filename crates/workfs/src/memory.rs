// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::error::{Error, Result};
use crate::path::normalize;
use crate::WorkspaceFs;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// In-memory workspace for tests and dry runs.
///
/// Every operation takes the state lock once, so each call is atomic with
/// respect to every other call, which is the same guarantee a single
/// `write(2)` gives on the host.
#[derive(Clone, Default)]
pub struct MemoryFs(Arc<Mutex<State>>);

#[derive(Default)]
struct State {
    files: BTreeMap<PathBuf, Vec<u8>>,
    // The root ("") is implicit and never stored.
    dirs: BTreeSet<PathBuf>,
}

impl State {
    fn is_dir(&self, path: &Path) -> bool {
        path.as_os_str().is_empty() || self.dirs.contains(path)
    }

    fn require_parent(&self, path: &Path) -> Result<()> {
        let parent = path.parent().unwrap_or(Path::new(""));
        if self.is_dir(parent) {
            Ok(())
        } else if self.files.contains_key(parent) {
            Err(Error::not_a_directory(parent))
        } else {
            Err(Error::not_found(parent))
        }
    }

    fn put_file(&mut self, path: PathBuf, contents: &[u8]) -> Result<()> {
        if self.is_dir(&path) {
            return Err(Error::is_a_directory(path));
        }
        self.require_parent(&path)?;
        let _ = self.files.insert(path, contents.to_vec());
        Ok(())
    }

    /// Move every entry at or below `from` so that it lives below `to`.
    fn move_tree(&mut self, from: &Path, to: &Path) {
        let rebase = |p: &Path| -> Option<PathBuf> {
            p.strip_prefix(from).ok().map(|rest| {
                if rest.as_os_str().is_empty() {
                    to.to_path_buf()
                } else {
                    to.join(rest)
                }
            })
        };

        let dirs: Vec<PathBuf> = self.dirs.iter().filter(|d| d.starts_with(from)).cloned().collect();
        for dir in dirs {
            let _ = self.dirs.remove(&dir);
            if let Some(moved) = rebase(&dir) {
                let _ = self.dirs.insert(moved);
            }
        }

        let files: Vec<PathBuf> = self.files.keys().filter(|f| f.starts_with(from)).cloned().collect();
        for file in files {
            if let (Some(contents), Some(moved)) = (self.files.remove(&file), rebase(&file)) {
                let _ = self.files.insert(moved, contents);
            }
        }
    }
}

impl MemoryFs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every file currently stored, in path order.
    pub async fn list_files(&self) -> Vec<PathBuf> {
        self.0.lock().await.files.keys().cloned().collect()
    }
}

#[async_trait]
impl WorkspaceFs for MemoryFs {
    async fn exists(&self, path: &Path) -> Result<bool> {
        let path = normalize(path)?;
        let state = self.0.lock().await;
        Ok(state.is_dir(&path) || state.files.contains_key(&path))
    }

    async fn read_to_string(&self, path: &Path) -> Result<String> {
        let path = normalize(path)?;
        let state = self.0.lock().await;
        match state.files.get(&path) {
            Some(bytes) => String::from_utf8(bytes.clone()).map_err(|_| Error::InvalidUtf8(path)),
            None if state.is_dir(&path) => Err(Error::is_a_directory(path)),
            None => Err(Error::not_found(path)),
        }
    }

    async fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let path = normalize(path)?;
        self.0.lock().await.put_file(path, contents)
    }

    async fn write_new(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let path = normalize(path)?;
        let mut state = self.0.lock().await;
        if state.files.contains_key(&path) || state.is_dir(&path) {
            return Err(Error::already_exists(path));
        }
        state.put_file(path, contents)
    }

    async fn append(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let path = normalize(path)?;
        let mut state = self.0.lock().await;
        match state.files.get_mut(&path) {
            Some(bytes) => {
                bytes.extend_from_slice(contents);
                Ok(())
            }
            None => Err(Error::not_found(path)),
        }
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let from = normalize(from)?;
        let to = normalize(to)?;
        let mut state = self.0.lock().await;

        if from.as_os_str().is_empty() || (to.starts_with(&from) && from != to) {
            return Err(Error::escapes_root(to));
        }
        state.require_parent(&to)?;

        if let Some(contents) = state.files.remove(&from) {
            if state.is_dir(&to) {
                let _ = state.files.insert(from, contents);
                return Err(Error::is_a_directory(to));
            }
            let _ = state.files.insert(to, contents);
            Ok(())
        } else if state.dirs.contains(&from) {
            if state.files.contains_key(&to) {
                return Err(Error::not_a_directory(to));
            }
            state.move_tree(&from, &to);
            Ok(())
        } else {
            Err(Error::not_found(from))
        }
    }

    async fn create_dir_all(&self, path: &Path) -> Result<()> {
        let path = normalize(path)?;
        let mut state = self.0.lock().await;
        let mut current = PathBuf::new();
        for component in path.components() {
            current.push(component);
            if state.files.contains_key(&current) {
                return Err(Error::not_a_directory(current));
            }
            let _ = state.dirs.insert(current.clone());
        }
        Ok(())
    }

    async fn remove_file(&self, path: &Path) -> Result<()> {
        let path = normalize(path)?;
        let mut state = self.0.lock().await;
        if state.files.remove(&path).is_some() {
            Ok(())
        } else if state.is_dir(&path) {
            Err(Error::is_a_directory(path))
        } else {
            Err(Error::not_found(path))
        }
    }

    async fn remove_dir_all(&self, path: &Path) -> Result<()> {
        let path = normalize(path)?;
        if path.as_os_str().is_empty() {
            return Err(Error::escapes_root(path));
        }
        let mut state = self.0.lock().await;
        if !state.dirs.contains(&path) {
            return if state.files.contains_key(&path) {
                Err(Error::not_a_directory(path))
            } else {
                Err(Error::not_found(path))
            };
        }
        state.dirs.retain(|d| !d.starts_with(&path));
        state.files.retain(|f, _| !f.starts_with(&path));
        Ok(())
    }
}
