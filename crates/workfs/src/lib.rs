// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! WorkFS - the filesystem primitives the revision store is built on
//!
//! Every path handed to a [`WorkspaceFs`] is relative to the workspace
//! root. Two implementations are provided: [`HostFs`] maps the workspace
//! onto a host directory through `tokio::fs`, and [`MemoryFs`] keeps the
//! whole tree in memory for tests.

use async_trait::async_trait;
use std::path::Path;

mod error;
mod host;
mod memory;
pub mod path;

pub use error::{Error, Result};
pub use host::HostFs;
pub use memory::MemoryFs;

/// Async filesystem operations used by the revision store.
///
/// Each method is a single suspension point: it either completes or
/// reports one error, and never leaves a handle open behind it.
#[async_trait]
pub trait WorkspaceFs: Send + Sync {
    /// True when a file or directory exists at `path`.
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Read a whole file as UTF-8 text.
    async fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Create or truncate `path` and write `contents`.
    async fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;

    /// Atomically create `path` with `contents`, failing with
    /// [`Error::AlreadyExists`] if anything is already there.
    async fn write_new(&self, path: &Path, contents: &[u8]) -> Result<()>;

    /// Append `contents` to an existing file in one write call.
    async fn append(&self, path: &Path, contents: &[u8]) -> Result<()>;

    /// Rename a file or a whole directory tree.
    async fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    /// Create a directory and any missing parents. Succeeds if it exists.
    async fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Remove a single file.
    async fn remove_file(&self, path: &Path) -> Result<()>;

    /// Remove a directory and everything below it.
    async fn remove_dir_all(&self, path: &Path) -> Result<()>;
}
