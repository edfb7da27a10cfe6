// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use workfs::path::strip_root;

/// Maps logical workspace paths onto the mirrored revision tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMapper {
    root: PathBuf,
    suffix: String,
}

impl PathMapper {
    pub fn new<P: Into<PathBuf>, S: Into<String>>(root: P, suffix: S) -> Self {
        Self {
            root: root.into(),
            suffix: suffix.into(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// `root/<logical>` for directories, `root/<logical>.<suffix>` for files
    pub fn map_path<P: AsRef<Path>>(&self, logical: P, is_directory: bool) -> PathBuf {
        let mapped = self.root.join(strip_root(logical));
        if is_directory {
            return mapped;
        }
        let mut name: OsString = mapped.into_os_string();
        name.push(".");
        name.push(&self.suffix);
        PathBuf::from(name)
    }

    /// Log file for a logical file
    pub fn log_path<P: AsRef<Path>>(&self, logical: P) -> PathBuf {
        self.map_path(logical, false)
    }

    /// Mirrored directory for a logical directory
    pub fn dir_path<P: AsRef<Path>>(&self, logical: P) -> PathBuf {
        self.map_path(logical, true)
    }
}
