// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::error::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// Strips the root component from a path, if present
pub fn strip_root<P: AsRef<Path>>(path: P) -> PathBuf {
    path.as_ref()
        .components()
        .skip_while(|c| matches!(c, Component::RootDir | Component::Prefix(_)))
        .collect()
}

/// Normalizes a workspace-relative path lexically.
///
/// Leading roots and `.` components are dropped and `..` pops the previous
/// component. A `..` that would climb above the workspace root is rejected.
pub fn normalize<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let mut parts: Vec<&std::ffi::OsStr> = Vec::new();
    for component in path.as_ref().components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
            Component::ParentDir => {
                if parts.pop().is_none() {
                    return Err(Error::escapes_root(path.as_ref()));
                }
            }
            Component::Normal(name) => parts.push(name),
        }
    }
    Ok(parts.into_iter().collect())
}

/// Extracts the directory component of a path as a pathbuf, if possible
pub fn dirname<P: AsRef<Path>>(path: P) -> Option<PathBuf> {
    path.as_ref()
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|x| x.to_path_buf())
}
