// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};

pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by a [`crate::WorkspaceFs`] implementation
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Path not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Entry already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Is a directory: {}", .0.display())]
    IsADirectory(PathBuf),

    #[error("Permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("Path escapes workspace root: {}", .0.display())]
    EscapesRoot(PathBuf),

    #[error("Invalid UTF-8 in {}", .0.display())]
    InvalidUtf8(PathBuf),

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn not_found<P: AsRef<Path>>(path: P) -> Self {
        Error::NotFound(path.as_ref().to_path_buf())
    }

    pub fn already_exists<P: AsRef<Path>>(path: P) -> Self {
        Error::AlreadyExists(path.as_ref().to_path_buf())
    }

    pub fn not_a_directory<P: AsRef<Path>>(path: P) -> Self {
        Error::NotADirectory(path.as_ref().to_path_buf())
    }

    pub fn is_a_directory<P: AsRef<Path>>(path: P) -> Self {
        Error::IsADirectory(path.as_ref().to_path_buf())
    }

    pub fn escapes_root<P: AsRef<Path>>(path: P) -> Self {
        Error::EscapesRoot(path.as_ref().to_path_buf())
    }

    /// Classify a host I/O error against the path it was raised for.
    pub fn from_io<P: AsRef<Path>>(path: P, err: std::io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        match err.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound(path),
            std::io::ErrorKind::AlreadyExists => Error::AlreadyExists(path),
            std::io::ErrorKind::PermissionDenied => Error::PermissionDenied(path),
            std::io::ErrorKind::InvalidData => Error::InvalidUtf8(path),
            _ => Error::Io { path, source: err },
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Error::AlreadyExists(_))
    }
}
