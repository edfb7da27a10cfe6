// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

// Error types for revision log operations
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, RevLogError>;

#[derive(Debug, thiserror::Error)]
pub enum RevLogError {
    #[error("Filesystem error: {0}")]
    Fs(#[from] workfs::Error),

    #[error("Revision log not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("No revisions to reconstruct from")]
    EmptyHistory,

    #[error("Malformed revision in {} at line {line}: {source}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Save queue has shut down")]
    QueueClosed,
}
