// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

// Error types for the command relay

pub type Result<T> = std::result::Result<T, RelayError>;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Malformed revisions request: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Envelope encoding error: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Revision store error: {0}")]
    RevLog(#[from] revlog::RevLogError),

    #[error("Broadcast channel closed")]
    Closed,
}
