// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Wire messages exchanged with editor clients
//!
//! Inbound: `{"command": "revisions", "subCommand": ..., ...}`.
//! Outbound: `{"type": "revision", "subtype": ..., ...}`.

use crate::error::{RelayError, Result};
use revlog::{RevisionMap, RevisionRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

/// Value of `command` this relay answers to
pub const REVISIONS_COMMAND: &str = "revisions";

/// Value of `type` on every outbound envelope
pub const REVISION_TYPE: &str = "revision";

/// A decoded `revisions` request
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "subCommand", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum RevisionRequest {
    /// Persist a revision the client already computed
    SaveRevision {
        path: PathBuf,
        revision: RevisionRecord,
        #[serde(default)]
        force_revision_list_response: bool,
    },
    GetRevisionHistory {
        path: PathBuf,
        #[serde(default)]
        id: Option<Value>,
        #[serde(default)]
        next_action: Option<Value>,
    },
    GetRealFileContents {
        path: PathBuf,
        #[serde(default)]
        next_action: Option<Value>,
    },
    /// Accepted for compatibility; nothing is persisted
    CloseFile { path: PathBuf },
    RemoveRevision {
        path: PathBuf,
        #[serde(default)]
        is_folder: bool,
    },
    MoveRevision {
        path: PathBuf,
        new_path: PathBuf,
        #[serde(default)]
        is_folder: bool,
    },
}

impl RevisionRequest {
    /// True when `raw` is addressed to this relay, whatever its shape
    #[must_use]
    pub fn is_revisions_command(raw: &Value) -> bool {
        raw.get("command").and_then(Value::as_str) == Some(REVISIONS_COMMAND)
    }

    pub fn decode(raw: &Value) -> Result<Self> {
        Self::deserialize(raw).map_err(RelayError::Decode)
    }

    /// Short name for logging
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::SaveRevision { .. } => "saveRevision",
            Self::GetRevisionHistory { .. } => "getRevisionHistory",
            Self::GetRealFileContents { .. } => "getRealFileContents",
            Self::CloseFile { .. } => "closeFile",
            Self::RemoveRevision { .. } => "removeRevision",
            Self::MoveRevision { .. } => "moveRevision",
        }
    }
}

/// Who receives an envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Audience {
    /// Every user connected to the workspace
    Workspace,
    /// Only the user who made the request
    User(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryBody {
    pub revisions: RevisionMap,
}

/// Outbound message, tagged by `subtype`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "subtype", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum RevisionMessage {
    ConfirmSave {
        path: PathBuf,
        ts: i64,
    },
    GetRevisionHistory {
        body: HistoryBody,
        path: PathBuf,
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        next_action: Option<Value>,
    },
    GetRealFileContents {
        path: PathBuf,
        #[serde(skip_serializing_if = "Option::is_none")]
        next_action: Option<Value>,
        /// `None` (sent as `null`) when the live file could not be read
        contents: Option<String>,
    },
}

/// `{"type": "revision", ...message}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(flatten)]
    pub message: RevisionMessage,
}

impl Envelope {
    #[must_use]
    pub fn new(message: RevisionMessage) -> Self {
        Self {
            kind: REVISION_TYPE,
            message,
        }
    }

    pub fn to_value(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(RelayError::Encode)
    }
}
