// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::error::{Result, RevLogError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Default hidden directory holding the mirrored logs
pub const DEFAULT_ROOT: &str = ".revisions";

/// Default extension of a log file
pub const DEFAULT_SUFFIX: &str = "rev";

pub const ROOT_ENV_VAR: &str = "REVS_ROOT";
pub const SUFFIX_ENV_VAR: &str = "REVS_SUFFIX";
pub const FIRST_SAVE_ENV_VAR: &str = "REVS_FIRST_SAVE";

/// What a save does when the file has no log yet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FirstSavePolicy {
    /// Persist only the seed (empty -> live content); the submitted record
    /// is not written
    #[default]
    SeedOnly,
    /// Persist the seed, then append the submitted record
    SeedThenAppend,
}

impl FromStr for FirstSavePolicy {
    type Err = RevLogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "seed-only" => Ok(FirstSavePolicy::SeedOnly),
            "seed-then-append" => Ok(FirstSavePolicy::SeedThenAppend),
            other => Err(RevLogError::Config(format!(
                "unknown first-save policy '{other}' (expected seed-only or seed-then-append)"
            ))),
        }
    }
}

/// Storage layout and save behavior of a revision engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RevisionConfig {
    /// Workspace-relative directory mirroring the workspace tree
    pub root: PathBuf,
    /// Extension appended to every log file
    pub suffix: String,
    pub first_save: FirstSavePolicy,
}

impl Default for RevisionConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
            suffix: DEFAULT_SUFFIX.to_string(),
            first_save: FirstSavePolicy::default(),
        }
    }
}

impl RevisionConfig {
    /// Apply REVS_ROOT, REVS_SUFFIX and REVS_FIRST_SAVE from any key/value
    /// source (the environment, tests)
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup(ROOT_ENV_VAR) {
            self.root = PathBuf::from(root);
        }
        if let Some(suffix) = lookup(SUFFIX_ENV_VAR) {
            self.suffix = suffix;
        }
        if let Some(policy) = lookup(FIRST_SAVE_ENV_VAR) {
            self.first_save = policy.parse()?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Reject layouts that cannot mirror a workspace
    pub fn validate(&self) -> Result<()> {
        if self.root.as_os_str().is_empty() {
            return Err(RevLogError::Config("revision root must not be empty".to_string()));
        }
        if self.suffix.is_empty() || self.suffix.contains(['/', '\\', '.']) {
            return Err(RevLogError::Config(format!(
                "log suffix '{}' must be a non-empty bare extension",
                self.suffix
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = RevisionConfig::default();
        assert_eq!(config.root, PathBuf::from(".revisions"));
        assert_eq!(config.suffix, "rev");
        assert_eq!(config.first_save, FirstSavePolicy::SeedOnly);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let env = HashMap::from([
            (ROOT_ENV_VAR, ".history"),
            (FIRST_SAVE_ENV_VAR, "seed-then-append"),
        ]);
        let config = RevisionConfig::default()
            .with_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.root, PathBuf::from(".history"));
        assert_eq!(config.suffix, "rev");
        assert_eq!(config.first_save, FirstSavePolicy::SeedThenAppend);
    }

    #[test]
    fn test_bad_values_rejected() {
        let bad_policy = RevisionConfig::default()
            .with_overrides(|k| (k == FIRST_SAVE_ENV_VAR).then(|| "sometimes".to_string()));
        assert!(matches!(bad_policy, Err(RevLogError::Config(_))));

        let bad_suffix = RevisionConfig::default()
            .with_overrides(|k| (k == SUFFIX_ENV_VAR).then(|| "a.b".to_string()));
        assert!(matches!(bad_suffix, Err(RevLogError::Config(_))));
    }

    #[test]
    fn test_deserialize_partial_json() {
        let config: RevisionConfig =
            serde_json::from_str(r#"{"suffix":"hist","firstSave":"seed-then-append"}"#).unwrap();
        assert_eq!(config.root, PathBuf::from(DEFAULT_ROOT));
        assert_eq!(config.suffix, "hist");
        assert_eq!(config.first_save, FirstSavePolicy::SeedThenAppend);
    }
}
