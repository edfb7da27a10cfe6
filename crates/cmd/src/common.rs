// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use anyhow::{Context, Result, anyhow};
use diagnostics::*;
use revlog::{CharDiffer, FirstSavePolicy, RevisionConfig, RevisionEngine};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use workfs::HostFs;

/// Environment variable naming the workspace directory
pub const WORKSPACE_ENV_VAR: &str = "REVS_WORKSPACE";

/// Layout settings given on the command line; each one wins over every
/// other source
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub root: Option<PathBuf>,
    pub suffix: Option<String>,
    pub first_save: Option<String>,
}

/// Everything a command needs to open the revision store of one workspace
#[derive(Debug, Clone, Default)]
pub struct RevsContext {
    workspace: Option<PathBuf>,
    config_path: Option<PathBuf>,
    overrides: ConfigOverrides,
}

impl RevsContext {
    #[must_use]
    pub fn new(workspace: Option<PathBuf>) -> Self {
        Self {
            workspace,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_config_file(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    #[must_use]
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// `--workspace`, else REVS_WORKSPACE, else the current directory
    pub fn workspace_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.workspace {
            return Ok(path.clone());
        }
        if let Ok(path) = env::var(WORKSPACE_ENV_VAR) {
            return Ok(PathBuf::from(path));
        }
        env::current_dir().context("no workspace given and the current directory is unavailable")
    }

    /// Defaults, then the config file, then the environment, then flags
    pub fn load_config(&self) -> Result<RevisionConfig> {
        let base = match &self.config_path {
            Some(path) => read_config_file(path)?,
            None => RevisionConfig::default(),
        };
        let mut config = base.with_overrides(|key| env::var(key).ok())?;

        if let Some(root) = &self.overrides.root {
            config.root = root.clone();
        }
        if let Some(suffix) = &self.overrides.suffix {
            config.suffix = suffix.clone();
        }
        if let Some(policy) = &self.overrides.first_save {
            config.first_save = policy.parse::<FirstSavePolicy>()?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Open the engine over the workspace directory
    pub fn open_engine(&self) -> Result<RevisionEngine> {
        let workspace = self.workspace_path()?;
        let config = self.load_config()?;
        let fs = HostFs::new(&workspace)
            .map_err(|e| anyhow!("cannot open workspace {}: {}", workspace.display(), e))?;
        debug!("opening workspace {workspace}", workspace: workspace.display().to_string());
        Ok(RevisionEngine::new(Arc::new(fs), Arc::new(CharDiffer), config)?)
    }
}

fn read_config_file(path: &Path) -> Result<RevisionConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read config file {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid config file {}", path.display()))
}

/// Milliseconds since the epoch as an RFC 3339 UTC time
#[must_use]
pub fn format_ts(ts: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ts)
        .map(|t| t.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
        .unwrap_or_else(|| ts.to_string())
}
