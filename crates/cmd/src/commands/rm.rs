use anyhow::{Result, anyhow};
use revlog::LifecycleOutcome;
use std::path::Path;

use crate::common::RevsContext;

/// Delete the stored history of a file or folder
pub async fn rm_command<F>(ctx: &RevsContext, path: &str, is_folder: bool, mut handler: F) -> Result<()>
where
    F: FnMut(String),
{
    let engine = ctx.open_engine()?;
    match engine.remove_revisions(Path::new(path), is_folder).await {
        LifecycleOutcome::Removed(path) => {
            handler(format!("removed {}\n", path.display()));
            Ok(())
        }
        LifecycleOutcome::NoSource(path) => {
            handler(format!("no revisions at {}\n", path.display()));
            Ok(())
        }
        LifecycleOutcome::Moved { .. } => Ok(()),
        LifecycleOutcome::Failed(reason) => Err(anyhow!("remove failed: {}", reason)),
    }
}
