use anyhow::{Result, anyhow};
use revlog::LifecycleOutcome;
use std::path::Path;

use crate::common::RevsContext;

/// Move the stored history of a file or folder
pub async fn mv_command<F>(ctx: &RevsContext, from: &str, to: &str, is_folder: bool, mut handler: F) -> Result<()>
where
    F: FnMut(String),
{
    let engine = ctx.open_engine()?;
    match engine.move_revisions(Path::new(from), Path::new(to), is_folder).await {
        LifecycleOutcome::Moved { from, to } => {
            handler(format!("{} -> {}\n", from.display(), to.display()));
            Ok(())
        }
        LifecycleOutcome::NoSource(path) => {
            handler(format!("no revisions at {}\n", path.display()));
            Ok(())
        }
        LifecycleOutcome::Removed(_) => Ok(()),
        LifecycleOutcome::Failed(reason) => Err(anyhow!("move failed: {}", reason)),
    }
}
