use anyhow::Result;
use std::path::Path;

use crate::common::{RevsContext, format_ts};

/// Record the live content of `path` as a new revision
pub async fn save_command<F>(ctx: &RevsContext, path: &str, mut handler: F) -> Result<()>
where
    F: FnMut(String),
{
    let engine = ctx.open_engine()?;
    let info = engine.record_snapshot(Path::new(path)).await?;
    handler(format!(
        "{} {} {}\n",
        info.logical_path.display(),
        info.ts,
        format_ts(info.ts)
    ));
    Ok(())
}
