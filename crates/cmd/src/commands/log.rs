use anyhow::Result;
use revlog::reconstruct::sorted_timestamps;
use std::path::Path;

use crate::common::{RevsContext, format_ts};

/// List the revisions of `path`, oldest first
pub async fn log_command<F>(ctx: &RevsContext, path: &str, mut handler: F) -> Result<()>
where
    F: FnMut(String),
{
    let engine = ctx.open_engine()?;
    let revisions = engine.load_all(Path::new(path)).await?;

    for ts in sorted_timestamps(&revisions, None) {
        let Some(record) = revisions.get(&ts) else {
            continue;
        };
        let mut flags = Vec::new();
        if record.silentsave {
            flags.push("silent");
        }
        if record.restoring {
            flags.push("restoring");
        }
        handler(format!(
            "{}  {}  {:>8}  {}\n",
            ts,
            format_ts(ts),
            record.length,
            flags.join(",")
        ));
    }
    Ok(())
}
