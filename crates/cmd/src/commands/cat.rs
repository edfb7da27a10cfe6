use anyhow::Result;
use std::path::Path;

use crate::common::RevsContext;

/// Print `path` as of revision `at`, or as of its latest revision
pub async fn cat_command<F>(ctx: &RevsContext, path: &str, at: Option<i64>, mut handler: F) -> Result<()>
where
    F: FnMut(String),
{
    let engine = ctx.open_engine()?;
    let content = engine.content_at(Path::new(path), at).await?;
    handler(content);
    Ok(())
}
