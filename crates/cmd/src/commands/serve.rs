use anyhow::Result;
use diagnostics::*;
use relay::{Accepted, ChannelBroadcaster, Delivery, Dispatcher};
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::JoinSet;

use crate::common::RevsContext;

/// Answer `revisions` messages read one per line from `input`.
///
/// Every delivery is handed to `handler` as a single JSON line of the form
/// `{"audience": ..., "message": ...}`. Returns once `input` is exhausted
/// and every accepted request has finished.
pub async fn serve_command<R, F>(ctx: &RevsContext, user: &str, input: R, mut handler: F) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    F: FnMut(String),
{
    let engine = Arc::new(ctx.open_engine()?);
    let (broadcaster, mut rx) = ChannelBroadcaster::new();
    let dispatcher = Dispatcher::new(engine, Arc::new(broadcaster));

    let mut lines = input.lines();
    let mut running = JoinSet::new();
    let mut line_no: usize = 0;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                line_no += 1;
                if line.trim().is_empty() {
                    continue;
                }
                let raw: Value = match serde_json::from_str(&line) {
                    Ok(raw) => raw,
                    Err(e) => {
                        let reason = e.to_string();
                        warn!("skipping line {line_no}: {reason}", line_no, reason);
                        continue;
                    }
                };
                let accepted = dispatcher.accept(user, &raw);
                match accepted {
                    Accepted::Running(_) => {
                        let _ = running.spawn(accepted.finish());
                    }
                    Accepted::Ignored => debug!("line {line_no} is not a revisions command", line_no),
                    Accepted::Rejected | Accepted::Completed => {}
                }
            }
            Some(delivery) = rx.recv() => emit_delivery(&delivery, &mut handler)?,
            Some(joined) = running.join_next(), if !running.is_empty() => reap(joined),
        }
    }

    while let Some(joined) = running.join_next().await {
        reap(joined);
    }
    // Dropping the dispatcher drops the last sender, which ends the drain.
    drop(dispatcher);
    while let Some(delivery) = rx.recv().await {
        emit_delivery(&delivery, &mut handler)?;
    }
    info!("served {count} lines for {user}", count: line_no, user);
    Ok(())
}

fn reap(joined: std::result::Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        let reason = e.to_string();
        warn!("request task failed: {reason}", reason);
    }
}

fn emit_delivery<F>(delivery: &Delivery, handler: &mut F) -> Result<()>
where
    F: FnMut(String),
{
    let mut line = serde_json::to_string(delivery)?;
    line.push('\n');
    handler(line);
    Ok(())
}
