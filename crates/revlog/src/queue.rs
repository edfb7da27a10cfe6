// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Save queue: one worker, one save in flight, FIFO across every path
//!
//! ```text
//!   SaveQueue (Clone)       mpsc       worker task
//!   ┌──────────────┐  ───────────▶  ┌──────────────────────┐
//!   │ .submit()    │                │ LogStore::save()     │
//!   │              │  ◀───────────  │ one job at a time    │
//!   └──────────────┘    oneshot     └──────────────────────┘
//! ```

use crate::error::{Result, RevLogError};
use crate::schema::{RevisionInfo, RevisionRecord};
use crate::store::LogStore;
use diagnostics::*;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

struct SaveJob {
    path: PathBuf,
    revision: RevisionRecord,
    reply: oneshot::Sender<Result<RevisionInfo>>,
}

/// Handle for submitting saves to the worker
#[derive(Clone)]
pub struct SaveQueue {
    tx: mpsc::UnboundedSender<SaveJob>,
}

/// A submitted save whose outcome has not been observed yet
pub struct PendingSave {
    rx: oneshot::Receiver<Result<RevisionInfo>>,
}

impl PendingSave {
    /// Wait for the worker to finish this save
    pub async fn wait(self) -> Result<RevisionInfo> {
        self.rx.await.unwrap_or(Err(RevLogError::QueueClosed))
    }
}

impl SaveQueue {
    /// Spawn the worker on the current tokio runtime.
    ///
    /// The worker exits once every `SaveQueue` clone has been dropped and
    /// the backlog is drained.
    pub fn start(store: Arc<LogStore>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let _worker = tokio::spawn(run(store, rx));
        Self { tx }
    }

    /// Place a save at the back of the queue.
    ///
    /// The position is fixed when this returns; awaiting the
    /// [`PendingSave`] only observes the result.
    pub fn submit(&self, path: PathBuf, revision: RevisionRecord) -> PendingSave {
        let (reply, rx) = oneshot::channel();
        // A send failure drops the job and its reply sender, which the
        // pending save reports as QueueClosed.
        let _ = self.tx.send(SaveJob {
            path,
            revision,
            reply,
        });
        PendingSave { rx }
    }

    /// Submit and wait
    pub async fn enqueue(&self, path: PathBuf, revision: RevisionRecord) -> Result<RevisionInfo> {
        self.submit(path, revision).wait().await
    }
}

async fn run(store: Arc<LogStore>, mut rx: mpsc::UnboundedReceiver<SaveJob>) {
    let mut seq: u64 = 0;
    while let Some(job) = rx.recv().await {
        seq += 1;
        let path = job.path.display().to_string();
        debug!("save #{seq} started for {path}", seq, path: path.as_str());

        let result = store.save(&job.path, job.revision).await;
        if let Err(e) = &result {
            let reason = e.to_string();
            warn!("save #{seq} for {path} failed: {reason}", seq, path: path.as_str(), reason);
        }

        // The submitter may have stopped waiting; the save still happened.
        let _ = job.reply.send(result);
    }
    debug!("save queue drained after {seq} jobs", seq);
}
