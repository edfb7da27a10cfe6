// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Command dispatcher: routes `revisions` requests to the engine and
//! broadcasts the results

use crate::broadcast::Broadcaster;
use crate::error::Result;
use crate::protocol::{Audience, Envelope, HistoryBody, RevisionMessage, RevisionRequest};
use diagnostics::*;
use revlog::{LifecycleOutcome, PendingSave, RevisionEngine};
use serde_json::Value;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// What `accept` did with a message
#[derive(Debug)]
pub enum Accepted {
    /// Not a `revisions` command; left for other handlers
    Ignored,
    /// A `revisions` command that could not be decoded; logged and dropped
    Rejected,
    /// Handled with no further work
    Completed,
    /// Remaining work runs on this task
    Running(JoinHandle<()>),
}

impl Accepted {
    /// Whether the message was claimed by this dispatcher
    #[must_use]
    pub fn is_handled(&self) -> bool {
        !matches!(self, Accepted::Ignored)
    }

    /// Wait for any spawned work to finish
    pub async fn finish(self) {
        if let Accepted::Running(handle) = self {
            if let Err(e) = handle.await {
                let reason = e.to_string();
                error!("revisions task failed: {reason}", reason);
            }
        }
    }
}

pub struct Dispatcher {
    engine: Arc<RevisionEngine>,
    broadcaster: Arc<dyn Broadcaster>,
}

impl Dispatcher {
    pub fn new(engine: Arc<RevisionEngine>, broadcaster: Arc<dyn Broadcaster>) -> Arc<Self> {
        Arc::new(Self { engine, broadcaster })
    }

    #[must_use]
    pub fn engine(&self) -> &Arc<RevisionEngine> {
        &self.engine
    }

    /// Take one inbound message from `user`.
    ///
    /// Saves are queued before this returns, so the order in which
    /// messages are accepted is the order in which they are persisted.
    pub fn accept(self: &Arc<Self>, user: &str, raw: &Value) -> Accepted {
        if !RevisionRequest::is_revisions_command(raw) {
            return Accepted::Ignored;
        }

        let request = match RevisionRequest::decode(raw) {
            Ok(request) => request,
            Err(e) => {
                let reason = e.to_string();
                warn!("dropping revisions request from {user}: {reason}", user, reason);
                return Accepted::Rejected;
            }
        };
        debug!("{user} sent {request}", user, request: request.name());

        match request {
            RevisionRequest::SaveRevision {
                path,
                revision,
                force_revision_list_response,
            } => {
                let pending = self.engine.submit_save(&path, revision);
                self.spawn(user, move |this, user| async move {
                    this.confirm_save(&user, path, pending, force_revision_list_response)
                        .await
                })
            }
            RevisionRequest::GetRevisionHistory { path, id, next_action } => {
                self.spawn(user, move |this, user| async move {
                    this.send_history(&user, path, id, next_action).await
                })
            }
            RevisionRequest::GetRealFileContents { path, next_action } => {
                self.spawn(user, move |this, user| async move {
                    this.send_contents(&user, path, next_action).await
                })
            }
            RevisionRequest::CloseFile { path } => {
                debug!("{path} closed", path: path.display().to_string());
                Accepted::Completed
            }
            RevisionRequest::RemoveRevision { path, is_folder } => {
                self.spawn(user, move |this, _user| async move {
                    let outcome = this.engine.remove_revisions(&path, is_folder).await;
                    log_outcome("remove", &path, &outcome);
                    Ok(())
                })
            }
            RevisionRequest::MoveRevision {
                path,
                new_path,
                is_folder,
            } => self.spawn(user, move |this, _user| async move {
                let outcome = this.engine.move_revisions(&path, &new_path, is_folder).await;
                log_outcome("move", &path, &outcome);
                Ok(())
            }),
        }
    }

    fn spawn<F, Fut>(self: &Arc<Self>, user: &str, work: F) -> Accepted
    where
        F: FnOnce(Arc<Self>, String) -> Fut,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let user = user.to_string();
        let fut = work(self.clone(), user.clone());
        Accepted::Running(tokio::spawn(async move {
            if let Err(e) = fut.await {
                let reason = e.to_string();
                error!("revisions request from {user} failed: {reason}", user, reason);
            }
        }))
    }

    async fn confirm_save(&self, user: &str, path: PathBuf, pending: PendingSave, force_list: bool) -> Result<()> {
        let info = pending.wait().await?;
        self.broadcaster
            .broadcast(
                Audience::Workspace,
                Envelope::new(RevisionMessage::ConfirmSave {
                    path: path.clone(),
                    ts: info.ts,
                }),
            )
            .await?;

        if force_list {
            let revisions = self.engine.load_all(&path).await?;
            self.broadcaster
                .broadcast(
                    Audience::User(user.to_string()),
                    Envelope::new(RevisionMessage::GetRevisionHistory {
                        body: HistoryBody { revisions },
                        path,
                        id: None,
                        next_action: None,
                    }),
                )
                .await?;
        }
        Ok(())
    }

    async fn send_history(&self, user: &str, path: PathBuf, id: Option<Value>, next_action: Option<Value>) -> Result<()> {
        let revisions = self.engine.get_revisions(&path).await?;
        self.broadcaster
            .broadcast(
                Audience::User(user.to_string()),
                Envelope::new(RevisionMessage::GetRevisionHistory {
                    body: HistoryBody { revisions },
                    path,
                    id: Some(id.unwrap_or(Value::Null)),
                    next_action,
                }),
            )
            .await
    }

    async fn send_contents(&self, user: &str, path: PathBuf, next_action: Option<Value>) -> Result<()> {
        let contents = match self.engine.read_live(&path).await {
            Ok(text) => Some(text),
            Err(e) => {
                let reason = e.to_string();
                warn!(
                    "could not read {path} for {user}: {reason}",
                    path: path.display().to_string(),
                    user,
                    reason
                );
                None
            }
        };
        self.broadcaster
            .broadcast(
                Audience::User(user.to_string()),
                Envelope::new(RevisionMessage::GetRealFileContents {
                    path,
                    next_action,
                    contents,
                }),
            )
            .await
    }
}

fn log_outcome(action: &str, path: &Path, outcome: &LifecycleOutcome) {
    let path = path.display().to_string();
    match outcome {
        LifecycleOutcome::Failed(reason) => {
            warn!("{action} of revisions for {path} failed: {reason}", action, path, reason: reason.as_str());
        }
        LifecycleOutcome::NoSource(_) => {
            debug!("{action}: no revisions stored for {path}", action, path);
        }
        LifecycleOutcome::Moved { .. } | LifecycleOutcome::Removed(_) => {
            debug!("{action} of revisions for {path} done", action, path);
        }
    }
}
