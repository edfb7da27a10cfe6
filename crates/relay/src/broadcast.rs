// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use crate::error::{RelayError, Result};
use crate::protocol::{Audience, Envelope};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;

/// Delivers envelopes to connected users
#[async_trait]
pub trait Broadcaster: Send + Sync {
    async fn broadcast(&self, audience: Audience, envelope: Envelope) -> Result<()>;
}

/// One envelope addressed to an audience, already encoded
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Delivery {
    pub audience: Audience,
    pub message: Value,
}

/// Broadcaster that hands every delivery to an mpsc receiver
#[derive(Clone)]
pub struct ChannelBroadcaster {
    tx: mpsc::UnboundedSender<Delivery>,
}

impl ChannelBroadcaster {
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Delivery>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Broadcaster for ChannelBroadcaster {
    async fn broadcast(&self, audience: Audience, envelope: Envelope) -> Result<()> {
        let message = envelope.to_value()?;
        self.tx
            .send(Delivery { audience, message })
            .map_err(|_| RelayError::Closed)
    }
}
