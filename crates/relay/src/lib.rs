// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Relay - the message boundary between editor clients and the revision
//! engine
//!
//! Inbound JSON messages are decoded once into [`RevisionRequest`], routed
//! by the [`Dispatcher`] and answered with [`Envelope`]s delivered through
//! a [`Broadcaster`].

pub mod broadcast;
pub mod dispatcher;
pub mod error;
pub mod protocol;

pub use broadcast::{Broadcaster, ChannelBroadcaster, Delivery};
pub use dispatcher::{Accepted, Dispatcher};
pub use error::{RelayError, Result};
pub use protocol::{Audience, Envelope, HistoryBody, RevisionMessage, RevisionRequest};
