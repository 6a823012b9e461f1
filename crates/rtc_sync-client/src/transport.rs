// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! The seam between [`SyncClient`](crate::SyncClient) and the network.
//!
//! A [`Transport`] opens one [`Session`] per sync call. The session owns all
//! network resources for that call and releases them when dropped, which
//! happens on every exit path including timeout and cancellation.
//!
//! [`UdpTransport`](crate::udp::UdpTransport) is the production
//! implementation; tests substitute their own.

use async_trait::async_trait;
use rtc_proto::message::{Request, Response};

use crate::error::TransportError;
use crate::target::SyncTarget;

/// Opens sessions to nodes.
#[async_trait]
pub trait Transport: Send + Sync {
    /// The per-call session type.
    type Session: Session;

    /// Establish a session with `target` (resolve, bind, connect).
    async fn open(&self, target: &SyncTarget) -> Result<Self::Session, TransportError>;
}

/// One request/response exchange channel to a node.
#[async_trait]
pub trait Session: Send {
    /// Send `request` and wait for the matching response.
    ///
    /// Implementations may retransmit at the message layer but must not
    /// impose an overall deadline; the caller bounds the wait.
    async fn exchange(&mut self, request: &Request) -> Result<Response, TransportError>;
}
