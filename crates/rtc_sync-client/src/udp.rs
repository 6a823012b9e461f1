// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! CoAP over UDP using tokio sockets.
//!
//! Each session binds an ephemeral socket connected to the node, so the
//! kernel filters datagrams from other sources and ICMP unreachable errors
//! surface on `recv`. Requests are sent Confirmable and retransmitted with
//! exponential back-off (RFC 7252 Section 4.2) until acknowledged.
//! Piggybacked and separate responses are both accepted.

use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hasher};
use std::net::SocketAddr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use rtc_proto::message::{Code, Frame, MessageKind, Request, Response};
use tokio::net::UdpSocket;
use tracing::{debug, warn};

use crate::error::TransportError;
use crate::target::SyncTarget;
use crate::transport::{Session, Transport};

/// Initial retransmission timeout (RFC 7252 `ACK_TIMEOUT`).
pub const ACK_TIMEOUT: Duration = Duration::from_secs(2);

/// Randomization applied to the initial timeout (RFC 7252 `ACK_RANDOM_FACTOR`).
pub const ACK_RANDOM_FACTOR: f64 = 1.5;

/// Retransmissions before giving up on an acknowledgement (RFC 7252 `MAX_RETRANSMIT`).
pub const MAX_RETRANSMIT: u32 = 4;

const TOKEN_LEN: usize = 4;
const RECV_BUF_LEN: usize = 1280;

/// Message-layer retransmission parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetransmitPolicy {
    /// Base timeout before the first retransmission.
    pub ack_timeout: Duration,
    /// The first timeout is drawn from `[ack_timeout, ack_timeout * random_factor)`.
    /// Values below 1.0 are treated as 1.0.
    pub random_factor: f64,
    /// Maximum number of retransmissions; 0 disables retransmission.
    pub max_retransmit: u32,
}

impl Default for RetransmitPolicy {
    fn default() -> Self {
        RetransmitPolicy {
            ack_timeout: ACK_TIMEOUT,
            random_factor: ACK_RANDOM_FACTOR,
            max_retransmit: MAX_RETRANSMIT,
        }
    }
}

impl RetransmitPolicy {
    /// Send once and never retransmit.
    pub fn disabled() -> Self {
        RetransmitPolicy {
            max_retransmit: 0,
            ..RetransmitPolicy::default()
        }
    }

    fn initial_timeout(&self) -> Duration {
        let factor = self.random_factor.max(1.0);
        // 53 random bits mapped onto [0, 1).
        let unit = (random_u64() >> 11) as f64 / (1u64 << 53) as f64;
        let secs = self.ack_timeout.as_secs_f64() * (1.0 + (factor - 1.0) * unit);
        // Non-finite or out-of-range products saturate.
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }
}

/// Random bits from the standard library's OS-seeded hasher, mixed with the clock.
fn random_u64() -> u64 {
    let mut h = RandomState::new().build_hasher();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    h.write_u128(nanos);
    h.finish()
}

/// Select the bind address matching the target's address family.
fn bind_addr_for(target: &SocketAddr) -> SocketAddr {
    match target {
        SocketAddr::V4(_) => SocketAddr::from(([0, 0, 0, 0], 0)),
        SocketAddr::V6(_) => SocketAddr::from(([0u16; 8], 0)),
    }
}

/// Opens UDP sessions to nodes.
#[derive(Clone, Copy, Debug, Default)]
pub struct UdpTransport {
    policy: RetransmitPolicy,
}

impl UdpTransport {
    /// Transport with the RFC 7252 default retransmission parameters.
    pub fn new() -> Self {
        UdpTransport::default()
    }

    /// Transport with custom retransmission parameters.
    pub fn with_policy(policy: RetransmitPolicy) -> Self {
        UdpTransport { policy }
    }

    /// Start configuring a transport.
    pub fn builder() -> UdpTransportBuilder {
        UdpTransportBuilder::default()
    }

    /// The retransmission parameters in use.
    pub fn policy(&self) -> RetransmitPolicy {
        self.policy
    }
}

#[async_trait]
impl Transport for UdpTransport {
    type Session = UdpSession;

    async fn open(&self, target: &SyncTarget) -> Result<UdpSession, TransportError> {
        let peer = target
            .resolve()
            .await?
            .first()
            .copied()
            .ok_or_else(|| TransportError::NoAddresses {
                host: target.host().to_string(),
            })?;
        let socket = UdpSocket::bind(bind_addr_for(&peer)).await?;
        socket.connect(peer).await?;
        debug!(%peer, local = ?socket.local_addr().ok(), "session opened");
        Ok(UdpSession {
            socket,
            peer,
            policy: self.policy,
            next_message_id: random_u64() as u16,
        })
    }
}

/// Builder for a [`UdpTransport`].
///
/// ```
/// use std::time::Duration;
/// use rtc_client::udp::UdpTransport;
///
/// let transport = UdpTransport::builder()
///     .ack_timeout(Duration::from_secs(1))
///     .max_retransmit(2)
///     .build();
/// assert_eq!(transport.policy().max_retransmit, 2);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct UdpTransportBuilder {
    policy: RetransmitPolicy,
}

impl UdpTransportBuilder {
    /// Base retransmission timeout (default: 2s).
    pub fn ack_timeout(mut self, timeout: Duration) -> Self {
        self.policy.ack_timeout = timeout;
        self
    }

    /// Randomization factor for the first timeout (default: 1.5).
    pub fn random_factor(mut self, factor: f64) -> Self {
        self.policy.random_factor = factor;
        self
    }

    /// Number of retransmissions before waiting silently (default: 4).
    pub fn max_retransmit(mut self, count: u32) -> Self {
        self.policy.max_retransmit = count;
        self
    }

    /// Build the transport.
    pub fn build(self) -> UdpTransport {
        UdpTransport::with_policy(self.policy)
    }
}

/// A connected UDP socket to one node. Dropping it closes the socket.
#[derive(Debug)]
pub struct UdpSession {
    socket: UdpSocket,
    peer: SocketAddr,
    policy: RetransmitPolicy,
    next_message_id: u16,
}

/// What to do with one received datagram.
enum Disposition {
    Done(Response),
    Acknowledged,
    Reset,
    Ignore,
}

impl UdpSession {
    /// Address of the node.
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    async fn send_empty(&self, kind: MessageKind, message_id: u16) -> Result<(), TransportError> {
        let datagram = Frame::empty(kind, message_id).encode()?;
        self.socket.send(&datagram).await?;
        Ok(())
    }

    /// Send an empty ACK or RST. Failures are logged; they never end the exchange.
    async fn answer(&self, kind: MessageKind, message_id: u16) {
        if let Err(e) = self.send_empty(kind, message_id).await {
            debug!(peer = %self.peer, ?kind, mid = message_id, error = %e, "failed to answer message");
        }
    }

    /// Match a received frame against the outstanding request.
    async fn dispose(&self, reply: &Frame, message_id: u16, token: &[u8]) -> Disposition {
        let ours = reply.message_id == message_id;
        match reply.kind {
            MessageKind::Acknowledgement if ours => {
                if reply.is_empty() {
                    return Disposition::Acknowledged;
                }
                if reply.token == token {
                    return reply.to_response().map_or(Disposition::Ignore, Disposition::Done);
                }
                Disposition::Ignore
            }
            MessageKind::Reset if ours => Disposition::Reset,
            MessageKind::Confirmable | MessageKind::NonConfirmable => {
                let matched = reply.token == token && matches!(reply.code, Code::Response(_));
                if reply.kind == MessageKind::Confirmable {
                    // Acknowledge our separate response; reject anything else.
                    let answer = if matched {
                        MessageKind::Acknowledgement
                    } else {
                        MessageKind::Reset
                    };
                    self.answer(answer, reply.message_id).await;
                }
                if matched {
                    return reply.to_response().map_or(Disposition::Ignore, Disposition::Done);
                }
                Disposition::Ignore
            }
            _ => Disposition::Ignore,
        }
    }
}

#[async_trait]
impl Session for UdpSession {
    async fn exchange(&mut self, request: &Request) -> Result<Response, TransportError> {
        let message_id = self.next_message_id;
        self.next_message_id = self.next_message_id.wrapping_add(1);
        let token = random_u64().to_be_bytes()[..TOKEN_LEN].to_vec();

        let frame = Frame::request(MessageKind::Confirmable, message_id, token.clone(), request);
        let datagram = frame.encode()?;
        self.socket.send(&datagram).await?;
        debug!(
            peer = %self.peer,
            message_id,
            method = request.method.as_str(),
            uri = %request.uri(),
            bytes = datagram.len(),
            "request sent"
        );

        let mut acknowledged = false;
        let mut retransmits = 0u32;
        let mut wait = self.policy.initial_timeout();
        // `None` once the next retransmission lies beyond any representable instant.
        let mut deadline = tokio::time::Instant::now().checked_add(wait);
        let mut buf = [0u8; RECV_BUF_LEN];

        loop {
            let retransmit_at =
                deadline.filter(|_| !acknowledged && retransmits < self.policy.max_retransmit);
            let len = if let Some(at) = retransmit_at {
                match tokio::time::timeout_at(at, self.socket.recv(&mut buf)).await {
                    Ok(received) => received?,
                    Err(_) => {
                        retransmits += 1;
                        wait = wait.saturating_mul(2);
                        deadline = tokio::time::Instant::now().checked_add(wait);
                        warn!(peer = %self.peer, message_id, retransmits, "no acknowledgement, retransmitting");
                        self.socket.send(&datagram).await?;
                        continue;
                    }
                }
            } else {
                self.socket.recv(&mut buf).await?
            };

            let reply = match Frame::decode(&buf[..len]) {
                Ok(reply) => reply,
                Err(e) => {
                    debug!(peer = %self.peer, error = %e, "ignoring undecodable datagram");
                    continue;
                }
            };

            match self.dispose(&reply, message_id, &token).await {
                Disposition::Done(response) => {
                    debug!(peer = %self.peer, message_id, code = %response.code, "response received");
                    return Ok(response);
                }
                Disposition::Acknowledged => {
                    if !acknowledged {
                        debug!(peer = %self.peer, message_id, "empty acknowledgement, awaiting separate response");
                    }
                    acknowledged = true;
                }
                Disposition::Reset => {
                    warn!(peer = %self.peer, message_id, "node reset the exchange");
                    return Err(TransportError::Reset);
                }
                Disposition::Ignore => {
                    debug!(peer = %self.peer, kind = ?reply.kind, mid = reply.message_id, "ignoring unrelated message");
                }
            }
        }
    }
}

impl Drop for UdpSession {
    fn drop(&mut self) {
        debug!(peer = %self.peer, "session released");
    }
}
