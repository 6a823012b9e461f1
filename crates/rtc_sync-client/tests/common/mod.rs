// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Shared helpers for integration tests.

// Integration test helpers are `pub` so each `tests/*.rs` file can import them
// via `mod common`, but clippy flags them as unreachable outside the crate.
#![allow(unreachable_pub, dead_code)]

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rtc_client::message::{Code, Frame, MessageKind, Request, Response};
use rtc_client::transport::{Session, Transport};
use rtc_client::{ResponseCode, SyncTarget, TransportError};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

// ── Mock transport ──────────────────────────────────────────────────

/// How a [`MockTransport`] session behaves.
#[derive(Clone, Debug)]
pub enum Script {
    /// Answer every exchange with this code and an empty body.
    Respond(ResponseCode),
    /// Answer every exchange with this response.
    RespondWith(Response),
    /// Sleep, then answer with this code.
    Delayed(Duration, ResponseCode),
    /// Never answer.
    Never,
    /// Fail while opening the session.
    FailOpen,
    /// Fail name resolution for the target host.
    FailResolve,
    /// Open fine, then fail the exchange.
    FailExchange,
}

#[derive(Debug, Default)]
struct MockState {
    opened: AtomicUsize,
    live: AtomicUsize,
    requests: Mutex<Vec<Request>>,
}

/// In-memory transport that follows a [`Script`] and counts sessions.
#[derive(Clone, Debug)]
pub struct MockTransport {
    script: Script,
    state: Arc<MockState>,
}

impl MockTransport {
    pub fn new(script: Script) -> Self {
        MockTransport {
            script,
            state: Arc::default(),
        }
    }

    /// Sessions opened so far.
    pub fn opened(&self) -> usize {
        self.state.opened.load(Ordering::SeqCst)
    }

    /// Sessions opened and not yet dropped.
    pub fn live_sessions(&self) -> usize {
        self.state.live.load(Ordering::SeqCst)
    }

    /// Every request handed to a session, in order.
    pub fn requests(&self) -> Vec<Request> {
        self.state.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    type Session = MockSession;

    async fn open(&self, target: &SyncTarget) -> Result<MockSession, TransportError> {
        match self.script {
            Script::FailOpen => {
                return Err(TransportError::Io(io::Error::new(
                    io::ErrorKind::ConnectionRefused,
                    "mock open failure",
                )));
            }
            Script::FailResolve => {
                return Err(TransportError::Resolve {
                    host: target.host().to_string(),
                    detail: "Name or service not known".to_string(),
                });
            }
            _ => {}
        }
        self.state.opened.fetch_add(1, Ordering::SeqCst);
        self.state.live.fetch_add(1, Ordering::SeqCst);
        Ok(MockSession {
            script: self.script.clone(),
            state: Arc::clone(&self.state),
        })
    }
}

pub struct MockSession {
    script: Script,
    state: Arc<MockState>,
}

#[async_trait]
impl Session for MockSession {
    async fn exchange(&mut self, request: &Request) -> Result<Response, TransportError> {
        self.state.requests.lock().unwrap().push(request.clone());
        match &self.script {
            Script::Respond(code) => Ok(Response::new(*code)),
            Script::RespondWith(response) => Ok(response.clone()),
            Script::Delayed(delay, code) => {
                tokio::time::sleep(*delay).await;
                Ok(Response::new(*code))
            }
            Script::Never => std::future::pending().await,
            Script::FailOpen | Script::FailResolve => unreachable!("open fails first"),
            Script::FailExchange => Err(TransportError::Reset),
        }
    }
}

impl Drop for MockSession {
    fn drop(&mut self) {
        self.state.live.fetch_sub(1, Ordering::SeqCst);
    }
}

// ── Loopback fake node ──────────────────────────────────────────────

/// Message id the fake node uses for separate responses.
pub const SEPARATE_MID: u16 = 0x7000;

/// How a [`FakeNode`] answers requests.
#[derive(Clone, Debug)]
pub enum NodeMode {
    /// Respond in the ACK.
    Piggyback(ResponseCode),
    /// Empty ACK, then a Confirmable response in its own message.
    Separate(ResponseCode),
    /// Answer with RST.
    Reset,
    /// Ignore the first `n` request datagrams, then piggyback.
    DropFirst(usize, ResponseCode),
    /// Send garbage and an unrelated Confirmable message first, then piggyback.
    Noisy(ResponseCode),
    /// Answer 2.05 with this body.
    Content(Vec<u8>),
    /// Never answer.
    Silent,
}

/// A CoAP node on a loopback UDP port, recording every frame it receives.
pub struct FakeNode {
    addr: SocketAddr,
    frames: Arc<Mutex<Vec<Frame>>>,
    task: JoinHandle<()>,
}

impl FakeNode {
    pub async fn start(mode: NodeMode) -> FakeNode {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        let frames = Arc::new(Mutex::new(Vec::new()));
        let task = tokio::spawn(serve(socket, mode, Arc::clone(&frames)));
        FakeNode { addr, frames, task }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Target for this node's `/date` resource.
    pub fn target(&self) -> SyncTarget {
        SyncTarget::parse(&self.addr.to_string()).unwrap()
    }

    /// Frames received so far.
    pub fn frames(&self) -> Vec<Frame> {
        self.frames.lock().unwrap().clone()
    }

    /// Request frames received so far, retransmissions included.
    pub fn requests(&self) -> Vec<Frame> {
        self.frames()
            .into_iter()
            .filter(|f| matches!(f.code, Code::Request(_)))
            .collect()
    }
}

impl Drop for FakeNode {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(socket: UdpSocket, mode: NodeMode, frames: Arc<Mutex<Vec<Frame>>>) {
    let mut buf = [0u8; 1280];
    let mut requests = 0usize;
    loop {
        let Ok((len, peer)) = socket.recv_from(&mut buf).await else {
            return;
        };
        let Ok(frame) = Frame::decode(&buf[..len]) else {
            continue;
        };
        frames.lock().unwrap().push(frame.clone());
        if !matches!(frame.code, Code::Request(_)) {
            continue;
        }
        requests += 1;

        let piggyback = |code: ResponseCode, payload: Vec<u8>| {
            Frame::response(
                MessageKind::Acknowledgement,
                frame.message_id,
                frame.token.clone(),
                code,
                payload,
            )
        };
        let replies = match &mode {
            NodeMode::Piggyback(code) => vec![piggyback(*code, Vec::new())],
            NodeMode::Separate(code) => vec![
                Frame::empty(MessageKind::Acknowledgement, frame.message_id),
                Frame::response(
                    MessageKind::Confirmable,
                    SEPARATE_MID,
                    frame.token.clone(),
                    *code,
                    Vec::new(),
                ),
            ],
            NodeMode::Reset => vec![Frame::empty(MessageKind::Reset, frame.message_id)],
            NodeMode::DropFirst(n, _) if requests <= *n => Vec::new(),
            NodeMode::DropFirst(_, code) => vec![piggyback(*code, Vec::new())],
            NodeMode::Noisy(code) => {
                let _ = socket.send_to(b"\xff\x00garbage", peer).await;
                vec![
                    Frame::response(
                        MessageKind::Confirmable,
                        SEPARATE_MID,
                        b"other".to_vec(),
                        ResponseCode::CHANGED,
                        Vec::new(),
                    ),
                    piggyback(*code, Vec::new()),
                ]
            }
            NodeMode::Content(body) => vec![piggyback(ResponseCode::CONTENT, body.clone())],
            NodeMode::Silent => Vec::new(),
        };
        for reply in replies {
            let datagram = reply.encode().unwrap();
            if socket.send_to(&datagram, peer).await.is_err() {
                return;
            }
        }
    }
}
