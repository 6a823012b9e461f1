// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Error types for the clock synchronization client.
//!
//! [`SyncClient::sync`](crate::SyncClient::sync) never returns these directly:
//! every outcome is folded into a [`SyncResult`](crate::SyncResult). They
//! surface from target construction ([`TargetError`]), from
//! [`SyncClient::read_clock`](crate::SyncClient::read_clock), and from
//! [`Transport`](crate::transport::Transport) implementations.
//!
//! Like the proto errors, [`SyncError`] converts into [`io::Error`] with a
//! matching [`io::ErrorKind`], and can be recovered with `downcast_ref`:
//!
//! ```
//! use rtc_client::error::SyncError;
//!
//! let io_err: std::io::Error = SyncError::Timeout.into();
//! assert_eq!(io_err.kind(), std::io::ErrorKind::TimedOut);
//! let inner = io_err.get_ref().and_then(|e| e.downcast_ref::<SyncError>());
//! assert!(matches!(inner, Some(SyncError::Timeout)));
//! ```

use std::fmt;
use std::io;

use rtc_proto::{CodecError, ResponseCode};

/// Everything that can go wrong talking to a node.
#[derive(Debug)]
pub enum SyncError {
    /// The target address or path is malformed. Detected before any network activity.
    InvalidTarget(TargetError),
    /// Session establishment or I/O failed.
    Transport(TransportError),
    /// No response arrived within the timeout.
    Timeout,
    /// The node answered with a non-success response code.
    Rejected(ResponseCode),
}

/// Malformed target host, port or resource path.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TargetError {
    /// The host was empty.
    EmptyHost,
    /// The host is neither an IP literal nor a valid hostname.
    InvalidHost {
        /// The rejected host text.
        host: String,
    },
    /// An IPv6 zone identifier was attached to something other than an IPv6 address,
    /// or was empty or contained illegal characters.
    InvalidZone {
        /// The rejected host text.
        host: String,
    },
    /// The port was not a number in 1-65535.
    InvalidPort {
        /// The rejected port text.
        port: String,
    },
    /// The resource path is unusable.
    InvalidPath {
        /// The rejected path.
        path: String,
        /// What is wrong with it.
        reason: &'static str,
    },
}

/// Failures below the CoAP request/response level.
#[derive(Debug)]
pub enum TransportError {
    /// Name resolution failed.
    Resolve {
        /// The host being resolved.
        host: String,
        /// Resolver error text.
        detail: String,
    },
    /// Name resolution returned no addresses.
    NoAddresses {
        /// The host being resolved.
        host: String,
    },
    /// The request could not be encoded.
    Encode {
        /// Encoder error text.
        detail: String,
    },
    /// The node reset the exchange (CoAP RST).
    Reset,
    /// The node's reply could not be interpreted.
    Protocol {
        /// What was wrong with the reply.
        detail: String,
    },
    /// Socket-level failure (bind, send, receive, ICMP unreachable).
    Io(io::Error),
}

// ── Display implementations ─────────────────────────────────────────

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::InvalidTarget(e) => write!(f, "invalid target: {e}"),
            SyncError::Transport(e) => write!(f, "transport error: {e}"),
            SyncError::Timeout => write!(f, "timeout"),
            SyncError::Rejected(code) => match code.name() {
                Some(name) => write!(f, "rejected by node: {code} {name}"),
                None => write!(f, "rejected by node: {code}"),
            },
        }
    }
}

impl fmt::Display for TargetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetError::EmptyHost => write!(f, "host is empty"),
            TargetError::InvalidHost { host } => write!(f, "not an address or hostname: '{host}'"),
            TargetError::InvalidZone { host } => write!(f, "invalid IPv6 zone in '{host}'"),
            TargetError::InvalidPort { port } => write!(f, "invalid port '{port}'"),
            TargetError::InvalidPath { path, reason } => {
                write!(f, "invalid resource path '{path}': {reason}")
            }
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Resolve { host, detail } => {
                write!(f, "failed to resolve '{host}': {detail}")
            }
            TransportError::NoAddresses { host } => {
                write!(f, "'{host}' resolved to no addresses")
            }
            TransportError::Encode { detail } => write!(f, "failed to encode request: {detail}"),
            TransportError::Reset => write!(f, "node reset the exchange"),
            TransportError::Protocol { detail } => write!(f, "unexpected reply: {detail}"),
            TransportError::Io(e) => write!(f, "{e}"),
        }
    }
}

// ── Error trait implementations ─────────────────────────────────────

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SyncError::InvalidTarget(e) => Some(e),
            SyncError::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for TargetError {}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Io(e) => Some(e),
            _ => None,
        }
    }
}

// ── From conversions ────────────────────────────────────────────────

impl From<SyncError> for io::Error {
    fn from(err: SyncError) -> io::Error {
        let kind = match &err {
            SyncError::InvalidTarget(_) => io::ErrorKind::InvalidInput,
            SyncError::Transport(TransportError::Io(e)) => e.kind(),
            SyncError::Transport(TransportError::Reset) => io::ErrorKind::ConnectionReset,
            SyncError::Transport(TransportError::Encode { .. }) => io::ErrorKind::InvalidInput,
            SyncError::Transport(TransportError::Protocol { .. }) => io::ErrorKind::InvalidData,
            SyncError::Transport(_) => io::ErrorKind::NotFound,
            SyncError::Timeout => io::ErrorKind::TimedOut,
            SyncError::Rejected(_) => io::ErrorKind::ConnectionRefused,
        };
        io::Error::new(kind, err)
    }
}

impl From<TargetError> for SyncError {
    fn from(err: TargetError) -> SyncError {
        SyncError::InvalidTarget(err)
    }
}

impl From<TransportError> for SyncError {
    fn from(err: TransportError) -> SyncError {
        SyncError::Transport(err)
    }
}

impl From<io::Error> for TransportError {
    fn from(err: io::Error) -> TransportError {
        TransportError::Io(err)
    }
}

impl From<CodecError> for TransportError {
    fn from(err: CodecError) -> TransportError {
        TransportError::Encode {
            detail: err.to_string(),
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────
