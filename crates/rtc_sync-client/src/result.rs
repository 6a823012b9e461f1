// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Outcome of one synchronization call.

use std::fmt;

use rtc_proto::{ResponseCode, TimeFields};

use crate::error::SyncError;

/// Process exit status for a successful sync.
pub const EXIT_SUCCESS: u8 = 0;
/// Process exit status for a malformed target or bad usage.
pub const EXIT_INVALID_TARGET: u8 = 1;
/// Process exit status when the node rejected the request.
pub const EXIT_REJECTED: u8 = 2;
/// Process exit status when no response arrived in time.
pub const EXIT_TIMED_OUT: u8 = 3;
/// Process exit status for resolution, socket and protocol failures.
pub const EXIT_TRANSPORT: u8 = 4;

/// Progress of a single sync call.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SyncState {
    /// Nothing sent yet.
    Idle,
    /// Opening the session and transmitting the request.
    Sending,
    /// Request sent, waiting for the node.
    AwaitingResponse,
    /// The node answered 2.xx.
    Succeeded,
    /// The node answered with a non-success code.
    Rejected,
    /// The timeout elapsed.
    TimedOut,
    /// The session could not be established or failed mid-exchange.
    TransportFailed,
}

impl SyncState {
    /// Whether no further transitions are possible.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SyncState::Succeeded
                | SyncState::Rejected
                | SyncState::TimedOut
                | SyncState::TransportFailed
        )
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncState::Idle => "idle",
            SyncState::Sending => "sending",
            SyncState::AwaitingResponse => "awaiting-response",
            SyncState::Succeeded => "succeeded",
            SyncState::Rejected => "rejected",
            SyncState::TimedOut => "timed-out",
            SyncState::TransportFailed => "transport-failed",
        };
        f.write_str(name)
    }
}

/// Why a sync did not succeed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SyncFailure {
    /// The node answered with a non-success code.
    Rejected {
        /// The node's response code.
        code: ResponseCode,
    },
    /// No response within the timeout.
    TimedOut,
    /// Session establishment or I/O failed.
    TransportFailed {
        /// Human-readable cause.
        detail: String,
    },
}

impl SyncFailure {
    /// Short, stable description of the failure class.
    pub fn reason(&self) -> &'static str {
        match self {
            SyncFailure::Rejected { .. } => "rejected by node",
            SyncFailure::TimedOut => "timeout",
            SyncFailure::TransportFailed { .. } => "transport error",
        }
    }

    /// The node's response code, for rejections.
    pub fn code(&self) -> Option<ResponseCode> {
        match self {
            SyncFailure::Rejected { code } => Some(*code),
            _ => None,
        }
    }
}

impl fmt::Display for SyncFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncFailure::Rejected { code } => match code.name() {
                Some(name) => write!(f, "{}: {code} {name}", self.reason()),
                None => write!(f, "{}: {code}", self.reason()),
            },
            SyncFailure::TimedOut => f.write_str(self.reason()),
            SyncFailure::TransportFailed { detail } => write!(f, "{}: {detail}", self.reason()),
        }
    }
}

/// Result of one sync call. Every outcome other than a malformed target ends up here.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SyncResult {
    /// The node accepted the time.
    Success {
        /// The 2.xx code the node answered with.
        code: ResponseCode,
    },
    /// The node did not accept the time.
    Failure(SyncFailure),
}

impl SyncResult {
    /// Whether the node accepted the time.
    pub fn is_success(&self) -> bool {
        matches!(self, SyncResult::Success { .. })
    }

    /// The response code, when the node answered at all.
    pub fn code(&self) -> Option<ResponseCode> {
        match self {
            SyncResult::Success { code } => Some(*code),
            SyncResult::Failure(failure) => failure.code(),
        }
    }

    /// The failure, if any.
    pub fn failure(&self) -> Option<&SyncFailure> {
        match self {
            SyncResult::Success { .. } => None,
            SyncResult::Failure(failure) => Some(failure),
        }
    }

    /// Terminal state of the call that produced this result.
    pub fn state(&self) -> SyncState {
        match self {
            SyncResult::Success { .. } => SyncState::Succeeded,
            SyncResult::Failure(SyncFailure::Rejected { .. }) => SyncState::Rejected,
            SyncResult::Failure(SyncFailure::TimedOut) => SyncState::TimedOut,
            SyncResult::Failure(SyncFailure::TransportFailed { .. }) => SyncState::TransportFailed,
        }
    }

    /// Whether trying again could plausibly give a different answer.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SyncResult::Failure(SyncFailure::TimedOut | SyncFailure::TransportFailed { .. })
        )
    }

    /// Process exit status for this outcome.
    pub fn exit_code(&self) -> u8 {
        match self.state() {
            SyncState::Succeeded => EXIT_SUCCESS,
            SyncState::Rejected => EXIT_REJECTED,
            SyncState::TimedOut => EXIT_TIMED_OUT,
            _ => EXIT_TRANSPORT,
        }
    }
}

impl fmt::Display for SyncResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncResult::Success { code } => write!(f, "clock set ({code})"),
            SyncResult::Failure(failure) => write!(f, "clock not set: {failure}"),
        }
    }
}

impl From<Result<ResponseCode, SyncError>> for SyncResult {
    fn from(outcome: Result<ResponseCode, SyncError>) -> Self {
        match outcome {
            Ok(code) if code.is_success() => SyncResult::Success { code },
            Ok(code) | Err(SyncError::Rejected(code)) => {
                SyncResult::Failure(SyncFailure::Rejected { code })
            }
            Err(SyncError::Timeout) => SyncResult::Failure(SyncFailure::TimedOut),
            Err(SyncError::Transport(e)) => SyncResult::Failure(SyncFailure::TransportFailed {
                detail: e.to_string(),
            }),
            Err(e @ SyncError::InvalidTarget(_)) => {
                SyncResult::Failure(SyncFailure::TransportFailed {
                    detail: e.to_string(),
                })
            }
        }
    }
}

/// The node's real-time clock as read back with GET.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ClockReading {
    /// Remote time, decomposed as UTC.
    pub remote: TimeFields,
    /// Remote time in seconds since the Unix epoch.
    pub epoch: u32,
    /// Local UTC time when the response arrived.
    pub local: TimeFields,
    /// `remote - local` in seconds; positive when the node runs ahead.
    pub offset_secs: i64,
}

impl fmt::Display for ClockReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "node clock {} UTC (epoch {}), offset {:+}s",
            self.remote, self.epoch, self.offset_secs
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;

    #[test]
    fn test_success_from_changed() {
        let result = SyncResult::from(Ok(ResponseCode::CHANGED));
        assert_eq!(
            result,
            SyncResult::Success {
                code: ResponseCode::CHANGED
            }
        );
        assert!(result.is_success());
        assert_eq!(result.state(), SyncState::Succeeded);
        assert_eq!(result.exit_code(), EXIT_SUCCESS);
        assert_eq!(result.to_string(), "clock set (2.04)");
    }

    #[test]
    fn test_non_success_code_is_rejection() {
        let result = SyncResult::from(Ok(ResponseCode::BAD_REQUEST));
        let failure = result.failure().unwrap();
        assert_eq!(failure.reason(), "rejected by node");
        assert_eq!(failure.code(), Some(ResponseCode::BAD_REQUEST));
        assert_eq!(result.exit_code(), EXIT_REJECTED);
        assert!(!result.is_retryable());
        assert_eq!(result.to_string(), "clock not set: rejected by node: 4.00 Bad Request");
    }

    #[test]
    fn test_timeout_and_transport() {
        let timeout = SyncResult::from(Err(SyncError::Timeout));
        assert_eq!(timeout.failure().unwrap().reason(), "timeout");
        assert_eq!(timeout.state(), SyncState::TimedOut);
        assert_eq!(timeout.exit_code(), EXIT_TIMED_OUT);
        assert!(timeout.is_retryable());

        let transport = SyncResult::from(Err(SyncError::Transport(TransportError::Reset)));
        assert_eq!(transport.failure().unwrap().reason(), "transport error");
        assert_eq!(transport.state(), SyncState::TransportFailed);
        assert_eq!(transport.exit_code(), EXIT_TRANSPORT);
        assert_eq!(transport.code(), None);
        assert_eq!(
            transport.to_string(),
            "clock not set: transport error: node reset the exchange"
        );
    }

    #[test]
    fn test_unnamed_code_display() {
        let failure = SyncFailure::Rejected {
            code: ResponseCode::new(4, 20),
        };
        assert_eq!(failure.to_string(), "rejected by node: 4.20");
    }

    #[test]
    fn test_terminal_states() {
        assert!(!SyncState::Idle.is_terminal());
        assert!(!SyncState::AwaitingResponse.is_terminal());
        assert!(SyncState::TimedOut.is_terminal());
        assert_eq!(SyncState::AwaitingResponse.to_string(), "awaiting-response");
    }

    #[test]
    fn test_clock_reading_display() {
        let reading = ClockReading {
            remote: TimeFields::new(2024, 3, 15, 14, 5, 9).unwrap(),
            epoch: 1_710_511_509,
            local: TimeFields::new(2024, 3, 15, 14, 5, 12).unwrap(),
            offset_secs: -3,
        };
        assert_eq!(
            reading.to_string(),
            "node clock 2024-03-15 14:05:09 UTC (epoch 1710511509), offset -3s"
        );
    }
}
