// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! One-shot real-time-clock synchronization of a CoAP node.
//!
//! A [`SyncClient`] captures the local clock, sends it to the node's `/date`
//! resource and classifies the node's answer. Each call owns its session
//! and its timeout: the client itself holds only configuration, so one
//! client can drive any number of concurrent calls. Dropping a call's
//! future cancels it and releases its session.
//!
//! Every call walks [`SyncState::Idle`] → [`SyncState::Sending`] →
//! [`SyncState::AwaitingResponse`] → one terminal state, and each
//! transition is logged at `debug` level.
//!
//! # Examples
//!
//! ```no_run
//! # async fn example() -> Result<(), rtc_client::TargetError> {
//! use std::time::Duration;
//! use rtc_client::{SyncClient, SyncTarget};
//!
//! let client = SyncClient::builder()
//!     .timeout(Duration::from_secs(5))
//!     .build();
//! let target = SyncTarget::parse("[fe80::212:4b00:615:a8c1%lowpan0]")?;
//!
//! let result = client.sync(&target).await;
//! println!("{result}");
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use rtc_proto::message::{Request, Response};
use rtc_proto::{ClockSource, Method, ResponseCode, TimeFields, TimePayloadBuilder, WireFormat};
use tokio::time::{Instant, timeout_at};
use tracing::debug;

use crate::error::{SyncError, TransportError};
use crate::result::{ClockReading, SyncResult, SyncState};
use crate::target::SyncTarget;
use crate::transport::{Session, Transport};
use crate::udp::UdpTransport;

/// Default bound on one call, covering session setup and the exchange.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Request method used to write the clock.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SetMethod {
    /// Idempotent update; safe to repeat.
    #[default]
    Put,
    /// For firmware that registers the resource for POST only.
    Post,
}

impl From<SetMethod> for Method {
    fn from(method: SetMethod) -> Method {
        match method {
            SetMethod::Put => Method::Put,
            SetMethod::Post => Method::Post,
        }
    }
}

impl fmt::Display for SetMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(Method::from(*self).as_str())
    }
}

impl FromStr for SetMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("put") {
            Ok(SetMethod::Put)
        } else if s.eq_ignore_ascii_case("post") {
            Ok(SetMethod::Post)
        } else {
            Err(format!("unsupported method '{s}', expected put or post"))
        }
    }
}

/// One clock write: where, what and how long to wait. Lives for a single call.
#[derive(Clone, Copy, Debug)]
struct SyncRequest<'a> {
    target: &'a SyncTarget,
    fields: TimeFields,
    timeout: Duration,
}

/// Builder for configuring and creating a [`SyncClient`].
#[derive(Clone, Debug)]
pub struct SyncClientBuilder<T = UdpTransport> {
    transport: T,
    timeout: Duration,
    method: SetMethod,
    format: WireFormat,
    clock: ClockSource,
}

impl SyncClientBuilder<UdpTransport> {
    fn new() -> Self {
        SyncClientBuilder {
            transport: UdpTransport::new(),
            timeout: DEFAULT_TIMEOUT,
            method: SetMethod::default(),
            format: WireFormat::default(),
            clock: ClockSource::default(),
        }
    }
}

impl<T: Transport> SyncClientBuilder<T> {
    /// Bound on each call (default: 10s).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Method used to write the clock (default: PUT).
    pub fn method(mut self, method: SetMethod) -> Self {
        self.method = method;
        self
    }

    /// How the time is carried in the request (default: Uri-Query pairs).
    pub fn wire_format(mut self, format: WireFormat) -> Self {
        self.format = format;
        self
    }

    /// Which clock to read the time from (default: local time).
    pub fn clock_source(mut self, clock: ClockSource) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the transport, e.g. with a tuned [`UdpTransport`] or a test double.
    pub fn transport<U: Transport>(self, transport: U) -> SyncClientBuilder<U> {
        SyncClientBuilder {
            transport,
            timeout: self.timeout,
            method: self.method,
            format: self.format,
            clock: self.clock,
        }
    }

    /// Build the client.
    pub fn build(self) -> SyncClient<T> {
        SyncClient {
            transport: self.transport,
            timeout: self.timeout,
            method: self.method,
            format: self.format,
            clock: self.clock,
        }
    }
}

/// Sets the real-time clock of CoAP nodes.
#[derive(Clone, Debug)]
pub struct SyncClient<T = UdpTransport> {
    transport: T,
    timeout: Duration,
    method: SetMethod,
    format: WireFormat,
    clock: ClockSource,
}

impl SyncClient<UdpTransport> {
    /// A client over UDP with default settings.
    pub fn new() -> Self {
        SyncClientBuilder::new().build()
    }

    /// Start configuring a client.
    pub fn builder() -> SyncClientBuilder {
        SyncClientBuilder::new()
    }
}

impl Default for SyncClient<UdpTransport> {
    fn default() -> Self {
        SyncClient::new()
    }
}

impl<T: Transport> SyncClient<T> {
    /// The configured per-call timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The configured clock-write method.
    pub fn method(&self) -> SetMethod {
        self.method
    }

    /// The transport sessions are opened on.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Capture the current time and write it to `target`, bounded by the configured timeout.
    pub async fn sync(&self, target: &SyncTarget) -> SyncResult {
        self.sync_with_timeout(target, self.timeout).await
    }

    /// Like [`sync`](Self::sync) with a per-call timeout.
    pub async fn sync_with_timeout(&self, target: &SyncTarget, timeout: Duration) -> SyncResult {
        self.write_clock(SyncRequest {
            target,
            fields: TimePayloadBuilder::capture(self.clock),
            timeout,
        })
        .await
    }

    /// Write explicit `fields` instead of the current time.
    pub async fn sync_fields(&self, target: &SyncTarget, fields: &TimeFields) -> SyncResult {
        self.write_clock(SyncRequest {
            target,
            fields: *fields,
            timeout: self.timeout,
        })
        .await
    }

    /// Read the node's clock back with GET.
    ///
    /// The node answers 2.05 with decimal seconds since the Unix epoch.
    /// Unlike the write path this returns the error itself, so a rejection
    /// surfaces as [`SyncError::Rejected`].
    pub async fn read_clock(&self, target: &SyncTarget) -> Result<ClockReading, SyncError> {
        let request = self.request_for(target, Method::Get);
        let response = self.exchange(target, &request, self.timeout).await?;
        if !response.code.is_success() {
            debug!(%target, code = %response.code, "clock read rejected");
            return Err(SyncError::Rejected(response.code));
        }

        let local = TimePayloadBuilder::capture(ClockSource::Utc);
        let epoch = parse_epoch(&response.payload)?;
        let remote = TimeFields::from_epoch_secs(epoch);
        let offset_secs = remote.seconds_since(&local).unwrap_or_default();
        debug!(%target, %remote, offset_secs, "clock read");
        Ok(ClockReading {
            remote,
            epoch,
            local,
            offset_secs,
        })
    }

    async fn write_clock(&self, request: SyncRequest<'_>) -> SyncResult {
        let target = request.target;
        debug!(
            %target,
            state = %SyncState::Idle,
            fields = %request.fields,
            timeout = ?request.timeout,
            "sync started"
        );
        let result = SyncResult::from(self.send_fields(request).await);
        let state = result.state();
        match result.code() {
            Some(code) => debug!(%target, %state, %code, "sync finished"),
            None => debug!(%target, %state, outcome = %result, "sync finished"),
        }
        result
    }

    async fn send_fields(&self, sync: SyncRequest<'_>) -> Result<ResponseCode, SyncError> {
        let mut request = TimePayloadBuilder::render(
            &sync.fields,
            self.method.into(),
            sync.target.path_segments(),
            self.format,
        )
        .map_err(|e| TransportError::Encode {
            detail: e.to_string(),
        })?;
        request.uri_host = sync.target.uri_host().map(str::to_string);
        let response = self.exchange(sync.target, &request, sync.timeout).await?;
        Ok(response.code)
    }

    fn request_for(&self, target: &SyncTarget, method: Method) -> Request {
        let mut request = Request::new(method, target.path_segments().to_vec());
        request.uri_host = target.uri_host().map(str::to_string);
        request
    }

    /// Open a session and run one exchange, all within `timeout`.
    ///
    /// The session is dropped on return, including when the deadline
    /// cancels the exchange. A timeout too large to express as an instant
    /// waits without bound.
    async fn exchange(
        &self,
        target: &SyncTarget,
        request: &Request,
        timeout: Duration,
    ) -> Result<Response, SyncError> {
        let deadline = Instant::now().checked_add(timeout);

        debug!(%target, state = %SyncState::Sending, method = request.method.as_str(), uri = %request.uri());
        let mut session = bounded(deadline, self.transport.open(target)).await??;

        debug!(%target, state = %SyncState::AwaitingResponse);
        let response = bounded(deadline, session.exchange(request)).await??;
        Ok(response)
    }
}

/// Await `fut`, giving up at `deadline` if there is one.
async fn bounded<F: Future>(deadline: Option<Instant>, fut: F) -> Result<F::Output, SyncError> {
    match deadline {
        Some(deadline) => timeout_at(deadline, fut)
            .await
            .map_err(|_| SyncError::Timeout),
        None => Ok(fut.await),
    }
}

fn parse_epoch(payload: &[u8]) -> Result<u32, SyncError> {
    let protocol = |detail: String| SyncError::Transport(TransportError::Protocol { detail });
    let text = std::str::from_utf8(payload)
        .map_err(|_| protocol("clock payload is not UTF-8".to_string()))?
        .trim();
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(protocol(format!("clock payload '{text}' is not epoch seconds")));
    }
    text.parse()
        .map_err(|_| protocol(format!("clock payload '{text}' is out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let client = SyncClient::builder().build();
        assert_eq!(client.timeout(), DEFAULT_TIMEOUT);
        assert_eq!(client.method(), SetMethod::Put);
        assert_eq!(client.format, WireFormat::Query);
        assert_eq!(client.clock, ClockSource::Local);
    }

    #[test]
    fn test_builder_overrides() {
        let client = SyncClient::builder()
            .timeout(Duration::from_millis(750))
            .method(SetMethod::Post)
            .wire_format(WireFormat::Epoch)
            .clock_source(ClockSource::Utc)
            .build();
        assert_eq!(client.timeout(), Duration::from_millis(750));
        assert_eq!(client.method(), SetMethod::Post);
        assert_eq!(client.format, WireFormat::Epoch);
        assert_eq!(client.clock, ClockSource::Utc);
    }

    #[test]
    fn test_set_method_parse() {
        assert_eq!("PUT".parse::<SetMethod>(), Ok(SetMethod::Put));
        assert_eq!("post".parse::<SetMethod>(), Ok(SetMethod::Post));
        assert!("get".parse::<SetMethod>().is_err());
        assert_eq!(SetMethod::Post.to_string(), "POST");
        assert_eq!(Method::from(SetMethod::Put), Method::Put);
    }

    #[test]
    fn test_parse_epoch() {
        assert_eq!(parse_epoch(b"1710511509").unwrap(), 1_710_511_509);
        assert_eq!(parse_epoch(b" 0\n").unwrap(), 0);
        assert!(matches!(
            parse_epoch(b"-5"),
            Err(SyncError::Transport(TransportError::Protocol { .. }))
        ));
        assert!(parse_epoch(b"").is_err());
        assert!(parse_epoch(b"99999999999").is_err());
        assert!(parse_epoch(&[0xff, 0xfe]).is_err());
    }

    #[test]
    fn test_request_for_hostname_sets_uri_host() {
        let client = SyncClient::new();
        let target = SyncTarget::new("node-7.mesh.example", "/rtc/date").unwrap();
        let request = client.request_for(&target, Method::Get);
        assert_eq!(request.uri_host.as_deref(), Some("node-7.mesh.example"));
        assert_eq!(request.path, vec!["rtc".to_string(), "date".to_string()]);
        assert!(request.query.is_empty());

        let literal = SyncTarget::parse("[::1]").unwrap();
        assert_eq!(client.request_for(&literal, Method::Get).uri_host, None);
    }
}
