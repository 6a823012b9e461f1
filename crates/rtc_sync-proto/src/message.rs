// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! CoAP datagram encoding and decoding.
//!
//! [`Frame`] is the flat view of one CoAP message with only the options this
//! client deals in (Uri-Host, Uri-Path, Content-Format, Uri-Query). Byte-level
//! work is delegated to [`coap_lite`].

use coap_lite::{CoapOption, MessageClass, MessageType, Packet};

use crate::code::ResponseCode;
use crate::error::CodecError;

/// Default CoAP UDP port.
pub const COAP_PORT: u16 = 5683;

/// Maximum CoAP token length in bytes.
pub const MAX_TOKEN_LEN: usize = 8;

/// Content-Format number for `text/plain; charset=utf-8`.
pub const CONTENT_FORMAT_TEXT_PLAIN: u16 = 0;

/// CoAP message type.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MessageKind {
    /// CON: requires an acknowledgement.
    Confirmable,
    /// NON: fire and forget.
    NonConfirmable,
    /// ACK: acknowledges a CON, possibly carrying a piggybacked response.
    Acknowledgement,
    /// RST: the peer could not process a message.
    Reset,
}

impl From<MessageKind> for MessageType {
    fn from(kind: MessageKind) -> MessageType {
        match kind {
            MessageKind::Confirmable => MessageType::Confirmable,
            MessageKind::NonConfirmable => MessageType::NonConfirmable,
            MessageKind::Acknowledgement => MessageType::Acknowledgement,
            MessageKind::Reset => MessageType::Reset,
        }
    }
}

impl From<MessageType> for MessageKind {
    fn from(kind: MessageType) -> MessageKind {
        match kind {
            MessageType::Confirmable => MessageKind::Confirmable,
            MessageType::NonConfirmable => MessageKind::NonConfirmable,
            MessageType::Acknowledgement => MessageKind::Acknowledgement,
            MessageType::Reset => MessageKind::Reset,
        }
    }
}

/// Request methods used against the date resource.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Method {
    /// Read the node's clock.
    Get,
    /// Set the node's clock (non-idempotent variant accepted by the firmware).
    Post,
    /// Set the node's clock. Idempotent, so safe to repeat.
    #[default]
    Put,
}

impl Method {
    const fn detail(self) -> u8 {
        match self {
            Method::Get => 1,
            Method::Post => 2,
            Method::Put => 3,
        }
    }

    /// Upper-case method name.
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
        }
    }
}

/// The code field of a CoAP message.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Code {
    /// 0.00, used by empty ACK and RST messages.
    Empty,
    /// 0.01-0.03.
    Request(Method),
    /// 2.xx-5.xx.
    Response(ResponseCode),
}

impl Code {
    /// Encode as the single code byte of a CoAP header.
    pub fn to_raw(self) -> u8 {
        match self {
            Code::Empty => 0,
            Code::Request(method) => method.detail(),
            Code::Response(code) => code.to_raw(),
        }
    }

    /// Decode the single code byte of a CoAP header.
    pub fn from_raw(raw: u8) -> Result<Code, CodecError> {
        match (raw >> 5, raw & 0x1f) {
            (0, 0) => Ok(Code::Empty),
            (0, 1) => Ok(Code::Request(Method::Get)),
            (0, 2) => Ok(Code::Request(Method::Post)),
            (0, 3) => Ok(Code::Request(Method::Put)),
            (0, _) => Err(CodecError::UnsupportedMethod { code: raw }),
            (2..=5, _) => Ok(Code::Response(ResponseCode::from_raw(raw))),
            (class, _) => Err(CodecError::Malformed {
                detail: format!("reserved code class {class}"),
            }),
        }
    }
}

/// A request as the client composes it, before message ids and tokens are assigned.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Request {
    /// Request method.
    pub method: Method,
    /// Uri-Host option; only needed when the target is a hostname.
    pub uri_host: Option<String>,
    /// Uri-Path segments, e.g. `["date"]`.
    pub path: Vec<String>,
    /// Uri-Query options, one `key=value` pair each.
    pub query: Vec<String>,
    /// Content-Format of the payload, if there is one.
    pub content_format: Option<u16>,
    /// Request body.
    pub payload: Vec<u8>,
}

impl Request {
    /// Create a request with no options and an empty body.
    pub fn new(method: Method, path: Vec<String>) -> Self {
        Request {
            method,
            path,
            ..Request::default()
        }
    }

    /// `/seg1/seg2?q1&q2`, for logs and diagnostics.
    pub fn uri(&self) -> String {
        let mut uri = String::new();
        for segment in &self.path {
            uri.push('/');
            uri.push_str(segment);
        }
        if uri.is_empty() {
            uri.push('/');
        }
        if !self.query.is_empty() {
            uri.push('?');
            uri.push_str(&self.query.join("&"));
        }
        uri
    }
}

/// A response as handed back to the client once matched to its request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Response {
    /// Response code.
    pub code: ResponseCode,
    /// Response body. Opaque for clock writes.
    pub payload: Vec<u8>,
}

impl Response {
    /// A response with an empty body.
    pub fn new(code: ResponseCode) -> Self {
        Response {
            code,
            payload: Vec::new(),
        }
    }
}

/// One CoAP message.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Frame {
    /// Message type.
    pub kind: MessageKind,
    /// Message id used for deduplication and ACK matching.
    pub message_id: u16,
    /// Token used to match responses to requests (0-8 bytes).
    pub token: Vec<u8>,
    /// Method, response code, or empty.
    pub code: Code,
    /// Uri-Host option.
    pub uri_host: Option<String>,
    /// Uri-Path options.
    pub uri_path: Vec<String>,
    /// Uri-Query options.
    pub uri_query: Vec<String>,
    /// Content-Format option.
    pub content_format: Option<u16>,
    /// Message body.
    pub payload: Vec<u8>,
}

impl Frame {
    /// An empty message (ACK or RST), carrying only a message id.
    pub fn empty(kind: MessageKind, message_id: u16) -> Self {
        Frame {
            kind,
            message_id,
            token: Vec::new(),
            code: Code::Empty,
            uri_host: None,
            uri_path: Vec::new(),
            uri_query: Vec::new(),
            content_format: None,
            payload: Vec::new(),
        }
    }

    /// Wrap a [`Request`] in a message.
    pub fn request(kind: MessageKind, message_id: u16, token: Vec<u8>, request: &Request) -> Self {
        Frame {
            kind,
            message_id,
            token,
            code: Code::Request(request.method),
            uri_host: request.uri_host.clone(),
            uri_path: request.path.clone(),
            uri_query: request.query.clone(),
            content_format: request.content_format,
            payload: request.payload.clone(),
        }
    }

    /// Build a response message.
    pub fn response(
        kind: MessageKind,
        message_id: u16,
        token: Vec<u8>,
        code: ResponseCode,
        payload: Vec<u8>,
    ) -> Self {
        Frame {
            token,
            code: Code::Response(code),
            payload,
            ..Frame::empty(kind, message_id)
        }
    }

    /// `true` for 0.00 messages (empty ACK, RST, ping).
    pub fn is_empty(&self) -> bool {
        self.code == Code::Empty
    }

    /// The response carried by this message, if it is one.
    pub fn to_response(&self) -> Option<Response> {
        match self.code {
            Code::Response(code) => Some(Response {
                code,
                payload: self.payload.clone(),
            }),
            _ => None,
        }
    }

    /// The request carried by this message, if it is one.
    pub fn to_request(&self) -> Option<Request> {
        match self.code {
            Code::Request(method) => Some(Request {
                method,
                uri_host: self.uri_host.clone(),
                path: self.uri_path.clone(),
                query: self.uri_query.clone(),
                content_format: self.content_format,
                payload: self.payload.clone(),
            }),
            _ => None,
        }
    }

    /// Serialize to a UDP datagram.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        if self.token.len() > MAX_TOKEN_LEN {
            return Err(CodecError::TokenTooLong {
                len: self.token.len(),
            });
        }

        let mut packet = Packet::new();
        packet.header.set_version(1);
        packet.header.set_type(self.kind.into());
        packet.header.code = MessageClass::from(self.code.to_raw());
        packet.header.message_id = self.message_id;
        packet.set_token(self.token.clone());

        if let Some(host) = &self.uri_host {
            packet.add_option(CoapOption::UriHost, host.as_bytes().to_vec());
        }
        for segment in &self.uri_path {
            packet.add_option(CoapOption::UriPath, segment.as_bytes().to_vec());
        }
        if let Some(format) = self.content_format {
            packet.add_option(CoapOption::ContentFormat, encode_uint(format));
        }
        for pair in &self.uri_query {
            packet.add_option(CoapOption::UriQuery, pair.as_bytes().to_vec());
        }
        packet.payload = self.payload.clone();

        packet.to_bytes().map_err(|e| CodecError::Encode {
            detail: format!("{e:?}"),
        })
    }

    /// Parse a UDP datagram.
    pub fn decode(buf: &[u8]) -> Result<Frame, CodecError> {
        let packet = Packet::from_bytes(buf).map_err(|e| CodecError::Malformed {
            detail: format!("{e:?}"),
        })?;
        // The header is at least four bytes once parsing succeeded; byte 1 is the code.
        let code = Code::from_raw(buf[1])?;

        Ok(Frame {
            kind: packet.header.get_type().into(),
            message_id: packet.header.message_id,
            token: packet.get_token().to_vec(),
            code,
            uri_host: option_strings(&packet, CoapOption::UriHost).into_iter().next(),
            uri_path: option_strings(&packet, CoapOption::UriPath),
            uri_query: option_strings(&packet, CoapOption::UriQuery),
            content_format: packet
                .get_option(CoapOption::ContentFormat)
                .into_iter()
                .flatten()
                .next()
                .map(|value| decode_uint(value)),
            payload: packet.payload,
        })
    }
}

fn option_strings(packet: &Packet, option: CoapOption) -> Vec<String> {
    packet
        .get_option(option)
        .into_iter()
        .flatten()
        .map(|value| String::from_utf8_lossy(value).into_owned())
        .collect()
}

// CoAP uint options drop leading zero bytes; zero is the empty string.
fn encode_uint(value: u16) -> Vec<u8> {
    value
        .to_be_bytes()
        .into_iter()
        .skip_while(|b| *b == 0)
        .collect()
}

fn decode_uint(bytes: &[u8]) -> u16 {
    bytes
        .iter()
        .rev()
        .take(2)
        .rev()
        .fold(0u16, |acc, b| (acc << 8) | u16::from(*b))
}
