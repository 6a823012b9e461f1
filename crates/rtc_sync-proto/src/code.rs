// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! CoAP response codes (RFC 7252 Section 12.1.2).

use core::fmt;

/// A CoAP response code, a 3-bit class and a 5-bit detail rendered as `c.dd`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ResponseCode {
    class: u8,
    detail: u8,
}

impl ResponseCode {
    /// 2.01 Created.
    pub const CREATED: ResponseCode = ResponseCode::new(2, 1);
    /// 2.02 Deleted.
    pub const DELETED: ResponseCode = ResponseCode::new(2, 2);
    /// 2.03 Valid.
    pub const VALID: ResponseCode = ResponseCode::new(2, 3);
    /// 2.04 Changed. What the node answers after setting its clock.
    pub const CHANGED: ResponseCode = ResponseCode::new(2, 4);
    /// 2.05 Content. What the node answers to a clock read.
    pub const CONTENT: ResponseCode = ResponseCode::new(2, 5);
    /// 4.00 Bad Request. The node could not parse the time.
    pub const BAD_REQUEST: ResponseCode = ResponseCode::new(4, 0);
    /// 4.01 Unauthorized.
    pub const UNAUTHORIZED: ResponseCode = ResponseCode::new(4, 1);
    /// 4.02 Bad Option.
    pub const BAD_OPTION: ResponseCode = ResponseCode::new(4, 2);
    /// 4.03 Forbidden.
    pub const FORBIDDEN: ResponseCode = ResponseCode::new(4, 3);
    /// 4.04 Not Found.
    pub const NOT_FOUND: ResponseCode = ResponseCode::new(4, 4);
    /// 4.05 Method Not Allowed.
    pub const METHOD_NOT_ALLOWED: ResponseCode = ResponseCode::new(4, 5);
    /// 5.00 Internal Server Error.
    pub const INTERNAL_SERVER_ERROR: ResponseCode = ResponseCode::new(5, 0);
    /// 5.01 Not Implemented.
    pub const NOT_IMPLEMENTED: ResponseCode = ResponseCode::new(5, 1);
    /// 5.03 Service Unavailable. The node's RTC could not be accessed.
    pub const SERVICE_UNAVAILABLE: ResponseCode = ResponseCode::new(5, 3);
    /// 5.04 Gateway Timeout.
    pub const GATEWAY_TIMEOUT: ResponseCode = ResponseCode::new(5, 4);

    /// Build a code from its class and detail. Out-of-width bits are masked off.
    pub const fn new(class: u8, detail: u8) -> Self {
        ResponseCode {
            class: class & 0x07,
            detail: detail & 0x1f,
        }
    }

    /// Decode the single code byte of a CoAP header.
    pub const fn from_raw(raw: u8) -> Self {
        ResponseCode::new(raw >> 5, raw & 0x1f)
    }

    /// Encode as the single code byte of a CoAP header.
    pub const fn to_raw(self) -> u8 {
        (self.class << 5) | self.detail
    }

    /// The class digit (`2` in `2.04`).
    pub const fn class(self) -> u8 {
        self.class
    }

    /// The detail (`4` in `2.04`).
    pub const fn detail(self) -> u8 {
        self.detail
    }

    /// `true` for any 2.xx code.
    pub const fn is_success(self) -> bool {
        self.class == 2
    }

    /// `true` for any 4.xx code.
    pub const fn is_client_error(self) -> bool {
        self.class == 4
    }

    /// `true` for any 5.xx code.
    pub const fn is_server_error(self) -> bool {
        self.class == 5
    }

    /// Registered name of the code, if known.
    pub fn name(self) -> Option<&'static str> {
        let name = match (self.class, self.detail) {
            (2, 1) => "Created",
            (2, 2) => "Deleted",
            (2, 3) => "Valid",
            (2, 4) => "Changed",
            (2, 5) => "Content",
            (2, 31) => "Continue",
            (4, 0) => "Bad Request",
            (4, 1) => "Unauthorized",
            (4, 2) => "Bad Option",
            (4, 3) => "Forbidden",
            (4, 4) => "Not Found",
            (4, 5) => "Method Not Allowed",
            (4, 6) => "Not Acceptable",
            (4, 8) => "Request Entity Incomplete",
            (4, 12) => "Precondition Failed",
            (4, 13) => "Request Entity Too Large",
            (4, 15) => "Unsupported Content-Format",
            (5, 0) => "Internal Server Error",
            (5, 1) => "Not Implemented",
            (5, 2) => "Bad Gateway",
            (5, 3) => "Service Unavailable",
            (5, 4) => "Gateway Timeout",
            (5, 5) => "Proxying Not Supported",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.class, self.detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(ResponseCode::CHANGED.to_string(), "2.04");
        assert_eq!(ResponseCode::BAD_REQUEST.to_string(), "4.00");
        assert_eq!(ResponseCode::new(5, 3).to_string(), "5.03");
    }

    #[test]
    fn test_raw_roundtrip() {
        assert_eq!(ResponseCode::CHANGED.to_raw(), 0x44);
        assert_eq!(ResponseCode::from_raw(0x44), ResponseCode::CHANGED);
        assert_eq!(ResponseCode::from_raw(0x80), ResponseCode::BAD_REQUEST);
        assert_eq!(ResponseCode::from_raw(0xA3), ResponseCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_classes() {
        assert!(ResponseCode::CHANGED.is_success());
        assert!(ResponseCode::CONTENT.is_success());
        assert!(!ResponseCode::BAD_REQUEST.is_success());
        assert!(ResponseCode::NOT_FOUND.is_client_error());
        assert!(ResponseCode::SERVICE_UNAVAILABLE.is_server_error());
    }

    #[test]
    fn test_names() {
        assert_eq!(ResponseCode::CHANGED.name(), Some("Changed"));
        assert_eq!(ResponseCode::new(4, 30).name(), None);
    }
}
