// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Error types for time-field parsing and CoAP datagram encoding.
//!
//! Both types convert into [`std::io::Error`] so that callers working at the
//! socket level can propagate them with `?`.

use core::fmt;

/// Errors produced while validating or parsing [`TimeFields`](crate::TimeFields).
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParseError {
    /// A field value lies outside its documented range.
    OutOfRange {
        /// Query key of the offending field (`y`, `mo`, `d`, `h`, `mi`, `se`).
        field: &'static str,
        /// The rejected value.
        value: i64,
    },
    /// The day does not exist in the given month and year (e.g. 31 April).
    NonexistentDate {
        /// Year of the rejected date.
        year: i32,
        /// Month of the rejected date.
        month: u8,
        /// Day of the rejected date.
        day: u8,
    },
    /// A required query field was absent.
    MissingField {
        /// Query key of the missing field.
        field: &'static str,
    },
    /// A query field appeared more than once.
    DuplicateField {
        /// Query key of the repeated field.
        field: &'static str,
    },
    /// A query pair used a key the node does not understand.
    UnknownField {
        /// The unrecognized key.
        key: String,
    },
    /// A query pair was not of the form `key=value`.
    MalformedPair {
        /// The offending pair.
        pair: String,
    },
    /// A value was not a plain decimal integer.
    InvalidNumber {
        /// The text that failed to parse.
        text: String,
    },
    /// The fields cannot be expressed as an unsigned 32-bit epoch.
    EpochOverflow,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::OutOfRange { field, value } => {
                write!(f, "time field '{field}' out of range: {value}")
            }
            ParseError::NonexistentDate { year, month, day } => {
                write!(f, "date does not exist: {year:04}-{month:02}-{day:02}")
            }
            ParseError::MissingField { field } => write!(f, "missing time field '{field}'"),
            ParseError::DuplicateField { field } => write!(f, "duplicate time field '{field}'"),
            ParseError::UnknownField { key } => write!(f, "unknown time field '{key}'"),
            ParseError::MalformedPair { pair } => write!(f, "malformed query pair '{pair}'"),
            ParseError::InvalidNumber { text } => write!(f, "not a decimal integer: '{text}'"),
            ParseError::EpochOverflow => write!(f, "time is outside the 32-bit epoch range"),
        }
    }
}

impl std::error::Error for ParseError {}

impl From<ParseError> for std::io::Error {
    fn from(err: ParseError) -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::InvalidData, err)
    }
}

/// Errors produced while encoding or decoding CoAP datagrams.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CodecError {
    /// The datagram could not be parsed as a CoAP message.
    Malformed {
        /// Detail from the underlying decoder.
        detail: String,
    },
    /// The message could not be serialized.
    Encode {
        /// Detail from the underlying encoder.
        detail: String,
    },
    /// A request code that is not one of the methods this client speaks.
    UnsupportedMethod {
        /// The raw code byte.
        code: u8,
    },
    /// A token longer than the 8 bytes CoAP allows.
    TokenTooLong {
        /// Length of the rejected token.
        len: usize,
    },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::Malformed { detail } => write!(f, "malformed CoAP message: {detail}"),
            CodecError::Encode { detail } => write!(f, "failed to encode CoAP message: {detail}"),
            CodecError::UnsupportedMethod { code } => {
                write!(f, "unsupported CoAP method code 0.{:02}", code & 0x1f)
            }
            CodecError::TokenTooLong { len } => {
                write!(f, "CoAP token too long ({len} bytes, max 8)")
            }
        }
    }
}

impl std::error::Error for CodecError {}

impl From<CodecError> for std::io::Error {
    fn from(err: CodecError) -> std::io::Error {
        let kind = match &err {
            CodecError::Encode { .. } | CodecError::TokenTooLong { .. } => {
                std::io::ErrorKind::InvalidInput
            }
            CodecError::Malformed { .. } | CodecError::UnsupportedMethod { .. } => {
                std::io::ErrorKind::InvalidData
            }
        };
        std::io::Error::new(kind, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_out_of_range() {
        let err = ParseError::OutOfRange {
            field: "mo",
            value: 13,
        };
        assert_eq!(err.to_string(), "time field 'mo' out of range: 13");
    }

    #[test]
    fn test_display_nonexistent_date() {
        let err = ParseError::NonexistentDate {
            year: 2023,
            month: 2,
            day: 29,
        };
        assert_eq!(err.to_string(), "date does not exist: 2023-02-29");
    }

    #[test]
    fn test_display_unsupported_method() {
        let err = CodecError::UnsupportedMethod { code: 0x05 };
        assert_eq!(err.to_string(), "unsupported CoAP method code 0.05");
    }

    #[test]
    fn test_parse_error_to_io_error() {
        let io_err: std::io::Error = ParseError::MissingField { field: "y" }.into();
        assert_eq!(io_err.kind(), std::io::ErrorKind::InvalidData);
        let inner = io_err
            .get_ref()
            .unwrap()
            .downcast_ref::<ParseError>()
            .unwrap();
        assert_eq!(inner, &ParseError::MissingField { field: "y" });
    }

    #[test]
    fn test_codec_error_io_kind() {
        let io_err: std::io::Error = CodecError::TokenTooLong { len: 9 }.into();
        assert_eq!(io_err.kind(), std::io::ErrorKind::InvalidInput);
        let io_err: std::io::Error = CodecError::Malformed {
            detail: "x".into(),
        }
        .into();
        assert_eq!(io_err.kind(), std::io::ErrorKind::InvalidData);
    }
}
