// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Wire-level types for setting the real-time clock of CoAP sensor nodes.
//!
//! This crate has no I/O. It provides:
//!
//! - [`TimeFields`]: broken-down wall-clock time with validated ranges, its
//!   `y=..&mo=..&d=..&h=..&mi=..&se=..` query form and its epoch form.
//! - [`TimePayloadBuilder`]: captures the local clock and renders the
//!   clock-set [`Request`](message::Request).
//! - [`ResponseCode`]: CoAP `c.dd` response codes.
//! - [`message::Frame`]: CoAP datagram encoding and decoding.

#![warn(missing_docs)]

/// Error types for time-field parsing and datagram encoding.
pub mod error;

pub mod code;
pub mod message;
pub mod payload;

/// Broken-down wall-clock time and its serialized forms.
pub mod time_fields;

pub use code::ResponseCode;
pub use error::{CodecError, ParseError};
pub use message::{COAP_PORT, Method};
pub use payload::{ClockSource, TimePayloadBuilder, WireFormat};
pub use time_fields::TimeFields;
