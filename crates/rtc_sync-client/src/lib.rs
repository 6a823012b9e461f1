// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

/*!
CoAP client that sets the real-time clock of constrained sensor nodes.

# Example
Writes the local time to a node's `/date` resource and reports how the node
answered.

```rust,no_run
use rtc_client::{SyncClient, SyncTarget};

#[tokio::main]
async fn main() {
    let target = SyncTarget::parse("[fd00::212:4b00:615:a8c1]:5683").unwrap();
    let result = SyncClient::new().sync(&target).await;
    println!("{result}");
    std::process::exit(i32::from(result.exit_code()));
}
```

Time is sent as Uri-Query pairs (`y=2024&mo=3&d=15&h=14&mi=5&se=9`) by
default, or as epoch seconds in a `text/plain` body with
[`WireFormat::Epoch`](rtc_proto::WireFormat::Epoch).
*/

#![warn(missing_docs)]

pub use rtc_proto::{
    ClockSource, Method, ResponseCode, TimeFields, TimePayloadBuilder, WireFormat, code, message,
};

pub mod client;

pub mod error;
pub mod result;

pub mod target;

pub mod transport;
pub mod udp;

pub use client::{DEFAULT_TIMEOUT, SetMethod, SyncClient, SyncClientBuilder};
pub use error::{SyncError, TargetError, TransportError};
pub use result::{ClockReading, SyncFailure, SyncResult, SyncState};
pub use target::{DEFAULT_PATH, Host, SyncTarget};
pub use udp::{RetransmitPolicy, UdpTransport};
