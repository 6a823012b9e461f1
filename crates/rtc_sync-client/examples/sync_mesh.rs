// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Example setting the clock of several nodes concurrently.
//!
//! Run with: `cargo run --example sync_mesh -- <node> [<node>...]`

use std::time::Duration;

use rtc_client::{SyncClient, SyncTarget};

#[tokio::main]
async fn main() {
    let nodes: Vec<String> = std::env::args().skip(1).collect();
    if nodes.is_empty() {
        eprintln!("usage: sync_mesh <node> [<node>...]");
        std::process::exit(1);
    }

    let client = SyncClient::builder()
        .timeout(Duration::from_secs(5))
        .build();

    println!("Setting {} node clocks concurrently...\n", nodes.len());

    // Fire all syncs concurrently; each owns its own session.
    let handles: Vec<_> = nodes
        .into_iter()
        .map(|node| {
            let client = client.clone();
            tokio::spawn(async move {
                let outcome = match SyncTarget::parse(&node) {
                    Ok(target) => client.sync(&target).await.to_string(),
                    Err(e) => format!("invalid target: {e}"),
                };
                (node, outcome)
            })
        })
        .collect();

    for handle in handles {
        let (node, outcome) = handle.await.unwrap();
        println!("{node}: {outcome}");
    }
}
