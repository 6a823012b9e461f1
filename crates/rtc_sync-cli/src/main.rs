// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! `rtc-sync`: push the local wall-clock time to a sensor node over CoAP.
//!
//! ```text
//! rtc-sync set fe80::212:4b00:615:a8c1%lowpan0
//! rtc-sync set node-7.mesh --method post --format epoch --attempts 3
//! rtc-sync read node-7.mesh
//! ```
//!
//! Exit status: 0 success, 1 invalid target or usage, 2 rejected by the
//! node, 3 timed out, 4 transport failure.

use std::env::var;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use rtc_client::result::{EXIT_INVALID_TARGET, EXIT_REJECTED, EXIT_TIMED_OUT, EXIT_TRANSPORT};
use rtc_client::{DEFAULT_PATH, SetMethod, SyncClient, SyncError, SyncResult, SyncTarget};
use rtc_proto::{ClockSource, WireFormat};
use tracing::{info, warn};
use tracing_subscriber::fmt::layer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, registry};

const DEFAULT_FILTER: &str = "rtc_sync=info,rtc_client=info";

#[derive(Debug, Parser)]
#[command(name = "rtc-sync", version, about = "Set the real-time clock of CoAP sensor nodes")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write the current time to the node's clock resource.
    Set(SetArgs),
    /// Read the node's clock and report its offset from the local clock.
    Read(TargetArgs),
}

#[derive(Debug, Args)]
struct TargetArgs {
    /// Node address: IPv4, IPv6 (optionally bracketed, with %zone) or hostname, with optional :port.
    #[arg(value_name = "HOST", env = "RTC_SYNC_HOST")]
    host: String,

    /// UDP port, overriding any port in HOST.
    #[arg(long, env = "RTC_SYNC_PORT")]
    port: Option<u16>,

    /// Resource path on the node.
    #[arg(long, env = "RTC_SYNC_PATH", default_value = DEFAULT_PATH)]
    path: String,

    /// Bound on each attempt, e.g. `5s` or `500ms`.
    #[arg(long, env = "RTC_SYNC_TIMEOUT", default_value = "10s", value_parser = parse_timeout)]
    timeout: Duration,
}

#[derive(Debug, Args)]
struct SetArgs {
    #[command(flatten)]
    target: TargetArgs,

    /// Request method used to write the clock.
    #[arg(long, value_enum, default_value_t = MethodArg::Put)]
    method: MethodArg,

    /// How the time is carried: Uri-Query pairs or epoch seconds in the body.
    #[arg(long, value_enum, default_value_t = FormatArg::Query)]
    format: FormatArg,

    /// Send UTC instead of local time.
    #[arg(long)]
    utc: bool,

    /// Total attempts; timeouts and transport failures are retried.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    attempts: u32,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
enum MethodArg {
    Put,
    Post,
}

impl From<MethodArg> for SetMethod {
    fn from(arg: MethodArg) -> SetMethod {
        match arg {
            MethodArg::Put => SetMethod::Put,
            MethodArg::Post => SetMethod::Post,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
enum FormatArg {
    Query,
    Epoch,
}

impl From<FormatArg> for WireFormat {
    fn from(arg: FormatArg) -> WireFormat {
        match arg {
            FormatArg::Query => WireFormat::Query,
            FormatArg::Epoch => WireFormat::Epoch,
        }
    }
}

/// Parse a human-readable timeout such as `500ms`, `5s` or `1m 30s`.
fn parse_timeout(text: &str) -> Result<Duration, String> {
    let timeout = humantime::parse_duration(text).map_err(|e| e.to_string())?;
    if timeout.is_zero() {
        return Err("timeout must be positive".to_string());
    }
    Ok(timeout)
}

fn setup_logging() {
    let filter = EnvFilter::builder()
        .parse(format!("{DEFAULT_FILTER},{}", var("RUST_LOG").unwrap_or_default()))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    registry()
        .with(filter)
        .with(layer().with_writer(std::io::stderr))
        .init();
}

impl TargetArgs {
    fn target(&self) -> Result<SyncTarget, SyncError> {
        let target = SyncTarget::new(&self.host, &self.path)?;
        Ok(match self.port {
            Some(port) => target.with_port(port)?,
            None => target,
        })
    }
}

fn exit_code_for(err: &SyncError) -> u8 {
    match err {
        SyncError::InvalidTarget(_) => EXIT_INVALID_TARGET,
        SyncError::Rejected(_) => EXIT_REJECTED,
        SyncError::Timeout => EXIT_TIMED_OUT,
        SyncError::Transport(_) => EXIT_TRANSPORT,
    }
}

async fn run_set(args: SetArgs) -> u8 {
    let target = match args.target.target() {
        Ok(target) => target,
        Err(e) => {
            println!("clock not set: {e}");
            return EXIT_INVALID_TARGET;
        }
    };
    let clock = if args.utc {
        ClockSource::Utc
    } else {
        ClockSource::Local
    };
    let client = SyncClient::builder()
        .timeout(args.target.timeout)
        .method(args.method.into())
        .wire_format(args.format.into())
        .clock_source(clock)
        .build();

    info!(%target, method = %client.method(), timeout = ?client.timeout(), "setting node clock");
    let mut result: SyncResult = client.sync(&target).await;
    for attempt in 2..=args.attempts {
        if !result.is_retryable() {
            break;
        }
        warn!(%target, attempt, outcome = %result, "retrying");
        result = client.sync(&target).await;
    }

    println!("{result}");
    result.exit_code()
}

async fn run_read(args: TargetArgs) -> u8 {
    let target = match args.target() {
        Ok(target) => target,
        Err(e) => {
            println!("clock not read: {e}");
            return EXIT_INVALID_TARGET;
        }
    };
    let client = SyncClient::builder().timeout(args.timeout).build();

    info!(%target, "reading node clock");
    match client.read_clock(&target).await {
        Ok(reading) => {
            println!("{reading}");
            0
        }
        Err(e) => {
            println!("clock not read: {e}");
            exit_code_for(&e)
        }
    }
}

/// Print a clap error or help text and pick the exit status for it.
fn report_usage(err: &clap::Error) -> u8 {
    if err.print().is_err() {
        eprintln!("{err}");
    }
    if err.use_stderr() {
        EXIT_INVALID_TARGET
    } else {
        0
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => return ExitCode::from(report_usage(&e)),
    };
    setup_logging();

    let code = match cli.command {
        Command::Set(args) => run_set(args).await,
        Command::Read(args) => run_read(args).await,
    };
    ExitCode::from(code)
}
