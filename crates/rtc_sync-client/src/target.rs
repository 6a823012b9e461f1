// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Node addressing: host, port and resource path, validated up front.
//!
//! Hosts may be IPv4 or IPv6 literals (bracketed or bare), link-local IPv6
//! addresses with a zone (`fe80::c30c:0:0:1%lowpan0`, `[fe80::1%2]:5683`), or
//! hostnames.

use std::fmt;
use std::net::{IpAddr, Ipv6Addr, SocketAddr, SocketAddrV6};
use std::str::FromStr;

use rtc_proto::COAP_PORT;

use crate::error::{TargetError, TransportError};

/// Resource path of the node's clock.
pub const DEFAULT_PATH: &str = "/date";

const MAX_HOSTNAME_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;
// Uri-Path option values are limited to 255 bytes.
const MAX_SEGMENT_LEN: usize = 255;

/// The host part of a [`SyncTarget`].
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Host {
    /// Numeric IPv4 or IPv6 address.
    Ip(IpAddr),
    /// IPv6 address with a zone (interface name or numeric scope id).
    Scoped {
        /// The address.
        addr: Ipv6Addr,
        /// Interface name or index.
        zone: String,
    },
    /// Hostname to be resolved.
    Name(String),
}

impl Host {
    fn parse(text: &str) -> Result<Host, TargetError> {
        if text.is_empty() {
            return Err(TargetError::EmptyHost);
        }
        if let Some((addr, zone)) = text.split_once('%') {
            let invalid_zone = || TargetError::InvalidZone {
                host: text.to_string(),
            };
            let addr: Ipv6Addr = addr.parse().map_err(|_| invalid_zone())?;
            let zone_ok = !zone.is_empty()
                && zone
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'));
            if !zone_ok {
                return Err(invalid_zone());
            }
            return Ok(Host::Scoped {
                addr,
                zone: zone.to_string(),
            });
        }
        if let Ok(ip) = text.parse::<IpAddr>() {
            return Ok(Host::Ip(ip));
        }
        if is_valid_hostname(text) {
            return Ok(Host::Name(text.to_ascii_lowercase()));
        }
        Err(TargetError::InvalidHost {
            host: text.to_string(),
        })
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Host::Ip(IpAddr::V4(ip)) => write!(f, "{ip}"),
            Host::Ip(IpAddr::V6(ip)) => write!(f, "[{ip}]"),
            Host::Scoped { addr, zone } => write!(f, "[{addr}%{zone}]"),
            Host::Name(name) => write!(f, "{name}"),
        }
    }
}

fn is_valid_hostname(name: &str) -> bool {
    let name = name.strip_suffix('.').unwrap_or(name);
    if name.is_empty() || name.len() > MAX_HOSTNAME_LEN {
        return false;
    }
    // A name made only of digits and dots is a mistyped IPv4 address.
    if name.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return false;
    }
    name.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= MAX_LABEL_LEN
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
    })
}

fn parse_port(text: &str) -> Result<u16, TargetError> {
    match text.parse::<u16>() {
        Ok(port) if port != 0 && text.bytes().all(|b| b.is_ascii_digit()) => Ok(port),
        _ => Err(TargetError::InvalidPort {
            port: text.to_string(),
        }),
    }
}

fn parse_path(path: &str) -> Result<Vec<String>, TargetError> {
    let invalid = |reason| TargetError::InvalidPath {
        path: path.to_string(),
        reason,
    };
    let rest = path.strip_prefix('/').ok_or_else(|| invalid("must start with '/'"))?;
    if path.contains(['?', '#']) {
        return Err(invalid("query and fragment are not allowed"));
    }
    if rest.is_empty() {
        return Err(invalid("names no resource"));
    }
    rest.split('/')
        .map(|segment| match segment {
            "" => Err(invalid("empty segment")),
            "." | ".." => Err(invalid("relative segment")),
            s if s.len() > MAX_SEGMENT_LEN => Err(invalid("segment longer than 255 bytes")),
            s => Ok(s.to_string()),
        })
        .collect()
}

/// Split `authority` into host text and optional port text.
fn split_authority(authority: &str) -> Result<(&str, Option<&str>), TargetError> {
    if let Some(rest) = authority.strip_prefix('[') {
        let (host, after) = rest.split_once(']').ok_or_else(|| TargetError::InvalidHost {
            host: authority.to_string(),
        })?;
        return match after {
            "" => Ok((host, None)),
            _ => match after.strip_prefix(':') {
                Some(port) => Ok((host, Some(port))),
                None => Err(TargetError::InvalidHost {
                    host: authority.to_string(),
                }),
            },
        };
    }
    match authority.matches(':').count() {
        // Bare IPv6 literal; a port needs brackets.
        n if n > 1 => Ok((authority, None)),
        1 => {
            let (host, port) = authority.split_once(':').unwrap_or((authority, ""));
            Ok((host, Some(port)))
        }
        _ => Ok((authority, None)),
    }
}

/// A node to synchronize: where it is and which resource holds its clock.
///
/// Immutable once built; all validation happens at construction so that an
/// invalid target is reported before any network activity.
///
/// ```
/// use rtc_client::SyncTarget;
///
/// let target: SyncTarget = "[fe80::c30c:0:0:1%lowpan0]:5683".parse().unwrap();
/// assert_eq!(target.port(), 5683);
/// assert_eq!(target.path(), "/date");
///
/// let target = SyncTarget::new("node-12.mesh.local", "/rtc/date").unwrap();
/// assert_eq!(target.path_segments(), ["rtc", "date"]);
/// assert!(SyncTarget::new("node-12", "date").is_err());
/// ```
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct SyncTarget {
    host: Host,
    port: u16,
    path: Vec<String>,
}

impl SyncTarget {
    /// Build a target from an authority (`host`, `host:port`, `[v6]:port`) and a resource path.
    pub fn new(authority: &str, path: &str) -> Result<Self, TargetError> {
        let (host, port) = split_authority(authority.trim())?;
        Ok(SyncTarget {
            host: Host::parse(host)?,
            port: port.map(parse_port).transpose()?.unwrap_or(COAP_PORT),
            path: parse_path(path)?,
        })
    }

    /// Build a target for the default `/date` resource.
    pub fn parse(authority: &str) -> Result<Self, TargetError> {
        Self::new(authority, DEFAULT_PATH)
    }

    /// Replace the port.
    pub fn with_port(mut self, port: u16) -> Result<Self, TargetError> {
        if port == 0 {
            return Err(TargetError::InvalidPort {
                port: port.to_string(),
            });
        }
        self.port = port;
        Ok(self)
    }

    /// Replace the resource path.
    pub fn with_path(mut self, path: &str) -> Result<Self, TargetError> {
        self.path = parse_path(path)?;
        Ok(self)
    }

    /// The host.
    pub fn host(&self) -> &Host {
        &self.host
    }

    /// The UDP port (5683 unless overridden).
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The resource path as individual Uri-Path segments.
    pub fn path_segments(&self) -> &[String] {
        &self.path
    }

    /// The resource path, e.g. `/date`.
    pub fn path(&self) -> String {
        format!("/{}", self.path.join("/"))
    }

    /// Value for the Uri-Host option: only hostnames need one, since for IP
    /// literals it equals the destination address.
    pub fn uri_host(&self) -> Option<&str> {
        match &self.host {
            Host::Name(name) => Some(name),
            _ => None,
        }
    }

    /// Resolve to socket addresses, IPv6 first.
    pub async fn resolve(&self) -> Result<Vec<SocketAddr>, TransportError> {
        let addrs: Vec<SocketAddr> = match &self.host {
            Host::Ip(ip) => vec![SocketAddr::new(*ip, self.port)],
            Host::Scoped { addr, zone } => match zone.parse::<u32>() {
                Ok(scope_id) => vec![SocketAddr::V6(SocketAddrV6::new(
                    *addr, self.port, 0, scope_id,
                ))],
                // Interface names are mapped to scope ids by the system resolver.
                Err(_) => self.lookup(&format!("{addr}%{zone}")).await?,
            },
            Host::Name(name) => self.lookup(name).await?,
        };
        if addrs.is_empty() {
            return Err(TransportError::NoAddresses {
                host: self.host.to_string(),
            });
        }
        Ok(prefer_ipv6(addrs))
    }

    async fn lookup(&self, host: &str) -> Result<Vec<SocketAddr>, TransportError> {
        tokio::net::lookup_host((host, self.port))
            .await
            .map(|addrs| addrs.collect())
            .map_err(|e| TransportError::Resolve {
                host: host.to_string(),
                detail: e.to_string(),
            })
    }
}

/// Keep resolver order but put IPv6 addresses first; sensor meshes are IPv6-only.
fn prefer_ipv6(mut addrs: Vec<SocketAddr>) -> Vec<SocketAddr> {
    addrs.sort_by_key(|a| !a.is_ipv6());
    addrs
}

impl fmt::Display for SyncTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "coap://{}:{}{}", self.host, self.port, self.path())
    }
}

impl FromStr for SyncTarget {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SyncTarget::parse(s)
    }
}
