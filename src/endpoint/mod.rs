//! Endpoint descriptors and per-call target resolution.
//!
//! Remote targets are written exactly as `scheme://host:port`, where the
//! scheme is `tcp` or `http`, the host is a hostname or dotted IPv4 address,
//! and the port is in 1-65535. Local targets name an explicit socket
//! (`unix:///path` or `npipe:////./pipe/name`).
//!
//! `https` is rejected as an unsupported scheme: the connector carries no
//! client certificates, so a TLS endpoint could never be reached.
//!
//! Partial addresses are rejected. When the missing piece can be identified
//! the error carries a corrected address, but the parser never applies it.

mod resolver;


use std::fmt;
use std::net::Ipv4Addr;

use serde::Serialize;

pub use resolver::{Resolution, TargetResolver};

use crate::error::AddressFormatError;

/// Conventional plaintext engine port, used only in suggestions.
const DEFAULT_PLAIN_PORT: u16 = 2375;

const MAX_HOSTNAME_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// How a descriptor reaches its engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// A Unix socket or Windows named pipe on this host.
    Local,
    /// An engine API served over TCP.
    Remote,
}

/// A parsed, immutable engine endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EndpointDescriptor {
    transport: Transport,
    scheme: String,
    address: String,
    port: Option<u16>,
}

impl EndpointDescriptor {
    /// Parse an endpoint address.
    ///
    /// # Errors
    ///
    /// Returns [`AddressFormatError`] when the address is not exactly
    /// `scheme://host:port` (remote) or an explicit socket URI (local).
    pub fn parse(input: &str) -> Result<Self, AddressFormatError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(AddressFormatError::Empty);
        }

        match trimmed.split_once("://") {
            Some((scheme, rest)) => parse_with_scheme(trimmed, &scheme.to_ascii_lowercase(), rest),
            None => Err(diagnose_schemeless(trimmed)),
        }
    }

    /// The transport used to reach the engine.
    #[must_use]
    pub const fn transport(&self) -> Transport {
        self.transport
    }

    /// The URI scheme, lower-cased.
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// The host (remote) or socket path (local).
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The TCP port, present only for remote descriptors.
    #[must_use]
    pub const fn port(&self) -> Option<u16> {
        self.port
    }

    /// Whether the descriptor names a remote engine.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self.transport, Transport::Remote)
    }

    /// The canonical URI for this descriptor.
    #[must_use]
    pub fn uri(&self) -> String {
        match self.port {
            Some(port) => format!("{}://{}:{port}", self.scheme, self.address),
            None => format!("{}://{}", self.scheme, self.address),
        }
    }
}

impl fmt::Display for EndpointDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri())
    }
}

impl std::str::FromStr for EndpointDescriptor {
    type Err = AddressFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_with_scheme(
    input: &str,
    scheme: &str,
    rest: &str,
) -> Result<EndpointDescriptor, AddressFormatError> {
    match scheme {
        "unix" | "npipe" => parse_local(input, scheme, rest),
        "tcp" | "http" => parse_remote(input, scheme, rest),
        other => Err(AddressFormatError::UnsupportedScheme {
            input: input.to_owned(),
            scheme: other.to_owned(),
        }),
    }
}

fn parse_local(
    input: &str,
    scheme: &str,
    path: &str,
) -> Result<EndpointDescriptor, AddressFormatError> {
    if !(path.starts_with('/') || path.starts_with('\\')) || path.len() < 2 {
        return Err(AddressFormatError::Malformed {
            input: input.to_owned(),
            reason: String::from("local socket URIs need an absolute path"),
        });
    }

    Ok(EndpointDescriptor {
        transport: Transport::Local,
        scheme: scheme.to_owned(),
        address: path.to_owned(),
        port: None,
    })
}

fn parse_remote(
    input: &str,
    scheme: &str,
    authority: &str,
) -> Result<EndpointDescriptor, AddressFormatError> {
    if authority.contains(['/', '?', '#', '@']) {
        return Err(AddressFormatError::Malformed {
            input: input.to_owned(),
            reason: String::from("remote addresses take no path, query, or credentials"),
        });
    }

    let Some((host, port)) = authority.rsplit_once(':') else {
        if is_valid_host(authority) {
            return Err(AddressFormatError::MissingPort {
                input: input.to_owned(),
                suggestion: format!("{scheme}://{authority}:{DEFAULT_PLAIN_PORT}"),
            });
        }
        return Err(invalid_host(input, authority));
    };

    if host.is_empty() {
        return Err(AddressFormatError::Malformed {
            input: input.to_owned(),
            reason: String::from("missing host"),
        });
    }
    if !is_valid_host(host) {
        return Err(invalid_host(input, host));
    }
    let port_number = parse_port(input, port)?;

    Ok(EndpointDescriptor {
        transport: Transport::Remote,
        scheme: scheme.to_owned(),
        address: host.to_ascii_lowercase(),
        port: Some(port_number),
    })
}

/// Work out which part of a scheme-less address is missing.
fn diagnose_schemeless(input: &str) -> AddressFormatError {
    if input.starts_with('/') {
        return AddressFormatError::MissingScheme {
            input: input.to_owned(),
            suggestion: format!("unix://{input}"),
        };
    }

    match input.rsplit_once(':') {
        Some((host, port)) => {
            if !is_valid_host(host) {
                return invalid_host(input, host);
            }
            match parse_port(input, port) {
                Ok(port_number) => AddressFormatError::MissingScheme {
                    input: input.to_owned(),
                    suggestion: format!("tcp://{host}:{port_number}"),
                },
                Err(error) => error,
            }
        }
        None if is_valid_host(input) => AddressFormatError::MissingSchemeAndPort {
            input: input.to_owned(),
            suggestion: format!("tcp://{input}:{DEFAULT_PLAIN_PORT}"),
        },
        None => invalid_host(input, input),
    }
}

fn parse_port(input: &str, port: &str) -> Result<u16, AddressFormatError> {
    port.parse::<u16>()
        .ok()
        .filter(|value| *value != 0)
        .ok_or_else(|| AddressFormatError::InvalidPort {
            input: input.to_owned(),
            port: port.to_owned(),
        })
}

fn invalid_host(input: &str, host: &str) -> AddressFormatError {
    AddressFormatError::InvalidHost {
        input: input.to_owned(),
        host: host.to_owned(),
    }
}

/// Accept a dotted IPv4 address or an RFC 1123 hostname.
fn is_valid_host(host: &str) -> bool {
    if host.is_empty() || host.len() > MAX_HOSTNAME_LEN {
        return false;
    }

    // All-numeric hosts must be a complete dotted quad.
    if host.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return host.parse::<Ipv4Addr>().is_ok();
    }

    host.split('.').all(is_valid_label)
}

fn is_valid_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= MAX_LABEL_LEN
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}
