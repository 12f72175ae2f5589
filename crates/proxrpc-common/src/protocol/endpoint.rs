//! Network endpoints carried by direct references.
//!
//! The stringified form is `<transport> [-h <host>] [-p <port>] [-t <ms>] [-z]`,
//! for example `tcp -h 10.0.0.5 -p 4061 -t 5000`. Hosts containing `:` (IPv6
//! literals) are double-quoted so that the `:` separating endpoints inside a
//! proxy string stays unambiguous.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::protocol::error::{ProxrpcError, Result};

/// Transport protocol of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Transport {
    Tcp,
    Udp,
    Ssl,
}

impl Transport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transport::Tcp => "tcp",
            Transport::Udp => "udp",
            Transport::Ssl => "ssl",
        }
    }

    /// Datagram transports have no connection and no invocation timeout.
    pub fn is_datagram(&self) -> bool {
        matches!(self, Transport::Udp)
    }

    pub fn is_secure(&self) -> bool {
        matches!(self, Transport::Ssl)
    }
}

impl FromStr for Transport {
    type Err = ProxrpcError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "tcp" | "default" => Ok(Transport::Tcp),
            "udp" => Ok(Transport::Udp),
            "ssl" => Ok(Transport::Ssl),
            other => Err(ProxrpcError::parse(format!("unknown transport `{}`", other))),
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub transport: Transport,
    /// Host name or address; empty means "any local interface".
    pub host: String,
    pub port: u16,
    /// Invocation timeout; `None` is infinite.
    pub timeout_ms: Option<u32>,
    pub compress: bool,
}

impl Endpoint {
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self {
            transport: Transport::Tcp,
            host: host.into(),
            port,
            timeout_ms: None,
            compress: false,
        }
    }

    pub fn udp(host: impl Into<String>, port: u16) -> Self {
        Self {
            transport: Transport::Udp,
            ..Self::tcp(host, port)
        }
    }

    pub fn ssl(host: impl Into<String>, port: u16) -> Self {
        Self {
            transport: Transport::Ssl,
            ..Self::tcp(host, port)
        }
    }

    /// Sets the invocation timeout. Datagram endpoints have none and are
    /// returned unchanged.
    pub fn with_timeout(mut self, timeout_ms: u32) -> Self {
        if !self.transport.is_datagram() {
            self.timeout_ms = Some(timeout_ms);
        }
        self
    }

    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// `host:port` form suitable for socket address resolution.
    pub fn address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for Endpoint {
    type Err = ProxrpcError;

    /// Parses a single endpoint description.
    ///
    /// # Errors
    ///
    /// Returns [`ProxrpcError::Parse`] for an unknown transport, an unknown or
    /// incomplete option, a port outside `0..=65535`, or a timeout on a
    /// datagram endpoint.
    fn from_str(s: &str) -> Result<Self> {
        let tokens = split_args(s)?;
        let mut tokens = tokens.into_iter();

        let transport: Transport = tokens
            .next()
            .ok_or_else(|| ProxrpcError::parse("empty endpoint"))?
            .parse()?;

        let mut endpoint = Endpoint {
            transport,
            host: String::new(),
            port: 0,
            timeout_ms: None,
            compress: false,
        };

        while let Some(option) = tokens.next() {
            let mut argument = |name: &str| {
                tokens.next().ok_or_else(|| {
                    ProxrpcError::parse(format!(
                        "no argument provided for {} option in endpoint `{}`",
                        name, s
                    ))
                })
            };

            match option.as_str() {
                "-h" => endpoint.host = argument("-h")?,
                "-p" => {
                    let value = argument("-p")?;
                    endpoint.port = value.parse().map_err(|_| {
                        ProxrpcError::parse(format!("invalid port `{}` in endpoint `{}`", value, s))
                    })?;
                }
                "-t" => {
                    if transport.is_datagram() {
                        return Err(ProxrpcError::parse(format!(
                            "timeout is not supported by {} endpoint `{}`",
                            transport, s
                        )));
                    }
                    let value = argument("-t")?;
                    endpoint.timeout_ms = if value == "infinite" {
                        None
                    } else {
                        Some(value.parse().map_err(|_| {
                            ProxrpcError::parse(format!(
                                "invalid timeout `{}` in endpoint `{}`",
                                value, s
                            ))
                        })?)
                    };
                }
                "-z" => endpoint.compress = true,
                other => {
                    return Err(ProxrpcError::parse(format!(
                        "unknown option `{}` in endpoint `{}`",
                        other, s
                    )))
                }
            }
        }

        Ok(endpoint)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.transport.as_str())?;
        if !self.host.is_empty() {
            if self.host.contains(':') || self.host.contains(char::is_whitespace) {
                write!(f, " -h \"{}\"", self.host)?;
            } else {
                write!(f, " -h {}", self.host)?;
            }
        }
        write!(f, " -p {}", self.port)?;
        match self.timeout_ms {
            Some(timeout) if !self.transport.is_datagram() => write!(f, " -t {}", timeout)?,
            _ => {}
        }
        if self.compress {
            f.write_str(" -z")?;
        }
        Ok(())
    }
}

/// Splits on whitespace, keeping double-quoted runs together (quotes removed).
fn split_args(s: &str) -> Result<Vec<String>> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut pending = false;

    for c in s.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                pending = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if pending {
                    args.push(std::mem::take(&mut current));
                    pending = false;
                }
            }
            c => {
                current.push(c);
                pending = true;
            }
        }
    }

    if in_quotes {
        return Err(ProxrpcError::parse(format!("mismatched quotes in endpoint `{}`", s)));
    }
    if pending {
        args.push(current);
    }

    Ok(args)
}
