//! Invocation failures reported by the transport and dispatch layers.
//!
//! [`Failure`] is a closed set of failure kinds. The retry engine never looks
//! at messages; it branches on [`Failure::class`] only.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::identity::Identity;

/// Coarse classification the retry engine branches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureClass {
    /// The target object does not exist at the endpoint that was contacted.
    ObjectNotExist,
    /// The request reached a server and failed for a reason retrying cannot fix.
    OtherRequestFailed,
    /// Connection, transport or timeout trouble; the request may not have been
    /// delivered at all.
    TransportOrTimeout,
}

/// The target of a request that a server rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestTarget {
    pub identity: Identity,
    pub facet: String,
    pub operation: String,
}

impl RequestTarget {
    pub fn new(identity: Identity, facet: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            identity,
            facet: facet.into(),
            operation: operation.into(),
        }
    }
}

impl fmt::Display for RequestTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "identity `{}`", self.identity)?;
        if !self.facet.is_empty() {
            write!(f, " facet `{}`", self.facet)?;
        }
        if !self.operation.is_empty() {
            write!(f, " operation `{}`", self.operation)?;
        }
        Ok(())
    }
}

/// What a locator lookup was searching for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LookupKind {
    Object,
    Adapter,
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupKind::Object => f.write_str("object"),
            LookupKind::Adapter => f.write_str("object adapter"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    #[error("object does not exist: {0}")]
    ObjectNotExist(RequestTarget),

    #[error("facet does not exist: {0}")]
    FacetNotExist(RequestTarget),

    #[error("operation does not exist: {0}")]
    OperationNotExist(RequestTarget),

    #[error("{kind} `{id}` is not registered with the locator")]
    NotRegistered { kind: LookupKind, id: String },

    #[error("no endpoint available for proxy `{0}`")]
    NoEndpoint(String),

    #[error("connection refused: {0}")]
    ConnectionRefused(String),

    #[error("connection lost: {0}")]
    ConnectionLost(String),

    #[error("connect timed out after {0}ms")]
    ConnectTimeout(u64),

    #[error("invocation timed out after {0}ms")]
    Timeout(u64),

    #[error("socket error: {0}")]
    Socket(String),

    #[error("cannot resolve host `{0}`")]
    DnsFailure(String),

    #[error("communicator has been destroyed")]
    CommunicatorDestroyed,

    #[error("unknown local failure: {0}")]
    Unknown(String),
}

impl Failure {
    /// Maps the failure kind to the class the retry engine acts on.
    ///
    /// `NotRegistered`, `NoEndpoint` and `CommunicatorDestroyed` are reported by
    /// the client side itself and retrying them cannot change the outcome, so
    /// they join the request-failed class.
    pub fn class(&self) -> FailureClass {
        match self {
            Failure::ObjectNotExist(_) => FailureClass::ObjectNotExist,
            Failure::FacetNotExist(_)
            | Failure::OperationNotExist(_)
            | Failure::NotRegistered { .. }
            | Failure::NoEndpoint(_)
            | Failure::CommunicatorDestroyed => FailureClass::OtherRequestFailed,
            Failure::ConnectionRefused(_)
            | Failure::ConnectionLost(_)
            | Failure::ConnectTimeout(_)
            | Failure::Timeout(_)
            | Failure::Socket(_)
            | Failure::DnsFailure(_)
            | Failure::Unknown(_) => FailureClass::TransportOrTimeout,
        }
    }

    /// Short stable name of the kind, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Failure::ObjectNotExist(_) => "object_not_exist",
            Failure::FacetNotExist(_) => "facet_not_exist",
            Failure::OperationNotExist(_) => "operation_not_exist",
            Failure::NotRegistered { .. } => "not_registered",
            Failure::NoEndpoint(_) => "no_endpoint",
            Failure::ConnectionRefused(_) => "connection_refused",
            Failure::ConnectionLost(_) => "connection_lost",
            Failure::ConnectTimeout(_) => "connect_timeout",
            Failure::Timeout(_) => "timeout",
            Failure::Socket(_) => "socket",
            Failure::DnsFailure(_) => "dns",
            Failure::CommunicatorDestroyed => "communicator_destroyed",
            Failure::Unknown(_) => "unknown",
        }
    }
}

impl From<std::io::Error> for Failure {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;

        match err.kind() {
            ErrorKind::ConnectionRefused => Failure::ConnectionRefused(err.to_string()),
            ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::UnexpectedEof => Failure::ConnectionLost(err.to_string()),
            ErrorKind::TimedOut => Failure::Timeout(0),
            _ => Failure::Socket(err.to_string()),
        }
    }
}
