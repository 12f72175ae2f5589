//! Immutable references: what a proxy points at and how to reach it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::protocol::endpoint::Endpoint;
use crate::protocol::error::{ProxrpcError, Result};
use crate::protocol::identity::Identity;

/// How requests sent through a reference are delivered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvocationMode {
    #[default]
    Twoway,
    Oneway,
    BatchOneway,
    Datagram,
    BatchDatagram,
}

impl InvocationMode {
    /// Stringified proxy option for the mode.
    pub fn flag(&self) -> &'static str {
        match self {
            InvocationMode::Twoway => "-t",
            InvocationMode::Oneway => "-o",
            InvocationMode::BatchOneway => "-O",
            InvocationMode::Datagram => "-d",
            InvocationMode::BatchDatagram => "-D",
        }
    }

    pub fn from_flag(flag: char) -> Option<Self> {
        match flag {
            't' => Some(InvocationMode::Twoway),
            'o' => Some(InvocationMode::Oneway),
            'O' => Some(InvocationMode::BatchOneway),
            'd' => Some(InvocationMode::Datagram),
            'D' => Some(InvocationMode::BatchDatagram),
            _ => None,
        }
    }

    /// Batched requests are queued locally and flushed later.
    pub fn is_batch(&self) -> bool {
        matches!(self, InvocationMode::BatchOneway | InvocationMode::BatchDatagram)
    }

    pub fn is_twoway(&self) -> bool {
        matches!(self, InvocationMode::Twoway)
    }
}

macro_rules! version_type {
    ($name:ident, $what:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name {
            pub major: u8,
            pub minor: u8,
        }

        impl $name {
            pub const fn new(major: u8, minor: u8) -> Self {
                Self { major, minor }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new(1, 0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}.{}", self.major, self.minor)
            }
        }

        impl FromStr for $name {
            type Err = ProxrpcError;

            fn from_str(s: &str) -> Result<Self> {
                let invalid = || ProxrpcError::parse(format!("invalid {} version `{}`", $what, s));
                let (major, minor) = s.split_once('.').ok_or_else(invalid)?;
                Ok(Self {
                    major: major.parse().map_err(|_| invalid())?,
                    minor: minor.parse().map_err(|_| invalid())?,
                })
            }
        }
    };
}

version_type!(ProtocolVersion, "protocol");
version_type!(EncodingVersion, "encoding");

/// Where a reference points: explicit endpoints or a locator lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    Direct {
        endpoints: Vec<Endpoint>,
    },
    Indirect {
        /// Object adapter to look up; `None` for a well-known object looked up
        /// by identity.
        adapter_id: Option<String>,
        /// Endpoints attached by whoever built the reference in-process. Never
        /// part of the string or binary forms.
        cached_endpoints: Option<Vec<Endpoint>>,
    },
}

/// Key under which a locator resolution is cached.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LocatorKey {
    Adapter(String),
    Object(Identity),
}

impl fmt::Display for LocatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocatorKey::Adapter(id) => write!(f, "adapter `{}`", id),
            LocatorKey::Object(identity) => write!(f, "object `{}`", identity),
        }
    }
}

/// Immutable description of a remote object.
///
/// Equality and hashing are structural over every field; proxies and locator
/// cache lookups depend on that.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    pub identity: Identity,
    pub facet: String,
    pub mode: InvocationMode,
    pub secure: bool,
    pub protocol: ProtocolVersion,
    pub encoding: EncodingVersion,
    pub target: Target,
}

impl Reference {
    /// Direct reference to `identity` at `endpoints`, all other fields default.
    pub fn direct(identity: Identity, endpoints: Vec<Endpoint>) -> Self {
        Self::with_target(identity, Target::Direct { endpoints })
    }

    /// Indirect reference resolved through the object adapter `adapter_id`.
    pub fn adapter(identity: Identity, adapter_id: impl Into<String>) -> Self {
        Self::with_target(
            identity,
            Target::Indirect {
                adapter_id: Some(adapter_id.into()),
                cached_endpoints: None,
            },
        )
    }

    /// Indirect reference to a well-known object resolved by identity.
    pub fn well_known(identity: Identity) -> Self {
        Self::with_target(
            identity,
            Target::Indirect {
                adapter_id: None,
                cached_endpoints: None,
            },
        )
    }

    fn with_target(identity: Identity, target: Target) -> Self {
        Self {
            identity,
            facet: String::new(),
            mode: InvocationMode::default(),
            secure: false,
            protocol: ProtocolVersion::default(),
            encoding: EncodingVersion::default(),
            target,
        }
    }

    pub fn is_indirect(&self) -> bool {
        matches!(self.target, Target::Indirect { .. })
    }

    pub fn is_well_known(&self) -> bool {
        matches!(self.target, Target::Indirect { adapter_id: None, .. })
    }

    /// Endpoints of a direct reference, or the cached endpoints of an indirect
    /// one (empty if none).
    pub fn endpoints(&self) -> &[Endpoint] {
        match &self.target {
            Target::Direct { endpoints } => endpoints,
            Target::Indirect {
                cached_endpoints: Some(endpoints),
                ..
            } => endpoints,
            Target::Indirect { .. } => &[],
        }
    }

    pub fn adapter_id(&self) -> Option<&str> {
        match &self.target {
            Target::Indirect {
                adapter_id: Some(id),
                ..
            } => Some(id),
            _ => None,
        }
    }

    /// Cache key for locator resolution; `None` for direct references.
    pub fn locator_key(&self) -> Option<LocatorKey> {
        match &self.target {
            Target::Direct { .. } => None,
            Target::Indirect {
                adapter_id: Some(id),
                ..
            } => Some(LocatorKey::Adapter(id.clone())),
            Target::Indirect {
                adapter_id: None, ..
            } => Some(LocatorKey::Object(self.identity.clone())),
        }
    }

    // Builders returning modified copies. References are never mutated in place.

    pub fn with_facet(&self, facet: impl Into<String>) -> Self {
        Self {
            facet: facet.into(),
            ..self.clone()
        }
    }

    pub fn with_mode(&self, mode: InvocationMode) -> Self {
        Self {
            mode,
            ..self.clone()
        }
    }

    pub fn with_secure(&self, secure: bool) -> Self {
        Self {
            secure,
            ..self.clone()
        }
    }

    pub fn with_identity(&self, identity: Identity) -> Self {
        Self {
            identity,
            ..self.clone()
        }
    }

    /// Same object reached directly at `endpoints`.
    pub fn with_endpoints(&self, endpoints: Vec<Endpoint>) -> Self {
        Self {
            target: Target::Direct { endpoints },
            ..self.clone()
        }
    }

    /// Same object resolved through the adapter `adapter_id`.
    pub fn with_adapter_id(&self, adapter_id: impl Into<String>) -> Self {
        Self {
            target: Target::Indirect {
                adapter_id: Some(adapter_id.into()),
                cached_endpoints: None,
            },
            ..self.clone()
        }
    }

    /// Indirect copy carrying `endpoints` as cached resolution. Direct
    /// references are returned unchanged.
    pub fn with_cached_endpoints(&self, endpoints: Vec<Endpoint>) -> Self {
        match &self.target {
            Target::Direct { .. } => self.clone(),
            Target::Indirect { adapter_id, .. } => Self {
                target: Target::Indirect {
                    adapter_id: adapter_id.clone(),
                    cached_endpoints: Some(endpoints),
                },
                ..self.clone()
            },
        }
    }
}
