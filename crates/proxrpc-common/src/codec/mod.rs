//! proxrpc reference codecs
//!
//! This module turns external representations into [`Reference`]s and back.
//!
//! # Representations
//!
//! - **String**: the stringified proxy syntax described in [`string`], e.g.
//!   `printer -t:tcp -h 10.0.0.5 -p 4061` or `printer @ PrinterAdapter`.
//! - **Binary**: a sequence of `postcard` records:
//!
//! ```text
//! [Identity] [ReferenceHeader] [Vec<Endpoint>] ([adapter id String] if no endpoints)
//! ```
//!
//! An identity with an empty name is the null proxy and nothing follows it.
//! An empty adapter id marks a well-known object.
//!
//! # Components
//!
//! - **[`ReferenceFactory`]**: string / binary to [`Reference`] and back
//! - **[`InputStream`]** / **[`OutputStream`]**: record cursor and sink

pub mod stream;
pub mod string;

#[cfg(test)]
mod tests;

pub use stream::{InputStream, OutputStream};

use serde::{Deserialize, Serialize};

use crate::protocol::endpoint::Endpoint;
use crate::protocol::error::{ProxrpcError, Result};
use crate::protocol::identity::Identity;
use crate::protocol::reference::{
    EncodingVersion, InvocationMode, ProtocolVersion, Reference, Target,
};

/// Fields written between the identity and the addressing information.
#[derive(Debug, Serialize, Deserialize)]
struct ReferenceHeader {
    facet: String,
    mode: InvocationMode,
    secure: bool,
    protocol: ProtocolVersion,
    encoding: EncodingVersion,
}

/// Creates references from strings and streams and writes them back.
///
/// Stateless; kept as a type so that callers hold it the way they hold the
/// other collaborators of a proxy factory.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceFactory;

impl ReferenceFactory {
    pub fn new() -> Self {
        Self
    }

    /// Parses a stringified proxy.
    ///
    /// # Returns
    ///
    /// `Ok(None)` for empty or whitespace-only input (the null proxy).
    ///
    /// # Errors
    ///
    /// [`ProxrpcError::Parse`] for malformed syntax.
    ///
    /// # Example
    ///
    /// ```
    /// use proxrpc_common::codec::ReferenceFactory;
    ///
    /// let factory = ReferenceFactory::new();
    /// let reference = factory.create("printer @ Printers").unwrap().unwrap();
    /// assert_eq!(reference.adapter_id(), Some("Printers"));
    /// assert!(factory.create("   ").unwrap().is_none());
    /// ```
    pub fn create(&self, s: &str) -> Result<Option<Reference>> {
        string::parse_reference(s)
    }

    /// Reads a reference from `stream`. `Ok(None)` when the identity name is
    /// empty.
    pub fn read(&self, stream: &mut InputStream<'_>) -> Result<Option<Reference>> {
        let identity: Identity = stream.read()?;
        if identity.is_null() {
            return Ok(None);
        }
        self.read_body(identity, stream).map(Some)
    }

    /// Reads everything after an already-consumed, non-null identity.
    pub fn read_body(&self, identity: Identity, stream: &mut InputStream<'_>) -> Result<Reference> {
        let header: ReferenceHeader = stream.read()?;
        let endpoints: Vec<Endpoint> = stream.read()?;

        let target = if endpoints.is_empty() {
            let adapter_id: String = stream.read()?;
            Target::Indirect {
                adapter_id: (!adapter_id.is_empty()).then_some(adapter_id),
                cached_endpoints: None,
            }
        } else {
            Target::Direct { endpoints }
        };

        Ok(Reference {
            identity,
            facet: header.facet,
            mode: header.mode,
            secure: header.secure,
            protocol: header.protocol,
            encoding: header.encoding,
            target,
        })
    }

    /// Writes `reference`, or the null-proxy sentinel for `None`.
    ///
    /// # Errors
    ///
    /// [`ProxrpcError::Parse`] if a direct reference has no endpoints, since
    /// that cannot be told apart from an indirect one on the wire.
    pub fn write(&self, reference: Option<&Reference>, stream: &mut OutputStream) -> Result<()> {
        let Some(reference) = reference else {
            return stream.write(&Identity::default());
        };

        if let Target::Direct { endpoints } = &reference.target {
            if endpoints.is_empty() {
                return Err(ProxrpcError::parse(format!(
                    "direct proxy `{}` has no endpoints",
                    reference
                )));
            }
        }

        // A failed write must leave `stream` untouched.
        let mut record = OutputStream::new();
        record.write(&reference.identity)?;
        record.write(&ReferenceHeader {
            facet: reference.facet.clone(),
            mode: reference.mode,
            secure: reference.secure,
            protocol: reference.protocol,
            encoding: reference.encoding,
        })?;

        match &reference.target {
            Target::Direct { endpoints } => record.write(endpoints)?,
            Target::Indirect { adapter_id, .. } => {
                record.write(&Vec::<Endpoint>::new())?;
                record.write(adapter_id.as_deref().unwrap_or(""))?;
            }
        }

        stream.append(record);
        Ok(())
    }
}
