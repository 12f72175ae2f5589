//! proxrpc Common Types
//!
//! This crate provides the data model shared by every proxrpc component:
//! references and their codecs, the invocation failure taxonomy and the
//! properties store that configures a communicator.
//!
//! # Overview
//!
//! A *reference* is the immutable description of a remote object: its
//! identity plus either a list of endpoints (direct) or a key to look up with
//! a locator service (indirect). Proxies in `proxrpc-client` wrap references.
//!
//! - **Protocol Layer**: [`Identity`], [`Endpoint`], [`Reference`], [`Failure`]
//! - **Codec Layer**: stringified and binary proxy forms ([`codec`])
//! - **Configuration**: [`Properties`], loaded from arguments and files
//!
//! # Components
//!
//! - [`protocol`] - Core types and errors
//! - [`codec`] - [`ReferenceFactory`] and the record streams
//! - [`config`] - The properties store
//!
//! # Example
//!
//! ```
//! use proxrpc_common::{Reference, ReferenceFactory};
//!
//! let factory = ReferenceFactory::new();
//! let reference: Reference = factory
//!     .create("printer -t:tcp -h 127.0.0.1 -p 4061")
//!     .unwrap()
//!     .unwrap();
//!
//! assert!(!reference.is_indirect());
//! assert_eq!(factory.create(&reference.to_string()).unwrap(), Some(reference));
//! ```

pub mod codec;
pub mod config;
pub mod protocol;

pub use codec::{InputStream, OutputStream, ReferenceFactory};
pub use config::Properties;
pub use protocol::*;
