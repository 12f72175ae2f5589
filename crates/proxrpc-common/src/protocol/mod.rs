pub mod endpoint;
pub mod error;
pub mod failure;
pub mod identity;
pub mod reference;


pub use endpoint::{Endpoint, Transport};
pub use error::{ProxrpcError, Result};
pub use failure::{Failure, FailureClass, LookupKind, RequestTarget};
pub use identity::Identity;
pub use reference::{
    EncodingVersion, InvocationMode, LocatorKey, ProtocolVersion, Reference, Target,
};
