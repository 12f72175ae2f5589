use std::collections::BTreeMap;
use std::time::Duration;

use futures::future::BoxFuture;
use proxrpc_common::{Failure, Reference};

/// One attempt at an invocation, as handed to the transport.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    /// Resolved reference; always direct.
    pub reference: &'a Reference,
    pub operation: &'a str,
    pub params: &'a [u8],
    pub context: &'a BTreeMap<String, String>,
    pub timeout: Option<Duration>,
}

/// Sends invocations over the wire.
///
/// Implementations report failures with a [`Failure`] kind so the retry engine
/// can classify them without looking at messages. Batch invocations are
/// queued and answered with an empty reply.
pub trait Invoker: Send + Sync {
    fn invoke<'a>(&'a self, invocation: Invocation<'a>) -> BoxFuture<'a, Result<Vec<u8>, Failure>>;
}
