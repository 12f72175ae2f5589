use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use proxrpc_common::{
    Endpoint, Failure, Identity, InvocationMode, ProxrpcError, Reference, Result,
};
use tracing::debug;

use crate::communicator::Communicator;
use crate::invoker::Invocation;
use crate::trace::RETRY_TARGET;

/// Per-proxy call settings that are not part of the reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallContext {
    /// Overrides the endpoint timeout for every invocation.
    pub timeout: Option<Duration>,
    /// Key/value pairs sent along with every invocation.
    pub context: BTreeMap<String, String>,
}

/// Handle used to invoke operations on a remote object.
///
/// A proxy is a shared [`Reference`] plus a [`CallContext`]. Cloning copies two
/// pointers. Equality and hashing look at the reference only, so proxies built
/// from equal references are interchangeable as map keys whatever their
/// call context.
///
/// # Example
///
/// ```
/// use std::collections::HashSet;
/// use std::time::Duration;
/// use proxrpc_client::Proxy;
/// use proxrpc_common::{Identity, Reference};
///
/// let proxy = Proxy::new(Reference::adapter(Identity::named("printer"), "Printers"));
/// let slow = proxy.with_timeout(Duration::from_secs(30));
///
/// let mut set = HashSet::new();
/// set.insert(proxy.clone());
/// assert!(set.contains(&slow));
/// ```
#[derive(Clone)]
pub struct Proxy {
    reference: Arc<Reference>,
    context: Arc<CallContext>,
}

impl Proxy {
    pub fn new(reference: Reference) -> Self {
        Self::from_arc(Arc::new(reference))
    }

    pub fn from_arc(reference: Arc<Reference>) -> Self {
        Self {
            reference,
            context: Arc::new(CallContext::default()),
        }
    }

    pub fn reference(&self) -> &Reference {
        &self.reference
    }

    pub fn shared_reference(&self) -> &Arc<Reference> {
        &self.reference
    }

    pub fn identity(&self) -> &Identity {
        &self.reference.identity
    }

    pub fn facet(&self) -> &str {
        &self.reference.facet
    }

    pub fn mode(&self) -> InvocationMode {
        self.reference.mode
    }

    pub fn adapter_id(&self) -> Option<&str> {
        self.reference.adapter_id()
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        self.reference.endpoints()
    }

    pub fn call_context(&self) -> &CallContext {
        &self.context
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.context.timeout
    }

    pub fn is_indirect(&self) -> bool {
        self.reference.is_indirect()
    }

    fn with_reference(&self, reference: Reference) -> Self {
        if reference == *self.reference {
            return self.clone();
        }
        Self {
            reference: Arc::new(reference),
            context: Arc::clone(&self.context),
        }
    }

    pub fn with_facet(&self, facet: impl Into<String>) -> Self {
        self.with_reference(self.reference.with_facet(facet))
    }

    pub fn with_mode(&self, mode: InvocationMode) -> Self {
        self.with_reference(self.reference.with_mode(mode))
    }

    pub fn with_identity(&self, identity: Identity) -> Self {
        self.with_reference(self.reference.with_identity(identity))
    }

    pub fn with_secure(&self, secure: bool) -> Self {
        self.with_reference(self.reference.with_secure(secure))
    }

    pub fn with_adapter_id(&self, adapter_id: impl Into<String>) -> Self {
        self.with_reference(self.reference.with_adapter_id(adapter_id))
    }

    pub fn with_endpoints(&self, endpoints: Vec<Endpoint>) -> Self {
        self.with_reference(self.reference.with_endpoints(endpoints))
    }

    pub fn with_context(&self, context: BTreeMap<String, String>) -> Self {
        Self {
            reference: Arc::clone(&self.reference),
            context: Arc::new(CallContext {
                context,
                timeout: self.context.timeout,
            }),
        }
    }

    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            reference: Arc::clone(&self.reference),
            context: Arc::new(CallContext {
                timeout: Some(timeout),
                context: self.context.context.clone(),
            }),
        }
    }

    /// Invokes `operation` and returns the encoded reply.
    ///
    /// Each attempt resolves the reference (direct references are used as
    /// is) and hands the invocation to the communicator's [`Invoker`](crate::Invoker).
    /// Failures go through
    /// [`ProxyFactory::check_retry_after_failure`](crate::ProxyFactory::check_retry_after_failure)
    /// which either lets the loop try again or hands the failure back. Batch
    /// invocations are never retried.
    ///
    /// # Arguments
    ///
    /// * `communicator` - Context providing the invoker, locator and schedule
    /// * `operation` - Operation name
    /// * `params` - Encoded in-parameters
    ///
    /// # Errors
    ///
    /// - [`ProxrpcError::NoInvoker`] if no invoker is installed
    /// - [`ProxrpcError::CommunicatorDestroyed`] if the communicator was
    ///   destroyed before the first attempt
    /// - [`ProxrpcError::Invocation`] carrying the failure once it is not
    ///   retried any more, or once the communicator is destroyed before a
    ///   retry is sent
    pub async fn invoke(
        &self,
        communicator: &Communicator,
        operation: &str,
        params: &[u8],
    ) -> Result<Vec<u8>> {
        let invoker = communicator.invoker().ok_or(ProxrpcError::NoInvoker)?;
        let factory = communicator.proxy_factory();
        let mut attempt = 0usize;
        // Failure of the attempt being retried, if any. A destroy seen before
        // the next attempt reaches the invoker hands this back.
        let mut retrying: Option<Failure> = None;

        loop {
            if communicator.is_destroyed() {
                return Err(Self::destroyed(retrying));
            }

            let outcome = match self.resolve(communicator).await {
                Ok(_) if communicator.is_destroyed() => {
                    return Err(Self::destroyed(retrying));
                }
                Ok(target) => {
                    invoker
                        .invoke(Invocation {
                            reference: &target,
                            operation,
                            params,
                            context: &self.context.context,
                            timeout: self.context.timeout,
                        })
                        .await
                }
                Err(failure) => Err(failure),
            };

            let failure = match outcome {
                Ok(reply) => return Ok(reply),
                Err(failure) => failure,
            };

            if self.reference.mode.is_batch() {
                debug!(
                    target: RETRY_TARGET,
                    operation,
                    kind = failure.kind(),
                    "batch invocation failed, not retrying"
                );
                return Err(failure.into());
            }

            let retried = failure.clone();
            factory
                .check_retry_after_failure(failure, &self.reference, &mut attempt)
                .await?;
            retrying = Some(retried);
        }
    }

    fn destroyed(retrying: Option<Failure>) -> ProxrpcError {
        retrying.map_or(ProxrpcError::CommunicatorDestroyed, ProxrpcError::Invocation)
    }

    async fn resolve(&self, communicator: &Communicator) -> std::result::Result<Arc<Reference>, Failure> {
        if !self.reference.is_indirect() {
            return Ok(Arc::clone(&self.reference));
        }
        match communicator.default_locator() {
            Some(info) => info.resolve(&self.reference).await,
            None if !self.reference.endpoints().is_empty() => {
                Ok(Arc::new(self.reference.with_endpoints(self.reference.endpoints().to_vec())))
            }
            None => Err(Failure::NoEndpoint(self.reference.to_string())),
        }
    }
}

impl PartialEq for Proxy {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.reference, &other.reference) || *self.reference == *other.reference
    }
}

impl Eq for Proxy {}

impl Hash for Proxy {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.reference.hash(state);
    }
}

impl fmt::Debug for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy")
            .field("reference", &self.reference.to_string())
            .field("context", &self.context)
            .finish()
    }
}

impl fmt::Display for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.reference, f)
    }
}

impl From<Reference> for Proxy {
    fn from(reference: Reference) -> Self {
        Self::new(reference)
    }
}
