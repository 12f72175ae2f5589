use std::sync::{Arc, PoisonError, RwLock};

use proxrpc_common::{
    Failure, FailureClass, InputStream, OutputStream, Reference, ReferenceFactory, Result,
};
use tracing::debug;

use crate::communicator::ShutdownSignal;
use crate::locator::LocatorInfo;
use crate::proxy::Proxy;
use crate::retry::RetrySchedule;
use crate::trace::{TraceLevels, RETRY_TARGET};

/// Builds proxies and decides whether failed invocations are retried.
///
/// One factory exists per [`Communicator`](crate::Communicator). The retry
/// schedule is fixed at construction; attempt counters belong to each
/// invocation.
pub struct ProxyFactory {
    references: ReferenceFactory,
    schedule: RetrySchedule,
    trace: TraceLevels,
    shutdown: Arc<ShutdownSignal>,
    locator_info: RwLock<Option<Arc<LocatorInfo>>>,
}

impl ProxyFactory {
    pub fn new(schedule: RetrySchedule, trace: TraceLevels, shutdown: Arc<ShutdownSignal>) -> Self {
        if trace.retry >= 2 {
            debug!(
                target: RETRY_TARGET,
                schedule = %schedule,
                retries = schedule.len(),
                "retry schedule"
            );
        }

        Self {
            references: ReferenceFactory::new(),
            schedule,
            trace,
            shutdown,
            locator_info: RwLock::new(None),
        }
    }

    pub fn retry_schedule(&self) -> &RetrySchedule {
        &self.schedule
    }

    /// Parses a stringified proxy. Blank input is the null proxy.
    ///
    /// # Errors
    ///
    /// [`ProxrpcError::Parse`](proxrpc_common::ProxrpcError::Parse) on
    /// malformed input.
    pub fn string_to_proxy(&self, s: &str) -> Result<Option<Proxy>> {
        Ok(self.references.create(s)?.map(Proxy::new))
    }

    /// Stringified form of `proxy`; the empty string for the null proxy.
    pub fn proxy_to_string(&self, proxy: Option<&Proxy>) -> String {
        proxy.map(|p| p.reference().to_string()).unwrap_or_default()
    }

    pub fn stream_to_proxy(&self, stream: &mut InputStream<'_>) -> Result<Option<Proxy>> {
        Ok(self.references.read(stream)?.map(Proxy::new))
    }

    /// Writes `proxy`; the null proxy is written as an empty identity.
    pub fn proxy_to_stream(&self, proxy: Option<&Proxy>, stream: &mut OutputStream) -> Result<()> {
        self.references.write(proxy.map(Proxy::reference), stream)
    }

    pub fn reference_to_proxy(&self, reference: Reference) -> Proxy {
        Proxy::new(reference)
    }

    pub fn set_locator_info(&self, info: Option<Arc<LocatorInfo>>) {
        *self
            .locator_info
            .write()
            .unwrap_or_else(PoisonError::into_inner) = info;
    }

    pub fn locator_info(&self) -> Option<Arc<LocatorInfo>> {
        self.locator_info
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Decides whether an invocation that failed with `failure` is retried.
    ///
    /// `ObjectNotExist` on an indirect reference drops the locator's cached
    /// resolution so the retry asks the locator again. On a direct reference,
    /// and for the other request-failed kinds, the failure is returned at once
    /// and `attempt` is left alone. Everything else counts against the
    /// schedule: `attempt` is incremented and the matching interval is slept
    /// unless the communicator is destroyed first.
    ///
    /// # Arguments
    ///
    /// * `failure` - What the last attempt failed with
    /// * `reference` - The reference the proxy was built from
    /// * `attempt` - Retries made so far by this invocation
    ///
    /// # Returns
    ///
    /// `Ok(())` when the caller should retry, `Err(failure)` when the failure
    /// must reach the application.
    pub async fn check_retry_after_failure(
        &self,
        failure: Failure,
        reference: &Reference,
        attempt: &mut usize,
    ) -> std::result::Result<(), Failure> {
        match failure.class() {
            FailureClass::ObjectNotExist => {
                let locator_info = match self.locator_info() {
                    Some(info) if reference.is_indirect() => info,
                    _ => return Err(failure),
                };
                locator_info.invalidate(reference).await;
            }
            FailureClass::OtherRequestFailed => return Err(failure),
            FailureClass::TransportOrTimeout => {}
        }

        *attempt += 1;

        let Some(delay) = self.schedule.delay(*attempt) else {
            if self.trace.retry >= 1 {
                debug!(
                    target: RETRY_TARGET,
                    attempts = *attempt,
                    kind = failure.kind(),
                    error = %failure,
                    "cannot retry operation call because retry limit has been exceeded"
                );
            }
            return Err(failure);
        };

        if self.shutdown.is_destroyed() {
            return Err(failure);
        }

        if self.trace.retry >= 1 {
            debug!(
                target: RETRY_TARGET,
                attempt = *attempt,
                delay_ms = delay.as_millis() as u64,
                kind = failure.kind(),
                error = %failure,
                "re-trying operation call"
            );
        }

        if !delay.is_zero() && self.shutdown.sleep(delay).await {
            if self.trace.retry >= 1 {
                debug!(
                    target: RETRY_TARGET,
                    attempt = *attempt,
                    "communicator destroyed while waiting to retry"
                );
            }
            return Err(failure);
        }

        Ok(())
    }
}

impl std::fmt::Debug for ProxyFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyFactory")
            .field("schedule", &self.schedule)
            .field("trace", &self.trace)
            .finish_non_exhaustive()
    }
}
