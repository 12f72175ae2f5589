use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use proxrpc_common::config::names;
use proxrpc_common::{Properties, Result};
use tokio::sync::Notify;
use tracing::{info, warn};

use crate::invoker::Invoker;
use crate::locator::{Locator, LocatorCache, LocatorInfo};
use crate::proxy::Proxy;
use crate::proxy_factory::ProxyFactory;
use crate::retry::RetrySchedule;
use crate::trace::TraceLevels;

/// Destroyed flag plus a wake-up for tasks sleeping between retries.
#[derive(Debug, Default)]
pub struct ShutdownSignal {
    destroyed: AtomicBool,
    notify: Notify,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    /// Sets the flag and wakes every sleeper. Returns `false` if it was
    /// already set.
    pub fn trigger(&self) -> bool {
        let first = !self.destroyed.swap(true, Ordering::AcqRel);
        self.notify.notify_waiters();
        first
    }

    /// Sleeps for `duration` or until [`trigger`](Self::trigger) is called.
    ///
    /// # Returns
    ///
    /// `true` if the signal was triggered by the time the sleep ends.
    pub async fn sleep(&self, duration: Duration) -> bool {
        let notified = self.notify.notified();
        tokio::pin!(notified);
        // Register before checking the flag so a concurrent trigger is not missed.
        notified.as_mut().enable();

        if self.is_destroyed() {
            return true;
        }

        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            _ = &mut notified => {}
        }
        self.is_destroyed()
    }
}

struct Instance {
    properties: Arc<Properties>,
    trace: TraceLevels,
    proxy_factory: ProxyFactory,
    invoker: RwLock<Option<Arc<dyn Invoker>>>,
    shutdown: Arc<ShutdownSignal>,
}

/// The process context every proxy operates in.
///
/// Holds the configuration, the proxy factory with its retry schedule, the
/// default locator and the transport. Cloning is cheap and clones share all
/// state, including the destroyed flag.
///
/// # Example
///
/// ```
/// use proxrpc_client::Communicator;
///
/// let mut args = vec!["client".to_string(), "--Proxrpc.RetryIntervals=-1".to_string()];
/// let communicator = Communicator::initialize(&mut args).unwrap();
///
/// assert!(communicator.proxy_factory().retry_schedule().is_empty());
/// assert_eq!(args, vec!["client"]);
///
/// communicator.destroy();
/// assert!(communicator.is_destroyed());
/// ```
#[derive(Clone)]
pub struct Communicator {
    instance: Arc<Instance>,
}

impl Communicator {
    /// Creates a communicator configured from process arguments.
    ///
    /// `--Proxrpc.*` options and config files are consumed as described in
    /// [`Properties::from_args`]; `args` keeps the rest.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file cannot be loaded.
    pub fn initialize(args: &mut Vec<String>) -> Result<Self> {
        let properties = Properties::from_args(args, None)?;
        Ok(Self::with_properties(Arc::new(properties)))
    }

    pub fn with_properties(properties: Arc<Properties>) -> Self {
        let trace = TraceLevels::from_properties(&properties);
        let shutdown = Arc::new(ShutdownSignal::new());
        let proxy_factory = ProxyFactory::new(
            RetrySchedule::from_properties(&properties),
            trace,
            Arc::clone(&shutdown),
        );

        Self {
            instance: Arc::new(Instance {
                properties,
                trace,
                proxy_factory,
                invoker: RwLock::new(None),
                shutdown,
            }),
        }
    }

    pub fn properties(&self) -> &Arc<Properties> {
        &self.instance.properties
    }

    pub fn trace_levels(&self) -> TraceLevels {
        self.instance.trace
    }

    pub fn proxy_factory(&self) -> &ProxyFactory {
        &self.instance.proxy_factory
    }

    pub fn program_name(&self) -> String {
        self.instance.properties.get_property(names::PROGRAM_NAME)
    }

    /// Routes indirect proxies of this communicator through `locator`.
    ///
    /// Replaces any previous default locator together with its cache. The
    /// cache honours `Proxrpc.Default.LocatorCacheTimeout`.
    pub fn set_default_locator(&self, locator: Arc<dyn Locator>) {
        let cache = LocatorCache::from_properties(&self.instance.properties);
        let info = LocatorInfo::new(locator, cache, self.instance.trace);
        self.instance.proxy_factory.set_locator_info(Some(Arc::new(info)));
    }

    pub fn clear_default_locator(&self) {
        self.instance.proxy_factory.set_locator_info(None);
    }

    pub fn default_locator(&self) -> Option<Arc<LocatorInfo>> {
        self.instance.proxy_factory.locator_info()
    }

    /// Proxy named by `Proxrpc.Default.Locator`, for building the [`Locator`]
    /// passed to [`set_default_locator`](Self::set_default_locator).
    pub fn default_locator_proxy(&self) -> Result<Option<Proxy>> {
        let value = self.instance.properties.get_property(names::DEFAULT_LOCATOR);
        self.string_to_proxy(&value)
    }

    pub fn set_invoker(&self, invoker: Arc<dyn Invoker>) {
        *self
            .instance
            .invoker
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(invoker);
    }

    pub fn invoker(&self) -> Option<Arc<dyn Invoker>> {
        self.instance
            .invoker
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn string_to_proxy(&self, s: &str) -> Result<Option<Proxy>> {
        self.instance.proxy_factory.string_to_proxy(s)
    }

    pub fn proxy_to_string(&self, proxy: Option<&Proxy>) -> String {
        self.instance.proxy_factory.proxy_to_string(proxy)
    }

    /// Tears the communicator down.
    ///
    /// Invocations sleeping between retries wake up and fail with the failure
    /// they were about to retry; new invocations fail with
    /// [`ProxrpcError::CommunicatorDestroyed`](proxrpc_common::ProxrpcError::CommunicatorDestroyed).
    /// Calling it again does nothing.
    pub fn destroy(&self) {
        if !self.instance.shutdown.trigger() {
            return;
        }

        let unused = self.instance.properties.unused_properties();
        if !unused.is_empty() {
            warn!(properties = ?unused, "properties set but never read");
        }
        info!(program = %self.program_name(), "communicator destroyed");
    }

    pub fn is_destroyed(&self) -> bool {
        self.instance.shutdown.is_destroyed()
    }

    pub fn shutdown_signal(&self) -> &Arc<ShutdownSignal> {
        &self.instance.shutdown
    }
}

impl std::fmt::Debug for Communicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Communicator")
            .field("proxy_factory", &self.instance.proxy_factory)
            .field("destroyed", &self.is_destroyed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_sleep_runs_full_duration() {
        let signal = ShutdownSignal::new();
        let start = tokio::time::Instant::now();
        assert!(!signal.sleep(Duration::from_millis(40)).await);
        assert_eq!(start.elapsed(), Duration::from_millis(40));
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_wakes_sleeper() {
        let signal = Arc::new(ShutdownSignal::new());
        let sleeper = {
            let signal = Arc::clone(&signal);
            tokio::spawn(async move { signal.sleep(Duration::from_secs(60)).await })
        };

        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(signal.trigger());
        assert!(!signal.trigger());

        let start = tokio::time::Instant::now();
        assert!(sleeper.await.unwrap());
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_sleep_after_trigger_returns_at_once() {
        let signal = ShutdownSignal::new();
        signal.trigger();
        assert!(signal.sleep(Duration::from_secs(3600)).await);
    }

    #[test]
    fn test_program_name_from_args() {
        let mut args = vec![r"bin\client".to_string(), "extra".to_string()];
        let communicator = Communicator::initialize(&mut args).unwrap();
        assert_eq!(communicator.program_name(), "bin/client");
        assert_eq!(args, vec![r"bin\client", "extra"]);
    }

    #[test]
    fn test_default_locator_proxy() {
        let props = Properties::new();
        props.set_property("Proxrpc.Default.Locator", "Registry/Locator:tcp -h registry -p 4061");
        let communicator = Communicator::with_properties(Arc::new(props));

        let proxy = communicator.default_locator_proxy().unwrap().unwrap();
        assert_eq!(proxy.identity().category, "Registry");
        assert!(Communicator::with_properties(Arc::new(Properties::new()))
            .default_locator_proxy()
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_clones_share_state() {
        let communicator = Communicator::with_properties(Arc::new(Properties::new()));
        let clone = communicator.clone();
        clone.destroy();
        assert!(communicator.is_destroyed());
        assert!(communicator.invoker().is_none());
    }
}
