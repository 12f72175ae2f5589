//! proxrpc client invocation core
//!
//! Turns references into callable proxies and decides what happens when a
//! call fails: retry after a backoff, rebind through the locator, or give up.
//!
//! # Components
//!
//! - [`Communicator`] - Process context: properties, trace levels, the proxy
//!   factory, the default locator and the transport
//! - [`ProxyFactory`] - Builds proxies from strings and streams; owns the retry
//!   engine
//! - [`RetrySchedule`] - Backoff intervals from `Proxrpc.RetryIntervals`
//! - [`Proxy`] - Cheap, cloneable handle that invocations go through
//! - [`LocatorInfo`] / [`LocatorCache`] - Resolution of indirect references
//! - [`Invoker`] / [`Locator`] - Boundaries to the transport and the locator
//!   service
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use proxrpc_client::Communicator;
//! use proxrpc_common::Properties;
//!
//! let props = Properties::new();
//! props.set_property("Proxrpc.RetryIntervals", "0 100 500");
//! let communicator = Communicator::with_properties(Arc::new(props));
//!
//! let proxy = communicator
//!     .string_to_proxy("printer:tcp -h 10.0.0.5 -p 4061")
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(communicator.proxy_factory().retry_schedule().len(), 3);
//! assert_eq!(communicator.proxy_to_string(Some(&proxy)), "printer -t:tcp -h 10.0.0.5 -p 4061");
//! ```

pub mod communicator;
pub mod invoker;
pub mod locator;
pub mod proxy;
pub mod proxy_factory;
pub mod retry;
pub mod trace;

pub use communicator::{Communicator, ShutdownSignal};
pub use invoker::{Invocation, Invoker};
pub use locator::{CacheEntry, Locator, LocatorCache, LocatorInfo};
pub use proxy::{CallContext, Proxy};
pub use proxy_factory::ProxyFactory;
pub use retry::RetrySchedule;
pub use trace::TraceLevels;
