//! Shared test doubles: a scripted transport and an in-memory locator.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use futures::FutureExt;
use proxrpc_client::{Communicator, Invocation, Invoker, Locator};
use proxrpc_common::{Endpoint, Failure, Identity, Properties, Reference, RequestTarget};
use tokio::sync::Notify;

pub fn communicator(props: &[(&str, &str)]) -> Communicator {
    let properties = Properties::new();
    for (key, value) in props {
        properties.set_property(key, value);
    }
    Communicator::with_properties(Arc::new(properties))
}

pub fn object_not_exist(name: &str) -> Failure {
    Failure::ObjectNotExist(RequestTarget::new(Identity::named(name), "", "print"))
}

pub fn endpoints(host: &str) -> Vec<Endpoint> {
    vec![Endpoint::tcp(host, 4061)]
}

/// Answers invocations from a script, then with `fallback` forever.
pub struct ScriptedInvoker {
    script: Mutex<VecDeque<Result<Vec<u8>, Failure>>>,
    fallback: Result<Vec<u8>, Failure>,
    targets: Mutex<Vec<Reference>>,
}

impl ScriptedInvoker {
    pub fn new(
        script: Vec<Result<Vec<u8>, Failure>>,
        fallback: Result<Vec<u8>, Failure>,
    ) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            fallback,
            targets: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(failure: Failure) -> Arc<Self> {
        Self::new(vec![], Err(failure))
    }

    pub fn calls(&self) -> usize {
        self.targets.lock().unwrap().len()
    }

    /// Resolved references the invocations were sent to, in order.
    pub fn targets(&self) -> Vec<Reference> {
        self.targets.lock().unwrap().clone()
    }
}

impl Invoker for ScriptedInvoker {
    fn invoke<'a>(&'a self, invocation: Invocation<'a>) -> BoxFuture<'a, Result<Vec<u8>, Failure>> {
        self.targets.lock().unwrap().push(invocation.reference.clone());
        let outcome = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        futures::future::ready(outcome).boxed()
    }
}

/// Locator backed by two maps that tests edit between calls.
#[derive(Default)]
pub struct MemoryLocator {
    adapters: Mutex<HashMap<String, Reference>>,
    objects: Mutex<HashMap<Identity, Reference>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    adapter_lookups: AtomicUsize,
    object_lookups: AtomicUsize,
}

impl MemoryLocator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_adapter(&self, adapter_id: &str, endpoints: Vec<Endpoint>) {
        self.adapters.lock().unwrap().insert(
            adapter_id.to_string(),
            Reference::direct(Identity::named(adapter_id), endpoints),
        );
    }

    pub fn remove_adapter(&self, adapter_id: &str) {
        self.adapters.lock().unwrap().remove(adapter_id);
    }

    pub fn set_object(&self, identity: Identity, reference: Reference) {
        self.objects.lock().unwrap().insert(identity, reference);
    }

    /// Lookups of `adapter_id` wait until the returned `Notify` is notified.
    pub fn gate_adapter(&self, adapter_id: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(adapter_id.to_string(), Arc::clone(&gate));
        gate
    }

    pub fn adapter_lookups(&self) -> usize {
        self.adapter_lookups.load(Ordering::SeqCst)
    }

    pub fn object_lookups(&self) -> usize {
        self.object_lookups.load(Ordering::SeqCst)
    }
}

impl Locator for MemoryLocator {
    fn find_adapter_by_id<'a>(
        &'a self,
        adapter_id: &'a str,
    ) -> BoxFuture<'a, Result<Option<Reference>, Failure>> {
        self.adapter_lookups.fetch_add(1, Ordering::SeqCst);
        let gate = self.gates.lock().unwrap().get(adapter_id).cloned();
        async move {
            if let Some(gate) = gate {
                gate.notified().await;
            }
            Ok(self.adapters.lock().unwrap().get(adapter_id).cloned())
        }
        .boxed()
    }

    fn find_object_by_id<'a>(
        &'a self,
        identity: &'a Identity,
    ) -> BoxFuture<'a, Result<Option<Reference>, Failure>> {
        self.object_lookups.fetch_add(1, Ordering::SeqCst);
        let answer = self.objects.lock().unwrap().get(identity).cloned();
        futures::future::ready(Ok(answer)).boxed()
    }
}
