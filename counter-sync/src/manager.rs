// Copyright 2025 Synadia Communications Inc.
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Priming read, push channel and listener fan-out for one counter.
//!
//! A [SubscriptionManager] moves through an explicit lifecycle:
//!
//! ```text
//! Idle ──subscribe──▶ Subscribing ──established──▶ Live ──last listener gone──▶ Closed
//!   ▲                     │
//!   └──── store error ────┘
//! ```
//!
//! While `Subscribing`, the push channel is opened first and the priming read is
//! issued right after it, so no change committed in between can be missed. Pushes
//! the channel already holds once the read returns are applied right after it,
//! except those not newer than the primed value. Once
//! `Live`, the manager owns exactly one push channel no matter how many listeners
//! are registered. Every value observed, from the priming read or a push, is written
//! into the [CounterMirror] and then handed to each listener in arrival order.
//!
//! Registering another listener on a `Live` manager reuses the channel and replays
//! the currently mirrored value to the new listener only. Dropping the last
//! [Subscription] cancels the push channel and the manager becomes `Closed`, which is
//! terminal: a closed manager refuses new listeners with
//! [CounterErrorKind::Closed]. The store ending the push channel closes the manager
//! the same way and drops every listener, so [Updates] streams end.
//!
//! # Callbacks
//!
//! Callbacks run on the task that drains the push channel while the listener registry
//! is locked. Once [Subscription::unsubscribe] (or the drop of the handle) returns,
//! the callback is guaranteed to never run again. The flip side is that a callback
//! must not subscribe, unsubscribe or drop a [Subscription] of the same manager.
//! Use [SubscriptionManager::updates] to consume values as a stream instead.

use crate::{
    CounterIdentity, Incrementer, Result, Snapshot,
    errors::{CounterError, CounterErrorKind},
    mirror::CounterMirror,
    store::{CounterStore, Snapshots},
};
use futures::{FutureExt, Stream, StreamExt, channel::mpsc};
use std::{
    collections::BTreeMap,
    fmt,
    pin::Pin,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    task::{Context, Poll},
};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// How snapshots arriving out of order are reconciled with the mirror.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderingPolicy {
    /// Every observed value overwrites the mirror, whichever arrives last wins.
    ///
    /// A push buffered before the priming read completed may briefly move the
    /// mirror backwards before later pushes catch it up.
    #[default]
    LastArrivalWins,
    /// Values lower than the mirrored one are dropped.
    ///
    /// Only valid because the counter never decreases.
    Monotonic,
}

/// Lifecycle of a [SubscriptionManager].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Subscribing,
    Live,
    Closed,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Subscribing => write!(f, "subscribing"),
            Self::Live => write!(f, "live"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

type Callback = Arc<dyn Fn(u64) + Send + Sync + 'static>;

enum Listener {
    Callback(Callback),
    Channel(mpsc::UnboundedSender<u64>),
}

impl Listener {
    fn deliver(&self, value: u64) {
        match self {
            Listener::Callback(callback) => callback(value),
            // A dropped `Updates` stream unregisters itself right after.
            Listener::Channel(sender) => {
                let _ = sender.unbounded_send(value);
            }
        }
    }
}

struct Registry {
    state: LifecycleState,
    listeners: BTreeMap<u64, Listener>,
    next_id: u64,
    pump: Option<JoinHandle<()>>,
}

struct Shared {
    identity: CounterIdentity,
    ordering: OrderingPolicy,
    mirror: CounterMirror,
    registry: Mutex<Registry>,
    // Serializes establishment so that only one push channel is ever opened.
    establish: tokio::sync::Mutex<()>,
}

impl Shared {
    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn attach(self: &Arc<Self>, registry: &mut Registry, listener: Listener) -> Subscription {
        if let Some(value) = self.mirror.observed() {
            listener.deliver(value);
        }
        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.insert(id, listener);
        Subscription {
            shared: Some(self.clone()),
            id,
        }
    }

    fn apply(&self, registry: &Registry, value: u64) {
        if self.ordering == OrderingPolicy::Monotonic {
            if let Some(current) = self.mirror.observed() {
                if value < current {
                    debug!(counter = %self.identity, value, current, "dropping stale counter value");
                    return;
                }
            }
        }
        self.mirror.set(value);
        for listener in registry.listeners.values() {
            listener.deliver(value);
        }
    }

    fn deliver(&self, value: u64) {
        let registry = self.registry();
        if registry.state == LifecycleState::Live {
            self.apply(&registry, value);
        }
    }

    fn close(&self, registry: &mut Registry) {
        registry.state = LifecycleState::Closed;
        if let Some(pump) = registry.pump.take() {
            pump.abort();
        }
        self.mirror.clear();
        debug!(counter = %self.identity, "counter subscription closed");
    }

    fn release(&self, id: u64) {
        let mut registry = self.registry();
        if registry.listeners.remove(&id).is_none() {
            return;
        }
        debug!(counter = %self.identity, listeners = registry.listeners.len(), "listener released");
        if registry.listeners.is_empty() && registry.state == LifecycleState::Live {
            self.close(&mut registry);
        }
    }

    fn channel_ended(&self) {
        let mut registry = self.registry();
        if registry.state == LifecycleState::Live {
            // Our own handle, nothing left to abort.
            registry.pump = None;
            self.close(&mut registry);
        }
        registry.listeners.clear();
    }
}

/// Takes whatever the channel already holds without waiting for more.
///
/// Returns `None` when the channel has ended.
fn drain_buffered(identity: &CounterIdentity, snapshots: &mut Snapshots) -> Option<Vec<u64>> {
    let mut buffered = Vec::new();
    while let Some(next) = snapshots.next().now_or_never() {
        match next {
            Some(Ok(Snapshot::Value(value))) => buffered.push(value),
            Some(Ok(Snapshot::Missing)) => {}
            Some(Err(err)) => warn!(counter = %identity, error = %err, "counter push channel error"),
            None => return None,
        }
    }
    Some(buffered)
}

async fn pump(shared: Arc<Shared>, mut snapshots: Snapshots) {
    while let Some(snapshot) = snapshots.next().await {
        match snapshot {
            Ok(Snapshot::Value(value)) => shared.deliver(value),
            Ok(Snapshot::Missing) => {
                debug!(counter = %shared.identity, "ignoring push for missing counter document")
            }
            Err(err) => warn!(counter = %shared.identity, error = %err, "counter push channel error"),
        }
    }
    debug!(counter = %shared.identity, "counter push channel ended");
    shared.channel_ended();
}

/// Builder for a [SubscriptionManager].
pub struct SubscriptionManagerBuilder<S> {
    store: S,
    identity: CounterIdentity,
    ordering: OrderingPolicy,
}

impl<S: CounterStore> SubscriptionManagerBuilder<S> {
    /// Set how out of order snapshots are reconciled. Defaults to
    /// [OrderingPolicy::LastArrivalWins].
    pub fn ordering(mut self, ordering: OrderingPolicy) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn build(self) -> SubscriptionManager<S> {
        SubscriptionManager {
            store: self.store,
            shared: Arc::new(Shared {
                identity: self.identity,
                ordering: self.ordering,
                mirror: CounterMirror::new(),
                registry: Mutex::new(Registry {
                    state: LifecycleState::Idle,
                    listeners: BTreeMap::new(),
                    next_id: 0,
                    pump: None,
                }),
                establish: tokio::sync::Mutex::new(()),
            }),
        }
    }
}

/// Keeps a [CounterMirror] in sync with one counter and fans values out to listeners.
///
/// Clones share the same mirror, push channel and listeners.
#[derive(Clone)]
pub struct SubscriptionManager<S> {
    store: S,
    shared: Arc<Shared>,
}

impl<S: CounterStore> SubscriptionManager<S> {
    pub fn new(store: S, identity: CounterIdentity) -> Self {
        Self::builder(store, identity).build()
    }

    pub fn builder(store: S, identity: CounterIdentity) -> SubscriptionManagerBuilder<S> {
        SubscriptionManagerBuilder {
            store,
            identity,
            ordering: OrderingPolicy::default(),
        }
    }

    pub fn identity(&self) -> &CounterIdentity {
        &self.shared.identity
    }

    pub fn mirror(&self) -> &CounterMirror {
        &self.shared.mirror
    }

    /// Mirrored value, `0` until the counter has been observed.
    pub fn read(&self) -> u64 {
        self.shared.mirror.read()
    }

    pub fn state(&self) -> LifecycleState {
        self.shared.registry().state
    }

    pub fn listener_count(&self) -> usize {
        self.shared.registry().listeners.len()
    }

    /// Returns an [Incrementer] for the same store and counter.
    pub fn incrementer(&self) -> Incrementer<S> {
        Incrementer::new(self.store.clone(), self.shared.identity.clone())
    }

    /// Registers `on_update` to be called with every observed counter value.
    ///
    /// The first registration opens the push channel and performs the priming read.
    /// If the document does not exist yet the callback is not invoked until a push
    /// carries a value. Store failures while establishing are returned unchanged and
    /// leave the manager `Idle`, so subscribing can be retried.
    pub async fn subscribe<F>(&self, on_update: F) -> Result<Subscription>
    where
        F: Fn(u64) + Send + Sync + 'static,
    {
        self.register(Listener::Callback(Arc::new(on_update))).await
    }

    /// Registers a listener and returns the observed values as a stream.
    ///
    /// The stream ends when the manager is shut down. Dropping it unregisters the
    /// listener.
    pub async fn updates(&self) -> Result<Updates> {
        let (sender, values) = mpsc::unbounded();
        let subscription = self.register(Listener::Channel(sender)).await?;
        Ok(Updates {
            values,
            _subscription: subscription,
        })
    }

    /// Drops every listener and cancels the push channel.
    pub fn shutdown(&self) {
        let mut registry = self.shared.registry();
        if registry.state != LifecycleState::Closed {
            self.shared.close(&mut registry);
        }
        registry.listeners.clear();
    }

    async fn register(&self, listener: Listener) -> Result<Subscription> {
        let _establishing = self.shared.establish.lock().await;

        {
            let mut registry = self.shared.registry();
            match registry.state {
                LifecycleState::Closed => return Err(CounterError::new(CounterErrorKind::Closed)),
                LifecycleState::Live => return Ok(self.shared.attach(&mut registry, listener)),
                // `Subscribing` here means a previous attempt was abandoned mid-way.
                LifecycleState::Idle | LifecycleState::Subscribing => {
                    registry.state = LifecycleState::Subscribing
                }
            }
        }

        debug!(counter = %self.shared.identity, "establishing counter subscription");
        let established = self.establish().await;

        let mut registry = self.shared.registry();
        if registry.state == LifecycleState::Closed {
            return Err(CounterError::new(CounterErrorKind::Closed));
        }
        let (mut snapshots, primed) = match established {
            Ok(established) => established,
            Err(err) => {
                registry.state = LifecycleState::Idle;
                warn!(counter = %self.shared.identity, error = %err, "failed to establish counter subscription");
                return Err(err);
            }
        };

        // Changes committed between opening the channel and the priming read are
        // already part of the primed value.
        let Some(buffered) = drain_buffered(&self.shared.identity, &mut snapshots) else {
            registry.state = LifecycleState::Idle;
            warn!(counter = %self.shared.identity, "counter push channel ended while subscribing");
            return Err(CounterError::with_source(
                CounterErrorKind::StoreUnavailable,
                "push channel ended while subscribing",
            ));
        };

        let subscription = self.shared.attach(&mut registry, listener);
        match primed {
            Snapshot::Value(value) => self.shared.apply(&registry, value),
            Snapshot::Missing => {
                debug!(counter = %self.shared.identity, "counter document not initialized yet")
            }
        }
        for value in buffered {
            if primed.value().is_some_and(|primed| value <= primed) {
                debug!(counter = %self.shared.identity, value, "skipping push already covered by priming read");
                continue;
            }
            self.shared.apply(&registry, value);
        }
        registry.pump = Some(tokio::spawn(pump(self.shared.clone(), snapshots)));
        registry.state = LifecycleState::Live;
        debug!(counter = %self.shared.identity, "counter subscription live");

        Ok(subscription)
    }

    async fn establish(&self) -> Result<(Snapshots, Snapshot)> {
        let snapshots = self.store.watch(&self.shared.identity).await?;
        let primed = self.store.get(&self.shared.identity).await?;
        Ok((snapshots, primed))
    }
}

/// Registration of one listener. Dropping it unregisters the listener.
#[must_use = "dropping a subscription unregisters its listener"]
pub struct Subscription {
    shared: Option<Arc<Shared>>,
    id: u64,
}

impl Subscription {
    /// Unregisters the listener. After this returns, it will not be invoked again.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(shared) = self.shared.take() {
            shared.release(self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

/// Stream of counter values observed by a [SubscriptionManager].
///
/// Lazy, unbounded and non-restartable: values are buffered until polled and the
/// stream ends for good once the manager shuts down.
pub struct Updates {
    values: mpsc::UnboundedReceiver<u64>,
    _subscription: Subscription,
}

impl Stream for Updates {
    type Item = u64;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.values.poll_next_unpin(cx)
    }
}
