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

//! In-process counter store.
//!
//! [MemoryStore] behaves like a strongly consistent remote store: increments are
//! applied atomically under a lock and pushed to every open watch in the order they
//! were applied. It also lets tests provision and remove documents, inject pushes
//! and simulate the store going offline.

use crate::{
    CounterIdentity, Result, Snapshot,
    errors::{CounterError, CounterErrorKind},
    store::{CounterStore, Snapshots},
};
use futures::channel::mpsc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Watcher = mpsc::UnboundedSender<Result<Snapshot>>;

#[derive(Default)]
struct Documents {
    values: HashMap<CounterIdentity, u64>,
    watchers: HashMap<CounterIdentity, Vec<Watcher>>,
    offline: bool,
}

impl Documents {
    fn check_online(&self) -> Result<()> {
        if self.offline {
            return Err(CounterError::with_source(
                CounterErrorKind::StoreUnavailable,
                "in-memory store is offline",
            ));
        }
        Ok(())
    }

    fn notify(&mut self, identity: &CounterIdentity, snapshot: Snapshot) {
        if let Some(watchers) = self.watchers.get_mut(identity) {
            watchers.retain(|watcher| watcher.unbounded_send(Ok(snapshot)).is_ok());
        }
    }
}

/// Counter store kept entirely in process memory.
///
/// Clones share the same documents.
#[derive(Clone, Default)]
pub struct MemoryStore {
    documents: Arc<Mutex<Documents>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Documents> {
        self.documents.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Creates (or overwrites) the counter document with `value`.
    pub fn provision(&self, identity: &CounterIdentity, value: u64) {
        let mut documents = self.lock();
        documents.values.insert(identity.clone(), value);
        documents.notify(identity, Snapshot::Value(value));
    }

    /// Deletes the counter document.
    pub fn remove(&self, identity: &CounterIdentity) {
        let mut documents = self.lock();
        documents.values.remove(identity);
        documents.notify(identity, Snapshot::Missing);
    }

    /// Delivers `snapshot` to every open watch without touching the stored value.
    pub fn inject(&self, identity: &CounterIdentity, snapshot: Snapshot) {
        self.lock().notify(identity, snapshot);
    }

    /// Delivers a transport error to every open watch.
    pub fn inject_error(&self, identity: &CounterIdentity) {
        let mut documents = self.lock();
        if let Some(watchers) = documents.watchers.get_mut(identity) {
            watchers.retain(|watcher| {
                watcher
                    .unbounded_send(Err(CounterError::with_source(
                        CounterErrorKind::StoreUnavailable,
                        "injected push failure",
                    )))
                    .is_ok()
            });
        }
    }

    /// Makes every subsequent request fail with `StoreUnavailable` until set back.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Stored value of the counter, if the document exists.
    pub fn value(&self, identity: &CounterIdentity) -> Option<u64> {
        self.lock().values.get(identity).copied()
    }

    /// Number of push channels still open for `identity`.
    pub fn open_watches(&self, identity: &CounterIdentity) -> usize {
        let mut documents = self.lock();
        match documents.watchers.get_mut(identity) {
            Some(watchers) => {
                watchers.retain(|watcher| !watcher.is_closed());
                watchers.len()
            }
            None => 0,
        }
    }

    fn read(&self, identity: &CounterIdentity) -> Result<Snapshot> {
        let documents = self.lock();
        documents.check_online()?;
        Ok(documents.values.get(identity).copied().into())
    }

    fn open_watch(&self, identity: &CounterIdentity) -> Result<Snapshots> {
        let mut documents = self.lock();
        documents.check_online()?;
        let (sender, receiver) = mpsc::unbounded();
        documents
            .watchers
            .entry(identity.clone())
            .or_default()
            .push(sender);
        Ok(Box::pin(receiver))
    }

    fn add(&self, identity: &CounterIdentity, delta: u64) -> Result<u64> {
        let mut documents = self.lock();
        documents.check_online()?;
        let current = documents
            .values
            .get_mut(identity)
            .ok_or_else(|| CounterError::new(CounterErrorKind::NotInitialized))?;
        let value = current
            .checked_add(delta)
            .ok_or_else(|| CounterError::new(CounterErrorKind::InvalidCounterValue))?;
        *current = value;
        documents.notify(identity, Snapshot::Value(value));
        Ok(value)
    }
}

impl CounterStore for MemoryStore {
    async fn get(&self, identity: &CounterIdentity) -> Result<Snapshot> {
        self.read(identity)
    }

    async fn watch(&self, identity: &CounterIdentity) -> Result<Snapshots> {
        self.open_watch(identity)
    }

    async fn atomic_increment(&self, identity: &CounterIdentity, delta: u64) -> Result<()> {
        self.add(identity, delta).map(|_| ())
    }
}
