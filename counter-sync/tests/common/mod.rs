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

//! Common test utilities for counter synchronization tests.

#![allow(dead_code)]

use counter_sync::{
    CounterIdentity, CounterStore, JetStreamStore, MemoryStore, Result, Snapshot, Snapshots,
};
use futures::StreamExt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Identity used by the in-memory tests.
pub fn receipts() -> CounterIdentity {
    CounterIdentity::default()
}

/// Creates an in-memory store holding the receipt counter at `value`.
pub fn provisioned_store(value: u64) -> MemoryStore {
    let store = MemoryStore::new();
    store.provision(&receipts(), value);
    store
}

/// Store whose priming read races `increments` from other clients, committed
/// before the read or, with `commit_after_read`, right after it.
#[derive(Clone)]
pub struct RacingStore {
    pub inner: MemoryStore,
    pub increments: u64,
    pub commit_after_read: bool,
}

impl RacingStore {
    async fn commit(&self, identity: &CounterIdentity) -> Result<()> {
        for _ in 0..self.increments {
            self.inner.atomic_increment(identity, 1).await?;
        }
        Ok(())
    }
}

impl CounterStore for RacingStore {
    async fn get(&self, identity: &CounterIdentity) -> Result<Snapshot> {
        if self.commit_after_read {
            let snapshot = self.inner.get(identity).await?;
            self.commit(identity).await?;
            return Ok(snapshot);
        }
        self.commit(identity).await?;
        self.inner.get(identity).await
    }

    async fn watch(&self, identity: &CounterIdentity) -> Result<Snapshots> {
        self.inner.watch(identity).await
    }

    async fn atomic_increment(&self, identity: &CounterIdentity, delta: u64) -> Result<()> {
        self.inner.atomic_increment(identity, delta).await
    }
}

/// Store whose push channel ends after `pushes` snapshots.
#[derive(Clone)]
pub struct FiniteStore {
    pub inner: MemoryStore,
    pub pushes: usize,
}

impl CounterStore for FiniteStore {
    async fn get(&self, identity: &CounterIdentity) -> Result<Snapshot> {
        self.inner.get(identity).await
    }

    async fn watch(&self, identity: &CounterIdentity) -> Result<Snapshots> {
        let snapshots = self.inner.watch(identity).await?;
        Ok(Box::pin(snapshots.take(self.pushes)))
    }

    async fn atomic_increment(&self, identity: &CounterIdentity, delta: u64) -> Result<()> {
        self.inner.atomic_increment(identity, delta).await
    }
}

/// Store whose priming read takes `delay` to answer.
#[derive(Clone)]
pub struct SlowStore {
    pub inner: MemoryStore,
    pub delay: Duration,
}

impl CounterStore for SlowStore {
    async fn get(&self, identity: &CounterIdentity) -> Result<Snapshot> {
        tokio::time::sleep(self.delay).await;
        self.inner.get(identity).await
    }

    async fn watch(&self, identity: &CounterIdentity) -> Result<Snapshots> {
        self.inner.watch(identity).await
    }

    async fn atomic_increment(&self, identity: &CounterIdentity, delta: u64) -> Result<()> {
        self.inner.atomic_increment(identity, delta).await
    }
}

/// Records every value handed to a subscription callback.
#[derive(Clone, Default)]
pub struct Recorder {
    values: Arc<Mutex<Vec<u64>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn callback(&self) -> impl Fn(u64) + Send + Sync + 'static {
        let values = self.values.clone();
        move |value| values.lock().unwrap().push(value)
    }

    pub fn values(&self) -> Vec<u64> {
        self.values.lock().unwrap().clone()
    }

    pub async fn wait_for(&self, count: usize) -> Vec<u64> {
        eventually(|| self.values().len() >= count).await;
        self.values()
    }
}

/// Polls `condition` until it holds, failing the test after a few seconds.
pub async fn eventually<F: Fn() -> bool>(condition: F) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not met in time");
}

/// Gives the push pump a chance to run anything already queued.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

/// Connects to the NATS server at `NATS_URL` (defaults to localhost).
pub async fn create_jetstream_store() -> JetStreamStore {
    let url = std::env::var("NATS_URL").unwrap_or_else(|_| "nats://localhost:4222".to_string());
    let client = async_nats::connect(url)
        .await
        .expect("Failed to connect to NATS server");
    JetStreamStore::new(async_nats::jetstream::new(client))
}

/// Identity with a stream name and subject unique to one test run.
pub fn unique_identity(prefix: &str) -> CounterIdentity {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    // Streams must not overlap, so the subject is unique as well.
    CounterIdentity::new(
        format!("{}_{}", prefix, nanos),
        format!("receipts-{}", nanos),
        "totalReceipts",
    )
}
