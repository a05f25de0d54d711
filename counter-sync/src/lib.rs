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

//! Live synchronization of a shared receipt counter.
//!
//! This crate keeps a local mirror of a single remotely stored counter up to date
//! through a push subscription, and exposes an atomic "add one" operation that
//! goes through the store rather than the mirror.
//!
//! # Overview
//!
//! - [CounterStore] is the seam to the remote store: point read, push watch and
//!   atomic increment. [JetStreamStore] implements it on top of a JetStream
//!   stream with message counters enabled, [MemoryStore] in process.
//! - [SubscriptionManager] performs the priming read, owns the single push
//!   channel for its [CounterIdentity], writes every observed value into the
//!   [CounterMirror] and fans it out to listeners.
//! - [Incrementer] issues the `+1` write. The mirror only ever learns about the
//!   new value when the write comes back through the push channel.
//!
//! # Quick Start
//!
//! ```no_run
//! use counter_sync::{CounterIdentity, Incrementer, JetStreamStore, SubscriptionManager};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = async_nats::connect("localhost:4222").await?;
//! let store = JetStreamStore::new(async_nats::jetstream::new(client));
//! let identity = CounterIdentity::default();
//!
//! let manager = SubscriptionManager::new(store.clone(), identity.clone());
//! let _subscription = manager
//!     .subscribe(|total| println!("receipts issued: {}", total))
//!     .await?;
//!
//! Incrementer::new(store, identity).increment().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod errors;
pub mod jetstream;
pub mod manager;
pub mod memory;
pub mod mirror;
pub mod parser;
pub mod store;

mod increment;

use std::fmt;

pub use config::StoreConfig;
pub use errors::{CounterError, CounterErrorKind, Result};
pub use increment::Incrementer;
pub use jetstream::JetStreamStore;
pub use manager::{LifecycleState, OrderingPolicy, Subscription, SubscriptionManager, Updates};
pub use memory::MemoryStore;
pub use mirror::CounterMirror;
pub use store::{CounterStore, Snapshots};

/// Collection holding the receipt counter document.
pub const DEFAULT_COLLECTION: &str = "receipt-counters";

/// Document holding the receipt counter.
pub const DEFAULT_DOCUMENT: &str = "receipts";

/// Field of the receipt counter document that holds the total.
pub const DEFAULT_FIELD: &str = "totalReceipts";

/// Addresses one counter field of one document in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CounterIdentity {
    /// Collection (JetStream stream) holding the document.
    pub collection: String,
    /// Document name within the collection.
    pub document: String,
    /// Integer field of the document that is counted.
    pub field: String,
}

impl CounterIdentity {
    pub fn new(
        collection: impl Into<String>,
        document: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        CounterIdentity {
            collection: collection.into(),
            document: document.into(),
            field: field.into(),
        }
    }

    /// Subject the counter lives on inside its collection.
    pub fn subject(&self) -> String {
        format!("{}.{}", self.document, self.field)
    }
}

impl Default for CounterIdentity {
    fn default() -> Self {
        CounterIdentity::new(DEFAULT_COLLECTION, DEFAULT_DOCUMENT, DEFAULT_FIELD)
    }
}

impl fmt::Display for CounterIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.collection, self.document, self.field)
    }
}

/// Full state of the counter document as seen by one read or push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Snapshot {
    /// The document does not exist (yet).
    Missing,
    /// The document exists and holds this value.
    Value(u64),
}

impl Snapshot {
    pub fn exists(&self) -> bool {
        matches!(self, Snapshot::Value(_))
    }

    pub fn value(&self) -> Option<u64> {
        match self {
            Snapshot::Missing => None,
            Snapshot::Value(value) => Some(*value),
        }
    }
}

impl From<Option<u64>> for Snapshot {
    fn from(value: Option<u64>) -> Self {
        value.map_or(Snapshot::Missing, Snapshot::Value)
    }
}
