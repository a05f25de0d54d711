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

//! The seam between the synchronization service and the remote counter store.

use crate::{CounterIdentity, Result, Snapshot};
use futures::Stream;
use std::future::Future;
use std::pin::Pin;

/// Ordered stream of document states pushed by the store.
///
/// Dropping the stream cancels the underlying push channel.
pub type Snapshots = Pin<Box<dyn Stream<Item = Result<Snapshot>> + Send + 'static>>;

/// Primitives a remote store has to offer for a counter to be synchronized.
///
/// Every method fails with [CounterErrorKind::StoreUnavailable](crate::CounterErrorKind::StoreUnavailable)
/// when the request cannot be completed at the transport or permission level.
pub trait CounterStore: Clone + Send + Sync + 'static {
    /// Reads the current state of the counter document.
    fn get(&self, identity: &CounterIdentity) -> impl Future<Output = Result<Snapshot>> + Send;

    /// Opens a push channel delivering every state of the document observed after
    /// the channel is established, in the order the store applied them.
    fn watch(&self, identity: &CounterIdentity)
    -> impl Future<Output = Result<Snapshots>> + Send;

    /// Atomically adds `delta` to the counter field. Resolves once the store has
    /// acknowledged the write as durable.
    fn atomic_increment(
        &self,
        identity: &CounterIdentity,
        delta: u64,
    ) -> impl Future<Output = Result<()>> + Send;
}
