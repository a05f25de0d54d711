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

//! The `+1` write path.

use crate::{CounterIdentity, Result, store::CounterStore};
use tracing::debug;

/// Issues atomic increments of one counter.
///
/// An increment never touches a [CounterMirror](crate::CounterMirror). The new value
/// reaches the mirror only when the write comes back through the push channel of a
/// [SubscriptionManager](crate::SubscriptionManager), so what is displayed is always
/// what every other client observes too.
///
/// There is no retry. A failed call may or may not have been applied by the store,
/// and calling again after such an ambiguous failure can count twice.
#[derive(Debug, Clone)]
pub struct Incrementer<S> {
    store: S,
    identity: CounterIdentity,
}

impl<S: CounterStore> Incrementer<S> {
    pub fn new(store: S, identity: CounterIdentity) -> Self {
        Incrementer { store, identity }
    }

    /// Adds exactly one to the counter. Resolves once the store acknowledged the write.
    pub async fn increment(&self) -> Result<()> {
        self.store.atomic_increment(&self.identity, 1).await?;
        debug!(counter = %self.identity, "counter incremented");
        Ok(())
    }
}
