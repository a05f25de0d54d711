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

//! Local read cache of the remote counter.

use std::sync::Arc;
use tokio::sync::watch;

/// Last counter value observed from the store.
///
/// The mirror is never authoritative. It is overwritten wholesale by whichever
/// read or push is applied last and can be read synchronously from any thread.
/// Clones share the same underlying value.
#[derive(Debug, Clone)]
pub struct CounterMirror {
    value: Arc<watch::Sender<Option<u64>>>,
}

impl CounterMirror {
    pub fn new() -> Self {
        let (value, _) = watch::channel(None);
        CounterMirror {
            value: Arc::new(value),
        }
    }

    /// Returns the mirrored value, or `0` if nothing has been observed yet.
    pub fn read(&self) -> u64 {
        self.observed().unwrap_or_default()
    }

    /// Returns the mirrored value, `None` meaning the counter has never been observed.
    ///
    /// Distinguishes a counter that was never initialized from one confirmed at zero.
    pub fn observed(&self) -> Option<u64> {
        *self.value.borrow()
    }

    /// Replaces the mirrored value unconditionally.
    pub fn set(&self, value: u64) {
        self.value.send_replace(Some(value));
    }

    /// Waits for the next change of the mirror and returns the new value.
    ///
    /// `None` means the mirror was discarded because its subscription was torn down.
    pub async fn changed(&self) -> Option<u64> {
        let mut receiver = self.value.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = receiver.changed().await;
        *receiver.borrow_and_update()
    }

    pub(crate) fn clear(&self) {
        self.value.send_replace(None);
    }
}

impl Default for CounterMirror {
    fn default() -> Self {
        Self::new()
    }
}
