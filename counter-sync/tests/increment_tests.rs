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

mod common;

use common::{Recorder, provisioned_store, receipts, settle};
use counter_sync::{CounterErrorKind, Incrementer, MemoryStore, SubscriptionManager};

#[tokio::test]
async fn test_increments_arrive_as_pushes() {
    let store = provisioned_store(100);
    let manager = SubscriptionManager::new(store.clone(), receipts());
    let recorder = Recorder::new();
    let _subscription = manager.subscribe(recorder.callback()).await.unwrap();

    let incrementer = Incrementer::new(store.clone(), receipts());
    for _ in 0..5 {
        incrementer.increment().await.expect("Failed to increment");
    }

    let values = recorder.wait_for(6).await;
    assert_eq!(values, vec![100, 101, 102, 103, 104, 105]);
    assert!(values.windows(2).all(|pair| pair[1] == pair[0] + 1));
    assert_eq!(manager.read(), 105);
    assert_eq!(store.value(&receipts()), Some(105));
}

#[tokio::test]
async fn test_concurrent_increments_are_not_lost() {
    let store = provisioned_store(0);
    let manager = SubscriptionManager::new(store.clone(), receipts());
    let recorder = Recorder::new();
    let _subscription = manager.subscribe(recorder.callback()).await.unwrap();

    let first = manager.incrementer();
    let second = Incrementer::new(store.clone(), receipts());
    let (a, b) = tokio::join!(first.increment(), second.increment());
    a.expect("first increment failed");
    b.expect("second increment failed");

    assert_eq!(recorder.wait_for(3).await, vec![0, 1, 2]);
    assert_eq!(manager.read(), 2);
}

#[tokio::test]
async fn test_increment_does_not_touch_mirror() {
    let store = provisioned_store(7);
    let manager = SubscriptionManager::new(store.clone(), receipts());

    manager.incrementer().increment().await.unwrap();

    // Without a live subscription nothing ever reaches the mirror.
    assert_eq!(store.value(&receipts()), Some(8));
    assert_eq!(manager.mirror().observed(), None);
    assert_eq!(manager.read(), 0);
}

#[tokio::test]
async fn test_increment_store_unavailable() {
    let store = provisioned_store(4);
    let manager = SubscriptionManager::new(store.clone(), receipts());
    let recorder = Recorder::new();
    let _subscription = manager.subscribe(recorder.callback()).await.unwrap();

    store.set_offline(true);
    let result = manager.incrementer().increment().await;
    assert!(matches!(result, Err(e) if e.kind() == CounterErrorKind::StoreUnavailable));

    settle().await;
    assert_eq!(store.value(&receipts()), Some(4));
    assert_eq!(recorder.values(), vec![4]);
}

#[tokio::test]
async fn test_increment_uninitialized_counter() {
    let store = MemoryStore::new();
    let incrementer = Incrementer::new(store.clone(), receipts());

    let result = incrementer.increment().await;
    assert!(matches!(result, Err(e) if e.kind() == CounterErrorKind::NotInitialized));
    assert_eq!(store.value(&receipts()), None);
}
