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

//! Live receipt counter example.
//!
//! Subscribes to the receipt counter, issues a few receipts and prints every value
//! the subscription observes together with the local currency.
//!
//! Uses a JetStream backed counter when `COUNTER_NATS_URL` is set and an in-memory
//! counter otherwise. Run this example with:
//! ```sh
//! RUST_LOG=counter_sync=debug cargo run --example live_receipts
//! ```

use counter_sync::{
    CounterIdentity, CounterStore, JetStreamStore, MemoryStore, StoreConfig, SubscriptionManager,
    config,
};
use futures::StreamExt;
use tracing_subscriber::EnvFilter;

const RECEIPTS: u64 = 3;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let currency = currency_lookup::local_currency();
    println!("=== Live Receipt Counter ===\n");
    println!(
        "Issuing receipts in {} ({} {})\n",
        currency.country_name, currency.currency_code, currency.currency_symbol
    );

    if std::env::var_os(config::URL_VAR).is_none() {
        println!("{} not set, using an in-memory counter\n", config::URL_VAR);
        let store = MemoryStore::new();
        let identity = CounterIdentity::default();
        store.provision(&identity, 0);
        return run(store, identity).await;
    }

    // Any other configuration problem is reported instead of silently ignored.
    let config = StoreConfig::from_env()?;
    let store = JetStreamStore::connect(&config).await?;
    store.provision(&config.identity).await?;
    run(store, config.identity).await
}

async fn run<S: CounterStore>(
    store: S,
    identity: CounterIdentity,
) -> Result<(), Box<dyn std::error::Error>> {
    let manager = SubscriptionManager::new(store, identity);
    let mut updates = manager.updates().await?;

    let start = updates.next().await.unwrap_or_default();
    println!("Receipts issued so far: {}", start);

    let incrementer = manager.incrementer();
    for _ in 0..RECEIPTS {
        incrementer.increment().await?;
    }

    // Our own increments come back through the subscription.
    while let Some(total) = updates.next().await {
        println!("  Receipt #{} issued", total);
        if total >= start + RECEIPTS {
            break;
        }
    }

    println!("\nMirrored total: {}", manager.read());
    Ok(())
}
