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

//! Counter store backed by a JetStream stream with message counters enabled.
//!
//! The identity maps onto JetStream as follows:
//!
//! - the collection is the stream name,
//! - `<document>.<field>` is the subject the counter lives on.
//!
//! Increments are published with the `Nats-Incr` header and the server keeps the
//! running total in the last message of the subject as `{"val": "<total>"}`. The push
//! channel is an ordered consumer filtered on the subject that only delivers messages
//! stored after it was created.

use crate::{
    CounterIdentity, Result, Snapshot, StoreConfig,
    errors::{CounterError, CounterErrorKind},
    parser::{parse_ack_value, parse_counter_value},
    store::{CounterStore, Snapshots},
};
use async_nats::{
    HeaderMap,
    jetstream::{
        self,
        consumer::{DeliverPolicy, pull::OrderedConfig},
        stream::{LastRawMessageErrorKind, Stream},
    },
};
use bytes::Bytes;
use futures::StreamExt;
use tracing::debug;

/// Header key used to indicate counter increment values.
pub const COUNTER_INCREMENT_HEADER: &str = "Nats-Incr";

fn unavailable<E>(source: E) -> CounterError
where
    E: std::error::Error + Send + Sync + 'static,
{
    CounterError::with_source(CounterErrorKind::StoreUnavailable, source)
}

/// [CounterStore] on top of a JetStream context.
#[derive(Clone)]
pub struct JetStreamStore {
    context: jetstream::Context,
}

impl JetStreamStore {
    pub fn new(context: jetstream::Context) -> Self {
        JetStreamStore { context }
    }

    /// Connects to the server named in `config`.
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let client = async_nats::connect(config.url.as_str())
            .await
            .map_err(unavailable)?;
        Ok(Self::new(jetstream::new(client)))
    }

    /// Creates the counter stream if needed and initializes the counter to zero if it
    /// holds no value yet.
    pub async fn provision(&self, identity: &CounterIdentity) -> Result<()> {
        let config = jetstream::stream::Config {
            name: identity.collection.clone(),
            subjects: vec![identity.subject()],
            allow_message_counter: true,
            allow_direct: true,
            ..Default::default()
        };
        self.context
            .get_or_create_stream(config)
            .await
            .map_err(unavailable)?;

        if !self.get(identity).await?.exists() {
            self.atomic_increment(identity, 0).await?;
        }
        Ok(())
    }

    async fn stream(&self, identity: &CounterIdentity) -> Result<Stream> {
        let mut stream = self
            .context
            .get_stream(&identity.collection)
            .await
            .map_err(unavailable)?;

        let info = stream.info().await.map_err(unavailable)?;
        if !info.config.allow_message_counter || !info.config.allow_direct {
            return Err(CounterError::with_source(
                CounterErrorKind::Config,
                format!(
                    "stream {} must allow message counters and direct access",
                    identity.collection
                ),
            ));
        }

        Ok(stream)
    }
}

impl CounterStore for JetStreamStore {
    async fn get(&self, identity: &CounterIdentity) -> Result<Snapshot> {
        let stream = self.stream(identity).await?;

        match stream
            .get_last_raw_message_by_subject(&identity.subject())
            .await
        {
            Ok(message) => parse_counter_value(&message.payload).map(Snapshot::Value),
            Err(e) => match e.kind() {
                LastRawMessageErrorKind::NoMessageFound => Ok(Snapshot::Missing),
                _ => Err(unavailable(e)),
            },
        }
    }

    async fn watch(&self, identity: &CounterIdentity) -> Result<Snapshots> {
        let stream = self.stream(identity).await?;

        let consumer = stream
            .create_consumer(OrderedConfig {
                filter_subject: identity.subject(),
                deliver_policy: DeliverPolicy::New,
                ..Default::default()
            })
            .await
            .map_err(unavailable)?;

        let messages = consumer.messages().await.map_err(unavailable)?;
        debug!(counter = %identity, "ordered consumer created for counter");

        let snapshots = messages.map(|message| {
            let message = message.map_err(unavailable)?;
            parse_counter_value(&message.payload).map(Snapshot::Value)
        });

        Ok(Box::pin(snapshots) as Snapshots)
    }

    async fn atomic_increment(&self, identity: &CounterIdentity, delta: u64) -> Result<()> {
        let mut headers = HeaderMap::new();
        headers.insert(COUNTER_INCREMENT_HEADER, delta.to_string());

        let ack = self
            .context
            .publish_with_headers(identity.subject(), headers, Bytes::new())
            .await
            .map_err(unavailable)?
            .await
            .map_err(unavailable)?;

        let total = parse_ack_value(ack.value.as_deref())?;
        debug!(counter = %identity, delta, total = ?total, "counter increment acknowledged");
        Ok(())
    }
}
