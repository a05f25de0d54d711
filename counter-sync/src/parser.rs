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

//! Parsing of counter payloads stored in a JetStream counter stream.

use crate::errors::{CounterError, CounterErrorKind, Result};
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// JSON structure for counter value payload.
#[derive(Debug, Serialize, Deserialize)]
struct CounterPayload {
    val: String,
}

/// Parses a counter value from message data.
///
/// Counter values are stored as JSON in the format: `{"val": "123"}`. The store
/// keeps arbitrary precision integers, a receipt total has to fit a `u64` and can
/// never be negative.
pub fn parse_counter_value(data: &[u8]) -> Result<u64> {
    if data.is_empty() {
        return Err(CounterError::new(CounterErrorKind::InvalidCounterValue));
    }

    let payload: CounterPayload = serde_json::from_slice(data)
        .map_err(|e| CounterError::with_source(CounterErrorKind::Serialization, e))?;

    to_total(&payload.val)
}

/// Parses the running total carried by a publish acknowledgment.
pub fn parse_ack_value(value: Option<&str>) -> Result<Option<u64>> {
    value.map(to_total).transpose()
}

fn to_total(raw: &str) -> Result<u64> {
    let value = BigInt::from_str(raw)
        .map_err(|_| CounterError::new(CounterErrorKind::InvalidCounterValue))?;

    u64::try_from(&value)
        .map_err(|e| CounterError::with_source(CounterErrorKind::InvalidCounterValue, e))
}
