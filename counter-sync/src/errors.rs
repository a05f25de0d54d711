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

use std::fmt;

/// Error type for counter synchronization operations.
pub type CounterError = async_nats::error::Error<CounterErrorKind>;

/// Result type for counter synchronization operations.
pub type Result<T> = std::result::Result<T, CounterError>;

/// Kinds of errors that can occur while reading, watching or incrementing a counter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CounterErrorKind {
    /// The store rejected or could not complete the request (network, auth, quota).
    StoreUnavailable,
    /// The counter document has not been provisioned in the store.
    NotInitialized,
    /// The stored counter value is not a valid non-negative integer.
    InvalidCounterValue,
    /// JSON parsing error.
    Serialization,
    /// The subscription manager has been torn down and cannot be reused.
    Closed,
    /// Missing or invalid configuration.
    Config,
}

impl fmt::Display for CounterErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StoreUnavailable => write!(f, "counter store unavailable"),
            Self::NotInitialized => write!(f, "counter document not initialized"),
            Self::InvalidCounterValue => write!(f, "invalid counter value"),
            Self::Serialization => write!(f, "serialization error"),
            Self::Closed => write!(f, "subscription manager is closed"),
            Self::Config => write!(f, "invalid configuration"),
        }
    }
}
