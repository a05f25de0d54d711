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

//! Environment driven configuration of the counter store.

use crate::{
    CounterIdentity, DEFAULT_COLLECTION, DEFAULT_DOCUMENT, DEFAULT_FIELD, Result,
    errors::{CounterError, CounterErrorKind},
};

/// Environment variable holding the NATS server URL. Required.
pub const URL_VAR: &str = "COUNTER_NATS_URL";

/// Environment variable overriding the counter collection (JetStream stream name).
pub const COLLECTION_VAR: &str = "COUNTER_COLLECTION";

/// Environment variable overriding the counter document.
pub const DOCUMENT_VAR: &str = "COUNTER_DOCUMENT";

/// Environment variable overriding the counter field.
pub const FIELD_VAR: &str = "COUNTER_FIELD";

/// Where the counter store lives and which counter to synchronize.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    pub url: String,
    pub identity: CounterIdentity,
}

impl StoreConfig {
    /// Loads the configuration from the process environment.
    ///
    /// The URL is required. The identity falls back to the receipt counter.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup(URL_VAR)
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| {
                CounterError::with_source(
                    CounterErrorKind::Config,
                    format!("missing required environment variable: {}", URL_VAR),
                )
            })?;

        let token = |key: &str, default: &str| -> Result<String> {
            let value = lookup(key).unwrap_or_else(|| default.to_string());
            validate_token(key, &value)?;
            Ok(value)
        };

        let identity = CounterIdentity::new(
            token(COLLECTION_VAR, DEFAULT_COLLECTION)?,
            token(DOCUMENT_VAR, DEFAULT_DOCUMENT)?,
            token(FIELD_VAR, DEFAULT_FIELD)?,
        );

        Ok(StoreConfig { url, identity })
    }
}

// Each part ends up as a stream name or a single subject token.
fn validate_token(key: &str, value: &str) -> Result<()> {
    let invalid = value.is_empty()
        || value
            .chars()
            .any(|c| c == '.' || c == '*' || c == '>' || c.is_whitespace());

    if invalid {
        return Err(CounterError::with_source(
            CounterErrorKind::Config,
            format!("invalid value for {}: {:?}", key, value),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_config_defaults_identity() {
        let config =
            StoreConfig::from_lookup(lookup(&[(URL_VAR, "nats://localhost:4222")])).unwrap();
        assert_eq!(config.url, "nats://localhost:4222");
        assert_eq!(config.identity, CounterIdentity::default());
        assert_eq!(config.identity.subject(), "receipts.totalReceipts");
    }

    #[test]
    fn test_config_overrides_identity() {
        let config = StoreConfig::from_lookup(lookup(&[
            (URL_VAR, "nats://demo.nats.io"),
            (COLLECTION_VAR, "INVOICES"),
            (DOCUMENT_VAR, "invoices"),
            (FIELD_VAR, "issued"),
        ]))
        .unwrap();
        assert_eq!(
            config.identity,
            CounterIdentity::new("INVOICES", "invoices", "issued")
        );
    }

    #[test]
    fn test_config_missing_url() {
        let err = StoreConfig::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err.kind(), CounterErrorKind::Config);
        assert!(err.to_string().contains(URL_VAR));
    }

    #[test]
    fn test_config_blank_url() {
        let err = StoreConfig::from_lookup(lookup(&[(URL_VAR, "  ")])).unwrap_err();
        assert_eq!(err.kind(), CounterErrorKind::Config);
    }

    #[test]
    fn test_config_rejects_wildcard_tokens() {
        let err = StoreConfig::from_lookup(lookup(&[
            (URL_VAR, "nats://localhost:4222"),
            (DOCUMENT_VAR, "receipts.*"),
        ]))
        .unwrap_err();
        assert_eq!(err.kind(), CounterErrorKind::Config);
        assert!(err.to_string().contains(DOCUMENT_VAR));
    }
}
