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

//! Timezone based country and currency defaults.
//!
//! Receipts are issued in the currency of the country the user is in. The table in
//! this crate maps the IANA timezones of the supported countries to that country and
//! its currency. Anything not in the table falls back to Ghana.
//!
//! ```
//! use currency_lookup::{default_currency, lookup};
//!
//! let paris = lookup("Europe/Paris").unwrap();
//! assert_eq!(paris.currency_code, "EUR");
//!
//! let fallback = default_currency("Pacific/Unknown_Zone");
//! assert_eq!(fallback.currency_symbol, "GH₵");
//! ```

use serde::Serialize;
use tracing::debug;

/// Environment variable consulted by [local_timezone].
pub const TIMEZONE_VAR: &str = "TZ";

/// Country and currency a timezone resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CountryCurrency {
    pub country_name: &'static str,
    pub currency_code: &'static str,
    pub currency_symbol: &'static str,
}

impl CountryCurrency {
    const fn new(
        country_name: &'static str,
        currency_code: &'static str,
        currency_symbol: &'static str,
    ) -> Self {
        CountryCurrency {
            country_name,
            currency_code,
            currency_symbol,
        }
    }
}

/// Returned by [default_currency] for timezones missing from the table.
pub const FALLBACK: CountryCurrency = CountryCurrency::new("Ghana", "GHS", "GH₵");

const TIMEZONES: &[(&str, CountryCurrency)] = &[
    ("Africa/Accra", CountryCurrency::new("Ghana", "GHS", "GHS")),
    ("Africa/Lagos", CountryCurrency::new("Nigeria", "NGN", "₦")),
    ("Africa/Nairobi", CountryCurrency::new("Kenya", "KES", "KSh")),
    (
        "Africa/Johannesburg",
        CountryCurrency::new("South Africa", "ZAR", "R"),
    ),
    (
        "Africa/Abidjan",
        CountryCurrency::new("Côte d'Ivoire", "XOF", "CFA "),
    ),
    ("Asia/Kolkata", CountryCurrency::new("India", "INR", "₹")),
    (
        "America/New_York",
        CountryCurrency::new("United States", "USD", "$"),
    ),
    ("Europe/Paris", CountryCurrency::new("France", "EUR", "€")),
    (
        "Europe/London",
        CountryCurrency::new("United Kingdom", "GBP", "£"),
    ),
    ("America/Toronto", CountryCurrency::new("Canada", "CAD", "CA$")),
    (
        "Australia/Sydney",
        CountryCurrency::new("Australia", "AUD", "A$"),
    ),
];

/// Looks up the country and currency for an IANA timezone.
pub fn lookup(timezone: &str) -> Option<&'static CountryCurrency> {
    TIMEZONES
        .iter()
        .find(|(zone, _)| *zone == timezone)
        .map(|(_, country)| country)
}

/// Country and currency for `timezone`, or [FALLBACK] when it is not in the table.
pub fn default_currency(timezone: &str) -> CountryCurrency {
    match lookup(timezone) {
        Some(country) => *country,
        None => {
            debug!(timezone, "no currency for timezone, using fallback");
            FALLBACK
        }
    }
}

/// Timezones the table knows about.
pub fn timezones() -> impl Iterator<Item = &'static str> {
    TIMEZONES.iter().map(|(zone, _)| *zone)
}

/// IANA timezone of this process, taken from `TZ`. Empty when unset.
pub fn local_timezone() -> String {
    std::env::var(TIMEZONE_VAR)
        .map(|tz| tz.trim_start_matches(':').to_string())
        .unwrap_or_default()
}

/// Country and currency for the timezone of this process.
pub fn local_currency() -> CountryCurrency {
    default_currency(&local_timezone())
}
