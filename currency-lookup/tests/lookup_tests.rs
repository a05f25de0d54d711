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

use currency_lookup::{CountryCurrency, FALLBACK, default_currency, lookup, timezones};

#[test]
fn test_lookup_accra() {
    let ghana = lookup("Africa/Accra").expect("Accra should be mapped");
    assert_eq!(ghana.country_name, "Ghana");
    assert_eq!(ghana.currency_code, "GHS");
    // The table entry spells the symbol out, only the fallback uses the cedi sign.
    assert_eq!(ghana.currency_symbol, "GHS");
}

#[test]
fn test_lookup_paris() {
    let france = lookup("Europe/Paris").expect("Paris should be mapped");
    assert_eq!(
        *france,
        CountryCurrency {
            country_name: "France",
            currency_code: "EUR",
            currency_symbol: "€",
        }
    );
}

#[test]
fn test_lookup_unknown_zone() {
    assert!(lookup("Pacific/Unknown_Zone").is_none());
    assert!(lookup("").is_none());
}

#[test]
fn test_default_currency_fallback() {
    let fallback = default_currency("Pacific/Unknown_Zone");
    assert_eq!(fallback, FALLBACK);
    assert_eq!(fallback.country_name, "Ghana");
    assert_eq!(fallback.currency_code, "GHS");
    assert_eq!(fallback.currency_symbol, "GH₵");
}

#[test]
fn test_default_currency_known_zone() {
    let india = default_currency("Asia/Kolkata");
    assert_eq!(india.currency_code, "INR");
    assert_eq!(india.currency_symbol, "₹");
}

#[test]
fn test_lookup_is_case_sensitive() {
    assert!(lookup("europe/paris").is_none());
}

#[test]
fn test_every_timezone_resolves() {
    let zones: Vec<_> = timezones().collect();
    assert_eq!(zones.len(), 11);
    for zone in zones {
        let country = lookup(zone).unwrap();
        assert_eq!(country.currency_code.len(), 3, "{zone} has a bad currency code");
        assert!(!country.currency_symbol.is_empty());
    }
}

#[test]
fn test_serializes_for_display() {
    let json = serde_json::to_value(lookup("Africa/Lagos").unwrap()).unwrap();
    assert_eq!(json["country_name"], "Nigeria");
    assert_eq!(json["currency_code"], "NGN");
    assert_eq!(json["currency_symbol"], "₦");
}
