// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use proptest::prelude::*;
use ratebook::models::{CurrencyCode, RateEntry};
use ratebook::resolver::{filter_views, normalize_search, resolve};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};

const CODES: [&str; 8] = ["AUD", "CAD", "CHF", "EUR", "GBP", "JPY", "USD", "ZAR"];

fn ccy(s: &str) -> CurrencyCode {
    CurrencyCode::parse(s).unwrap()
}

fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn auto(q: &str, r: &str) -> RateEntry {
    RateEntry::automatic(ccy("BGN"), ccy(q), d(r))
}

fn manual(q: &str, r: &str) -> RateEntry {
    RateEntry::manual(ccy("BGN"), ccy(q), d(r))
}

fn quotes(v: &[RateEntry]) -> Vec<&str> {
    v.iter().map(|e| e.quote_currency.as_str()).collect()
}

#[test]
fn manual_override_shadows_automatic() {
    let automatic = vec![auto("USD", "1.80"), auto("EUR", "1.95")];
    let manual_rates = vec![manual("USD", "1.85")];

    let (m, a) = resolve(&automatic, &manual_rates);
    assert_eq!(m, vec![manual("USD", "1.85")]);
    assert_eq!(a, vec![auto("EUR", "1.95")]);
}

#[test]
fn views_sorted_by_quote_code() {
    let automatic = vec![auto("ZAR", "9.5"), auto("AUD", "0.85"), auto("JPY", "82")];
    let manual_rates = vec![manual("USD", "1.85"), manual("CHF", "0.5")];

    let (m, a) = resolve(&automatic, &manual_rates);
    assert_eq!(quotes(&m), vec!["CHF", "USD"]);
    assert_eq!(quotes(&a), vec!["AUD", "JPY", "ZAR"]);

    // Same input, same output
    let (m2, a2) = resolve(&automatic, &manual_rates);
    assert_eq!(m, m2);
    assert_eq!(a, a2);
}

#[test]
fn manual_without_automatic_counterpart_is_listed() {
    let (m, a) = resolve(&[auto("EUR", "1.95")], &[manual("GBP", "2.2")]);
    assert_eq!(quotes(&m), vec!["GBP"]);
    assert_eq!(quotes(&a), vec!["EUR"]);
}

#[test]
fn search_is_case_insensitive_substring() {
    let (m, a) = resolve(
        &[auto("USD", "1.80"), auto("EUR", "1.95"), auto("AUD", "1.2")],
        &[manual("CAD", "1.3")],
    );

    let search = normalize_search("  us ");
    assert_eq!(search, "US");
    let (fm, fa) = filter_views(m.clone(), a.clone(), &search);
    assert!(fm.is_empty());
    assert_eq!(quotes(&fa), vec!["USD"]);

    let (fm, fa) = filter_views(m.clone(), a.clone(), &normalize_search("d"));
    assert_eq!(quotes(&fm), vec!["CAD"]);
    assert_eq!(quotes(&fa), vec!["AUD", "USD"]);

    let (fm, fa) = filter_views(m.clone(), a.clone(), &normalize_search(""));
    assert_eq!(fm, m);
    assert_eq!(fa, a);
}

proptest! {
    #[test]
    fn resolved_views_are_disjoint_and_complete(
        auto_rates in prop::collection::btree_map(0usize..8, 1i64..1_000_000, 0..8),
        manual_rates in prop::collection::btree_map(0usize..8, 1i64..1_000_000, 0..8),
    ) {
        let automatic: Vec<RateEntry> = auto_rates
            .iter()
            .map(|(i, r)| RateEntry::automatic(ccy("BGN"), ccy(CODES[*i]), Decimal::new(*r, 4)))
            .collect();
        let manual_entries: Vec<RateEntry> = manual_rates
            .iter()
            .map(|(i, r)| RateEntry::manual(ccy("BGN"), ccy(CODES[*i]), Decimal::new(*r, 4)))
            .collect();

        let (m, a) = resolve(&automatic, &manual_entries);

        let mq: BTreeSet<_> = m.iter().map(|e| e.quote_currency.clone()).collect();
        let aq: BTreeSet<_> = a.iter().map(|e| e.quote_currency.clone()).collect();
        prop_assert!(mq.is_disjoint(&aq));
        prop_assert_eq!(m.len(), manual_entries.len());

        // visible automatics + shadowed automatics == stored automatics
        let shadowed: Vec<&RateEntry> = automatic
            .iter()
            .filter(|e| mq.contains(&e.quote_currency))
            .collect();
        prop_assert_eq!(a.len() + shadowed.len(), automatic.len());
        let stored: BTreeMap<_, _> = automatic
            .iter()
            .map(|e| (e.quote_currency.clone(), e.rate))
            .collect();
        for e in &a {
            prop_assert_eq!(stored.get(&e.quote_currency), Some(&e.rate));
        }

        prop_assert!(m.windows(2).all(|w| w[0].quote_currency < w[1].quote_currency));
        prop_assert!(a.windows(2).all(|w| w[0].quote_currency < w[1].quote_currency));
    }
}
