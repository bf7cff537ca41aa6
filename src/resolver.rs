// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::errors::{RatesError, Result};
use crate::models::{CurrencyCode, RateEntry};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashSet};

/// Applies override precedence.
///
/// Returns `(manual_view, automatic_view)`, both sorted by quote code. An
/// automatic entry whose quote has a manual override is shadowed: it stays in
/// the store but appears in neither view.
pub fn resolve(
    automatic: &[RateEntry],
    manual: &[RateEntry],
) -> (Vec<RateEntry>, Vec<RateEntry>) {
    let overridden: HashSet<&CurrencyCode> = manual.iter().map(|e| &e.quote_currency).collect();

    let mut manual_view = manual.to_vec();
    manual_view.sort_by(|a, b| a.quote_currency.cmp(&b.quote_currency));

    let mut automatic_view: Vec<RateEntry> = automatic
        .iter()
        .filter(|e| !overridden.contains(&e.quote_currency))
        .cloned()
        .collect();
    automatic_view.sort_by(|a, b| a.quote_currency.cmp(&b.quote_currency));

    (manual_view, automatic_view)
}

/// Search text is compared against uppercase quote codes.
pub fn normalize_search(text: &str) -> String {
    text.trim().to_uppercase()
}

pub fn matches_search(entry: &RateEntry, search: &str) -> bool {
    search.is_empty() || entry.quote_currency.as_str().contains(search)
}

/// `search` must already be normalized.
pub fn filter_views(
    manual: Vec<RateEntry>,
    automatic: Vec<RateEntry>,
    search: &str,
) -> (Vec<RateEntry>, Vec<RateEntry>) {
    let keep = |v: Vec<RateEntry>| -> Vec<RateEntry> {
        v.into_iter().filter(|e| matches_search(e, search)).collect()
    };
    (keep(manual), keep(automatic))
}

/// Rate in force for every quote currency, manual overrides first.
pub fn effective_rates(
    automatic: &[RateEntry],
    manual: &[RateEntry],
) -> BTreeMap<CurrencyCode, Decimal> {
    let (manual_view, automatic_view) = resolve(automatic, manual);
    manual_view
        .into_iter()
        .chain(automatic_view)
        .map(|e| (e.quote_currency, e.rate))
        .collect()
}

/// Converts through the base currency using the effective rates.
pub fn convert(
    base: &CurrencyCode,
    rates: &BTreeMap<CurrencyCode, Decimal>,
    amount: Decimal,
    from: &CurrencyCode,
    to: &CurrencyCode,
) -> Result<Decimal> {
    if from == to {
        return Ok(amount);
    }
    let rate_for = |quote: &CurrencyCode| -> Result<Decimal> {
        rates
            .get(quote)
            .copied()
            .filter(|r| !r.is_zero())
            .ok_or_else(|| RatesError::RateNotFound(format!("{}/{}", base, quote)))
    };
    let overflow = || RatesError::ConversionOverflow(format!("{} {} to {}", amount, from, to));
    if from == base {
        return amount.checked_mul(rate_for(to)?).ok_or_else(overflow);
    }
    if to == base {
        return amount.checked_div(rate_for(from)?).ok_or_else(overflow);
    }
    let in_base = amount
        .checked_div(rate_for(from)?)
        .ok_or_else(overflow)?;
    in_base.checked_mul(rate_for(to)?).ok_or_else(overflow)
}
