// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::errors::{RatesError, Result};
use crate::models::{CurrencyCode, RateEntry, RateOrigin, validate_pair};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::RwLock;

/// Persistence contract the rate engine depends on.
///
/// Absence is never an error. Implementations report I/O or corruption as
/// `RatesError::StoreUnavailable` and must apply `upsert_manual` and
/// `remove_manual` atomically per (base, quote) key.
pub trait RateStore: Send + Sync {
    fn get_all_automatic(&self, base: &CurrencyCode) -> Result<Vec<RateEntry>>;
    fn get_all_manual(&self, base: &CurrencyCode) -> Result<Vec<RateEntry>>;
    /// Inserts or replaces the manual override keyed by (base, quote).
    fn upsert_manual(&self, entry: &RateEntry) -> Result<()>;
    /// Deletes the manual override for the pair; no-op when absent.
    fn remove_manual(&self, base: &CurrencyCode, quote: &CurrencyCode) -> Result<()>;
    /// Replaces every automatic rate for `base` in one step.
    fn replace_automatic(&self, base: &CurrencyCode, entries: &[RateEntry]) -> Result<()>;
}

/// Re-stamps an incoming refresh with `base` and the automatic origin.
pub fn automatic_batch(base: &CurrencyCode, entries: &[RateEntry]) -> Result<Vec<RateEntry>> {
    entries
        .iter()
        .map(|e| {
            validate_pair(base, &e.quote_currency, e.rate)?;
            Ok(RateEntry::automatic(
                base.clone(),
                e.quote_currency.clone(),
                e.rate,
            ))
        })
        .collect()
}

type Key = (CurrencyCode, CurrencyCode);

/// In-process store backed by ordered maps.
#[derive(Default)]
pub struct MemoryRateStore {
    automatic: RwLock<BTreeMap<Key, Decimal>>,
    manual: RwLock<BTreeMap<Key, Decimal>>,
}

impl MemoryRateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn collect(
        map: &RwLock<BTreeMap<Key, Decimal>>,
        base: &CurrencyCode,
        origin: RateOrigin,
    ) -> Result<Vec<RateEntry>> {
        let guard = map
            .read()
            .map_err(|e| RatesError::StoreUnavailable(e.to_string()))?;
        Ok(guard
            .iter()
            .filter(|((b, _), _)| b == base)
            .map(|((b, q), r)| RateEntry {
                base_currency: b.clone(),
                quote_currency: q.clone(),
                rate: *r,
                origin,
            })
            .collect())
    }
}

impl RateStore for MemoryRateStore {
    fn get_all_automatic(&self, base: &CurrencyCode) -> Result<Vec<RateEntry>> {
        Self::collect(&self.automatic, base, RateOrigin::Automatic)
    }

    fn get_all_manual(&self, base: &CurrencyCode) -> Result<Vec<RateEntry>> {
        Self::collect(&self.manual, base, RateOrigin::Manual)
    }

    fn upsert_manual(&self, entry: &RateEntry) -> Result<()> {
        let mut guard = self
            .manual
            .write()
            .map_err(|e| RatesError::StoreUnavailable(e.to_string()))?;
        guard.insert(
            (entry.base_currency.clone(), entry.quote_currency.clone()),
            entry.rate,
        );
        Ok(())
    }

    fn remove_manual(&self, base: &CurrencyCode, quote: &CurrencyCode) -> Result<()> {
        let mut guard = self
            .manual
            .write()
            .map_err(|e| RatesError::StoreUnavailable(e.to_string()))?;
        guard.remove(&(base.clone(), quote.clone()));
        Ok(())
    }

    fn replace_automatic(&self, base: &CurrencyCode, entries: &[RateEntry]) -> Result<()> {
        let batch = automatic_batch(base, entries)?;
        let mut guard = self
            .automatic
            .write()
            .map_err(|e| RatesError::StoreUnavailable(e.to_string()))?;
        guard.retain(|(b, _), _| b != base);
        for e in batch {
            guard.insert((e.base_currency, e.quote_currency), e.rate);
        }
        Ok(())
    }
}
