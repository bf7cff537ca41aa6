// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::db::SqliteRateStore;
use crate::models::RateEntry;
use crate::store::RateStore;
use crate::utils::{currency_arg, parse_currency, parse_decimal};
use anyhow::{Context, Result};
use chrono::Utc;
use csv::ReaderBuilder;

pub fn handle(store: &SqliteRateStore, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("automatic", sub)) => import_automatic(store, sub),
        _ => Ok(()),
    }
}

/// Replaces the automatic rates of the base currency with a `quote,rate` CSV.
/// Nothing is written unless every row parses.
fn import_automatic(store: &SqliteRateStore, sub: &clap::ArgMatches) -> Result<()> {
    let path = sub.get_one::<String>("path").unwrap().trim();
    let base = currency_arg(sub, "base", &store.base_currency()?)?;
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Open CSV {}", path))?;

    let mut entries = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let rec = result?;
        let line = i + 2;
        let quote_raw = rec.get(0).context("quote missing")?;
        let rate_raw = rec.get(1).context("rate missing")?;
        let quote = parse_currency(quote_raw)
            .with_context(|| format!("Invalid quote currency on line {}", line))?;
        let rate = parse_decimal(rate_raw)
            .with_context(|| format!("Invalid rate for {} on line {}", quote, line))?;
        entries.push(RateEntry::automatic(base.clone(), quote, rate));
    }

    store
        .replace_automatic(&base, &entries)
        .with_context(|| format!("Replace automatic rates for {}", base))?;
    store.mark_refreshed(&base, Utc::now())?;
    log::info!("imported {} automatic rates for {} from {}", entries.len(), base, path);
    println!("Imported {} automatic rates for {}", entries.len(), base);
    Ok(())
}
