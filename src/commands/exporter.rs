// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::db::SqliteRateStore;
use crate::resolver::resolve;
use crate::store::RateStore;
use crate::utils::currency_arg;
use anyhow::Result;

pub fn handle(store: &SqliteRateStore, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("rates", sub)) => export_rates(store, sub),
        _ => Ok(()),
    }
}

fn export_rates(store: &SqliteRateStore, sub: &clap::ArgMatches) -> Result<()> {
    let out = sub.get_one::<String>("out").unwrap().trim();
    let base = currency_arg(sub, "base", &store.base_currency()?)?;

    let automatic = store.get_all_automatic(&base)?;
    let manual = store.get_all_manual(&base)?;
    let (manual_view, automatic_view) = resolve(&automatic, &manual);

    let mut wtr = csv::Writer::from_path(out)?;
    wtr.write_record(["base", "quote", "rate", "origin"])?;
    for e in manual_view.iter().chain(automatic_view.iter()) {
        let rate = e.rate.normalize().to_string();
        wtr.write_record([
            e.base_currency.as_str(),
            e.quote_currency.as_str(),
            rate.as_str(),
            e.origin.as_str(),
        ])?;
    }
    wtr.flush()?;
    println!(
        "Exported {} rates for {} to {}",
        manual_view.len() + automatic_view.len(),
        base,
        out
    );
    Ok(())
}
