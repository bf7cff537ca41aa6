// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::db::SqliteRateStore;
use crate::resolver::{convert, effective_rates};
use crate::store::RateStore;
use crate::utils::{currency_arg, parse_currency, parse_decimal};
use anyhow::Result;
use rust_decimal::Decimal;

pub fn handle(store: &SqliteRateStore, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set-base", sub)) => {
            let ccy = parse_currency(sub.get_one::<String>("currency").unwrap())?;
            store.set_base_currency(&ccy)?;
            println!("Base currency set to {}", ccy);
        }
        Some(("convert", sub)) => {
            let (amount, res, from, to) = convert_amount(store, sub)?;
            println!("{} {} -> {:.4} {}", amount, from, res, to);
        }
        _ => {}
    }
    Ok(())
}

/// Returns `(amount, converted, from, to)`.
pub fn convert_amount(
    store: &SqliteRateStore,
    sub: &clap::ArgMatches,
) -> Result<(Decimal, Decimal, String, String)> {
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let from = parse_currency(sub.get_one::<String>("from").unwrap())?;
    let to = parse_currency(sub.get_one::<String>("to").unwrap())?;
    let base = currency_arg(sub, "base", &store.base_currency()?)?;

    let automatic = store.get_all_automatic(&base)?;
    let manual = store.get_all_manual(&base)?;
    let rates = effective_rates(&automatic, &manual);
    let res = convert(&base, &rates, amount, &from, &to)?;
    Ok((amount, res, from.to_string(), to.to_string()))
}
