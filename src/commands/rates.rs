// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::db::SqliteRateStore;
use crate::models::{CurrencyCode, RatesState};
use crate::session::RatesSession;
use crate::store::RateStore;
use crate::utils::{
    currency_arg, maybe_print_json, parse_currency, parse_decimal, pretty_table, rate_rows,
};
use anyhow::{Result, anyhow};
use rust_decimal::Decimal;
use std::sync::Arc;

pub fn handle(store: &Arc<SqliteRateStore>, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("list", sub)) => list(store, sub)?,
        Some(("add", sub)) => add(store, sub)?,
        Some(("update", sub)) => update(store, sub)?,
        Some(("rm", sub)) => remove(store, sub)?,
        _ => {}
    }
    Ok(())
}

fn open_session(store: &Arc<SqliteRateStore>, sub: &clap::ArgMatches) -> Result<RatesSession> {
    let base = currency_arg(sub, "base", &store.base_currency()?)?;
    let shared: Arc<dyn RateStore> = store.clone();
    Ok(RatesSession::open(shared, base)?)
}

/// Resolved, search-filtered state for `rates list`.
pub fn query_state(store: &Arc<SqliteRateStore>, sub: &clap::ArgMatches) -> Result<RatesState> {
    let session = open_session(store, sub)?;
    let state = match sub.get_one::<String>("search") {
        Some(text) => session.search(text)?,
        None => session.state(),
    };
    session.close();
    Ok(state)
}

fn list(store: &Arc<SqliteRateStore>, sub: &clap::ArgMatches) -> Result<()> {
    let state = query_state(store, sub)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &state)? {
        return Ok(());
    }
    let headers = ["Base", "Quote", "Rate"];
    println!("Manual");
    println!("{}", pretty_table(&headers, rate_rows(&state.manual)));
    println!("Automatic");
    println!("{}", pretty_table(&headers, rate_rows(&state.automatic)));
    if let Some(at) = store.refreshed_at(&state.base_currency)? {
        println!("Automatic rates refreshed at {}", at.format("%Y-%m-%d %H:%M UTC"));
    }
    Ok(())
}

fn pair_and_rate(sub: &clap::ArgMatches) -> Result<(CurrencyCode, Decimal)> {
    let quote = parse_currency(sub.get_one::<String>("quote").unwrap())?;
    let rate = parse_decimal(sub.get_one::<String>("rate").unwrap())?;
    Ok((quote, rate))
}

fn add(store: &Arc<SqliteRateStore>, sub: &clap::ArgMatches) -> Result<()> {
    let (quote, rate) = pair_and_rate(sub)?;
    let session = open_session(store, sub)?;
    let base = session.state().base_currency;
    session.add_override(&base, &quote, rate)?;
    println!("Override set: 1 {} = {} {}", base, rate, quote);
    Ok(())
}

fn update(store: &Arc<SqliteRateStore>, sub: &clap::ArgMatches) -> Result<()> {
    let (quote, rate) = pair_and_rate(sub)?;
    let session = open_session(store, sub)?;
    let state = session.state();
    let existing = state
        .find(&quote)
        .cloned()
        .ok_or_else(|| anyhow!("No rate for {}/{} to update", state.base_currency, quote))?;
    session.update_override(&existing, rate)?;
    println!(
        "Override updated: 1 {} = {} {} (was {})",
        existing.base_currency, rate, quote, existing.rate
    );
    Ok(())
}

fn remove(store: &Arc<SqliteRateStore>, sub: &clap::ArgMatches) -> Result<()> {
    let quote = parse_currency(sub.get_one::<String>("quote").unwrap())?;
    let session = open_session(store, sub)?;
    let state = session.state();
    let Some(existing) = state
        .manual
        .iter()
        .find(|e| e.quote_currency == quote)
        .cloned()
    else {
        println!(
            "No override for {}/{}; nothing to remove",
            state.base_currency, quote
        );
        return Ok(());
    };
    let after = session.remove_override(&existing)?;
    match after.find(&quote) {
        Some(auto) => println!(
            "Removed override for {}/{}; automatic rate {} applies",
            state.base_currency, quote, auto.rate
        ),
        None => println!("Removed override for {}/{}", state.base_currency, quote),
    }
    Ok(())
}
