// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use ratebook::db::{self, SqliteRateStore};
use ratebook::errors::RatesError;
use ratebook::models::{CurrencyCode, RateEntry};
use ratebook::store::RateStore;
use ratebook::{cli, commands::rates};
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::sync::Arc;

fn ccy(s: &str) -> CurrencyCode {
    CurrencyCode::parse(s).unwrap()
}

fn setup() -> Arc<SqliteRateStore> {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    conn.execute(
        "INSERT INTO settings(key,value) VALUES('base_currency','BGN')",
        [],
    )
    .unwrap();
    conn.execute_batch(
        r#"
        INSERT INTO rates(base, quote, origin, rate) VALUES ('BGN','USD','automatic','1.80');
        INSERT INTO rates(base, quote, origin, rate) VALUES ('BGN','EUR','automatic','1.95');
        "#,
    )
    .unwrap();
    Arc::new(SqliteRateStore::new(conn))
}

fn run(store: &Arc<SqliteRateStore>, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["ratebook", "rates"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    if let Some(("rates", rates_m)) = matches.subcommand() {
        rates::handle(store, rates_m)
    } else {
        panic!("rates command not parsed");
    }
}

fn list_state(store: &Arc<SqliteRateStore>, args: &[&str]) -> ratebook::models::RatesState {
    let mut argv = vec!["ratebook", "rates", "list"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    let rates_m = matches.subcommand_matches("rates").unwrap();
    let list_m = rates_m.subcommand_matches("list").unwrap();
    rates::query_state(store, list_m).unwrap()
}

#[test]
fn add_trims_and_uppercases_inputs() {
    let store = setup();
    run(&store, &["add", "--quote", " usd ", "--rate", " 1.85 "]).unwrap();

    let manual = store.get_all_manual(&ccy("BGN")).unwrap();
    assert_eq!(
        manual,
        vec![RateEntry::manual(
            ccy("BGN"),
            ccy("USD"),
            Decimal::new(185, 2)
        )]
    );
}

#[test]
fn add_rejects_invalid_rate_and_same_pair() {
    let store = setup();
    let err = run(&store, &["add", "--quote", "USD", "--rate", "0"]).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<RatesError>(),
        Some(RatesError::InvalidRate(_))
    ));

    let err = run(&store, &["add", "--quote", "BGN", "--rate", "1.0"]).unwrap_err();
    assert!(err.to_string().contains("Base and quote currency are both BGN"));

    let err = run(&store, &["add", "--quote", "US", "--rate", "1.0"]).unwrap_err();
    assert!(err.to_string().contains("Invalid currency code"));
    assert!(store.get_all_manual(&ccy("BGN")).unwrap().is_empty());
}

#[test]
fn update_and_remove_round_trip() {
    let store = setup();
    run(&store, &["update", "--quote", "EUR", "--rate", "1.96"]).unwrap();

    let state = list_state(&store, &[]);
    assert_eq!(state.manual.len(), 1);
    assert_eq!(state.manual[0].quote_currency, ccy("EUR"));
    assert_eq!(state.manual[0].rate, Decimal::new(196, 2));
    assert_eq!(state.automatic.len(), 1);

    run(&store, &["rm", "--quote", "eur"]).unwrap();
    let state = list_state(&store, &[]);
    assert!(state.manual.is_empty());
    assert_eq!(state.automatic.len(), 2);

    // removing again is a no-op
    run(&store, &["rm", "--quote", "EUR"]).unwrap();
}

#[test]
fn remove_without_override_leaves_rates_alone() {
    let store = setup();
    run(&store, &["add", "--quote", "GBP", "--rate", "2.25"]).unwrap();
    let before = list_state(&store, &[]);

    run(&store, &["rm", "--quote", "usd"]).unwrap();
    run(&store, &["rm", "--quote", "JPY"]).unwrap();
    assert_eq!(list_state(&store, &[]), before);
    assert_eq!(store.get_all_manual(&ccy("BGN")).unwrap().len(), 1);
}

#[test]
fn update_unknown_quote_fails() {
    let store = setup();
    let err = run(&store, &["update", "--quote", "JPY", "--rate", "80"]).unwrap_err();
    assert!(err.to_string().contains("No rate for BGN/JPY"));
}

#[test]
fn list_applies_search_and_base_override() {
    let store = setup();
    run(&store, &["add", "--quote", "GBP", "--rate", "2.25"]).unwrap();

    let state = list_state(&store, &["--search", "eu"]);
    assert!(state.manual.is_empty());
    assert_eq!(state.automatic.len(), 1);
    assert_eq!(state.automatic[0].quote_currency, ccy("EUR"));

    let state = list_state(&store, &["--base", "usd"]);
    assert_eq!(state.base_currency, ccy("USD"));
    assert!(state.manual.is_empty());
    assert!(state.automatic.is_empty());
}

#[test]
fn list_json_snapshot_is_camel_case() {
    let store = setup();
    let state = list_state(&store, &["--search", "usd"]);
    let v = serde_json::to_value(&state).unwrap();
    assert_eq!(v["baseCurrency"], "BGN");
    assert_eq!(v["automatic"][0]["quoteCurrency"], "USD");
    assert_eq!(v["automatic"][0]["origin"], "automatic");
    assert_eq!(v["automatic"][0]["rate"], "1.80");
}
