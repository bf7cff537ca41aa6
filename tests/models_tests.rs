// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use ratebook::errors::RatesError;
use ratebook::models::{CurrencyCode, RateEntry, RateOrigin, validate_pair};
use rust_decimal::Decimal;

#[test]
fn currency_codes_normalize_to_uppercase() {
    let code = CurrencyCode::parse(" bgn ").unwrap();
    assert_eq!(code.as_str(), "BGN");
    assert_eq!(code, "Bgn".parse::<CurrencyCode>().unwrap());

    for bad in ["", "US", "USDT", "U$D", "12A"] {
        assert_eq!(
            CurrencyCode::parse(bad),
            Err(RatesError::InvalidCurrencyCode(bad.to_string()))
        );
    }
}

#[test]
fn rate_entry_json_rejects_bad_codes() {
    let entry: RateEntry = serde_json::from_str(
        r#"{"baseCurrency":"bgn","quoteCurrency":"USD","rate":"1.85","origin":"manual"}"#,
    )
    .unwrap();
    assert_eq!(entry.base_currency.as_str(), "BGN");
    assert_eq!(entry.origin, RateOrigin::Manual);
    assert_eq!(entry.rate, Decimal::new(185, 2));

    let bad = serde_json::from_str::<RateEntry>(
        r#"{"baseCurrency":"BG","quoteCurrency":"USD","rate":"1.85","origin":"manual"}"#,
    );
    assert!(bad.is_err());
}

#[test]
fn validate_pair_checks_rate_then_pair() {
    let bgn = CurrencyCode::parse("BGN").unwrap();
    let usd = CurrencyCode::parse("USD").unwrap();
    assert!(validate_pair(&bgn, &usd, Decimal::new(1, 6)).is_ok());
    assert_eq!(
        validate_pair(&bgn, &usd, Decimal::new(-5, 1)),
        Err(RatesError::InvalidRate("-0.5".to_string()))
    );
    assert_eq!(
        validate_pair(&bgn, &bgn, Decimal::ONE),
        Err(RatesError::SameCurrencyPair("BGN".to_string()))
    );
}
