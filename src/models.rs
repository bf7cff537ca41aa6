// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::errors::{RatesError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

static CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{3}$").unwrap());

/// Three-letter currency code, stored uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn parse(s: &str) -> Result<Self> {
        let code = s.trim().to_uppercase();
        if CODE_RE.is_match(&code) {
            Ok(CurrencyCode(code))
        } else {
            Err(RatesError::InvalidCurrencyCode(s.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CurrencyCode {
    type Err = RatesError;

    fn from_str(s: &str) -> Result<Self> {
        CurrencyCode::parse(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = RatesError;

    fn try_from(s: String) -> Result<Self> {
        CurrencyCode::parse(&s)
    }
}

impl From<CurrencyCode> for String {
    fn from(c: CurrencyCode) -> Self {
        c.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateOrigin {
    Automatic,
    Manual,
}

impl RateOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateOrigin::Automatic => "automatic",
            RateOrigin::Manual => "manual",
        }
    }
}

/// 1 unit of `base_currency` buys `rate` units of `quote_currency`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateEntry {
    pub base_currency: CurrencyCode,
    pub quote_currency: CurrencyCode,
    pub rate: Decimal,
    pub origin: RateOrigin,
}

impl RateEntry {
    pub fn automatic(base: CurrencyCode, quote: CurrencyCode, rate: Decimal) -> Self {
        RateEntry {
            base_currency: base,
            quote_currency: quote,
            rate,
            origin: RateOrigin::Automatic,
        }
    }

    pub fn manual(base: CurrencyCode, quote: CurrencyCode, rate: Decimal) -> Self {
        RateEntry {
            base_currency: base,
            quote_currency: quote,
            rate,
            origin: RateOrigin::Manual,
        }
    }
}

/// Rejects non-positive rates and same-currency pairs.
pub fn validate_pair(base: &CurrencyCode, quote: &CurrencyCode, rate: Decimal) -> Result<()> {
    if rate <= Decimal::ZERO {
        return Err(RatesError::InvalidRate(rate.to_string()));
    }
    if base == quote {
        return Err(RatesError::SameCurrencyPair(base.to_string()));
    }
    Ok(())
}

/// Snapshot handed to the presentation layer after every recomputation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatesState {
    pub base_currency: CurrencyCode,
    pub manual: Vec<RateEntry>,
    pub automatic: Vec<RateEntry>,
}

impl RatesState {
    pub fn empty(base: CurrencyCode) -> Self {
        RatesState {
            base_currency: base,
            manual: Vec::new(),
            automatic: Vec::new(),
        }
    }

    /// Visible entry for `quote`, manual first.
    pub fn find(&self, quote: &CurrencyCode) -> Option<&RateEntry> {
        self.manual
            .iter()
            .chain(self.automatic.iter())
            .find(|e| &e.quote_currency == quote)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Idle,
    Mutating,
    Closed,
}
