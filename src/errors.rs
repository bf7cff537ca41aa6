// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RatesError>;

/// Errors surfaced by the rate engine.
///
/// Validation failures are raised before the store is touched. Storage
/// failures are reported verbatim as `StoreUnavailable` and never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RatesError {
    #[error("Invalid rate '{0}': rate must be greater than zero")]
    InvalidRate(String),

    #[error("Base and quote currency are both {0}")]
    SameCurrencyPair(String),

    #[error("Invalid currency code '{0}', expected three letters")]
    InvalidCurrencyCode(String),

    #[error("No rate available for {0}")]
    RateNotFound(String),

    #[error("Converting {0} overflows the decimal range")]
    ConversionOverflow(String),

    #[error("Rate store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Session is closed")]
    SessionClosed,
}

impl From<rusqlite::Error> for RatesError {
    fn from(err: rusqlite::Error) -> Self {
        RatesError::StoreUnavailable(err.to_string())
    }
}
