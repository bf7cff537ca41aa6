// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::errors::{RatesError, Result as StoreResult};
use crate::models::{CurrencyCode, RateEntry, RateOrigin};
use crate::store::{RateStore, automatic_batch};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Ratebook", "ratebook"));

pub const DEFAULT_BASE_CURRENCY: &str = "USD";

pub fn db_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("ratebook.sqlite"))
}

/// Opens the database at `path`, or at the platform default location.
pub fn open_or_init(path: Option<&Path>) -> Result<Connection> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => db_path()?,
    };
    let mut conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&mut conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    -- 1 base = rate quote; one row per pair per origin
    CREATE TABLE IF NOT EXISTS rates(
        base TEXT NOT NULL,
        quote TEXT NOT NULL,
        origin TEXT NOT NULL CHECK(origin IN ('automatic','manual')),
        rate TEXT NOT NULL,
        updated_at TEXT NOT NULL DEFAULT (datetime('now')),
        PRIMARY KEY(base, quote, origin)
    );
    CREATE INDEX IF NOT EXISTS idx_rates_base_origin ON rates(base, origin);
    "#,
    )?;
    Ok(())
}

// Base currency settings
pub fn get_base_currency(conn: &Connection) -> Result<CurrencyCode> {
    let v: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key='base_currency'",
            [],
            |r| r.get(0),
        )
        .optional()?;
    let raw = v.unwrap_or_else(|| DEFAULT_BASE_CURRENCY.to_string());
    Ok(CurrencyCode::parse(&raw)
        .with_context(|| format!("Stored base currency '{}' is invalid", raw))?)
}

pub fn set_base_currency(conn: &Connection, ccy: &CurrencyCode) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES('base_currency', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![ccy.as_str()],
    )?;
    Ok(())
}

fn refreshed_key(base: &CurrencyCode) -> String {
    format!("automatic_refreshed_at:{}", base)
}

pub fn get_refreshed_at(conn: &Connection, base: &CurrencyCode) -> Result<Option<DateTime<Utc>>> {
    let v: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key=?1",
            params![refreshed_key(base)],
            |r| r.get(0),
        )
        .optional()?;
    match v {
        Some(s) => {
            let ts = DateTime::parse_from_rfc3339(&s)
                .with_context(|| format!("Invalid refresh timestamp '{}'", s))?;
            Ok(Some(ts.with_timezone(&Utc)))
        }
        None => Ok(None),
    }
}

pub fn set_refreshed_at(conn: &Connection, base: &CurrencyCode, at: DateTime<Utc>) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![refreshed_key(base), at.to_rfc3339()],
    )?;
    Ok(())
}

/// `RateStore` over a single SQLite connection.
pub struct SqliteRateStore {
    conn: Mutex<Connection>,
}

impl SqliteRateStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Locks the underlying connection for settings access.
    pub fn connection(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RatesError::StoreUnavailable(e.to_string()))
    }

    pub fn base_currency(&self) -> Result<CurrencyCode> {
        let conn = self.connection()?;
        get_base_currency(&conn)
    }

    pub fn set_base_currency(&self, ccy: &CurrencyCode) -> Result<()> {
        let conn = self.connection()?;
        set_base_currency(&conn, ccy)
    }

    pub fn refreshed_at(&self, base: &CurrencyCode) -> Result<Option<DateTime<Utc>>> {
        let conn = self.connection()?;
        get_refreshed_at(&conn, base)
    }

    pub fn mark_refreshed(&self, base: &CurrencyCode, at: DateTime<Utc>) -> Result<()> {
        let conn = self.connection()?;
        set_refreshed_at(&conn, base, at)
    }

    fn load(&self, base: &CurrencyCode, origin: RateOrigin) -> StoreResult<Vec<RateEntry>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare_cached(
            "SELECT quote, rate FROM rates WHERE base=?1 AND origin=?2 ORDER BY quote",
        )?;
        let rows = stmt.query_map(params![base.as_str(), origin.as_str()], |r| {
            Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (q, r) = row?;
            let quote = CurrencyCode::parse(&q).map_err(|_| {
                RatesError::StoreUnavailable(format!("corrupt quote currency '{}'", q))
            })?;
            let rate = r.parse::<Decimal>().map_err(|_| {
                RatesError::StoreUnavailable(format!("corrupt rate '{}' for {}/{}", r, base, q))
            })?;
            out.push(RateEntry {
                base_currency: base.clone(),
                quote_currency: quote,
                rate,
                origin,
            });
        }
        Ok(out)
    }
}

impl RateStore for SqliteRateStore {
    fn get_all_automatic(&self, base: &CurrencyCode) -> StoreResult<Vec<RateEntry>> {
        self.load(base, RateOrigin::Automatic)
    }

    fn get_all_manual(&self, base: &CurrencyCode) -> StoreResult<Vec<RateEntry>> {
        self.load(base, RateOrigin::Manual)
    }

    fn upsert_manual(&self, entry: &RateEntry) -> StoreResult<()> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO rates(base, quote, origin, rate) VALUES (?1, ?2, 'manual', ?3)
             ON CONFLICT(base, quote, origin) DO UPDATE SET rate=excluded.rate, updated_at=datetime('now')",
            params![
                entry.base_currency.as_str(),
                entry.quote_currency.as_str(),
                entry.rate.to_string()
            ],
        )?;
        log::debug!(
            "upserted manual rate {}/{} = {}",
            entry.base_currency,
            entry.quote_currency,
            entry.rate
        );
        Ok(())
    }

    fn remove_manual(&self, base: &CurrencyCode, quote: &CurrencyCode) -> StoreResult<()> {
        let conn = self.connection()?;
        let n = conn.execute(
            "DELETE FROM rates WHERE base=?1 AND quote=?2 AND origin='manual'",
            params![base.as_str(), quote.as_str()],
        )?;
        log::debug!("removed {} manual rate(s) for {}/{}", n, base, quote);
        Ok(())
    }

    fn replace_automatic(&self, base: &CurrencyCode, entries: &[RateEntry]) -> StoreResult<()> {
        let batch = automatic_batch(base, entries)?;
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM rates WHERE base=?1 AND origin='automatic'",
            params![base.as_str()],
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO rates(base, quote, origin, rate) VALUES (?1, ?2, 'automatic', ?3)
                 ON CONFLICT(base, quote, origin) DO UPDATE SET rate=excluded.rate",
            )?;
            for e in &batch {
                stmt.execute(params![
                    base.as_str(),
                    e.quote_currency.as_str(),
                    e.rate.to_string()
                ])?;
            }
        }
        tx.commit()?;
        log::info!("replaced automatic rates for {}: {} entries", base, batch.len());
        Ok(())
    }
}
