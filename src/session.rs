// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Per-session query service over a shared `RateStore`.
//!
//! A session owns its search text and base currency on a dedicated worker
//! thread. Commands from any thread are queued on one channel and applied
//! strictly in arrival order; callers block until their own command has been
//! applied and receive the recomputed `RatesState`.

use crate::errors::{RatesError, Result};
use crate::models::{CurrencyCode, RateEntry, RatesState, SessionStatus, validate_pair};
use crate::resolver::{filter_views, normalize_search, resolve};
use crate::store::RateStore;
use log::{debug, warn};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::thread::{self, JoinHandle};

#[derive(Debug)]
enum Command {
    Search(String),
    AddOverride {
        base: CurrencyCode,
        quote: CurrencyCode,
        rate: Decimal,
    },
    UpdateOverride {
        existing: RateEntry,
        rate: Decimal,
    },
    RemoveOverride(RateEntry),
    SetBase(CurrencyCode),
    Refresh,
}

struct Job {
    command: Command,
    reply: Sender<Result<RatesState>>,
}

struct Shared {
    closed: AtomicBool,
    status: Mutex<SessionStatus>,
    state: RwLock<RatesState>,
    subscribers: Mutex<Vec<Sender<RatesState>>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Shared {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn set_status(&self, next: SessionStatus) {
        let mut status = lock(&self.status);
        if *status != SessionStatus::Closed {
            *status = next;
        }
    }

    fn current(&self) -> RatesState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn publish(&self, state: &RatesState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = state.clone();
        lock(&self.subscribers).retain(|s| s.send(state.clone()).is_ok());
    }
}

struct Worker {
    store: Arc<dyn RateStore>,
    base: CurrencyCode,
    search: String,
    shared: Arc<Shared>,
    // Set when a store write landed but the follow-up read failed.
    stale: bool,
}

impl Worker {
    fn recompute(&self, base: &CurrencyCode, search: &str) -> Result<RatesState> {
        let automatic = self.store.get_all_automatic(base)?;
        let manual = self.store.get_all_manual(base)?;
        let (manual_view, automatic_view) = resolve(&automatic, &manual);
        let (manual, automatic) = filter_views(manual_view, automatic_view, search);
        Ok(RatesState {
            base_currency: base.clone(),
            manual,
            automatic,
        })
    }

    /// Re-reads after a committed write. A failed read does not undo the
    /// write, so the caller still gets `Ok` with the last published state and
    /// the session is marked stale until a later read succeeds.
    fn after_write(&mut self) -> RatesState {
        match self.recompute(&self.base, &self.search) {
            Ok(state) => {
                self.stale = false;
                state
            }
            Err(e) => {
                warn!("write applied but re-read failed for {}: {}", self.base, e);
                self.stale = true;
                self.shared.current()
            }
        }
    }

    fn apply(&mut self, command: Command) -> Result<RatesState> {
        match command {
            Command::Search(text) => {
                let search = normalize_search(&text);
                let state = self.recompute(&self.base, &search)?;
                self.search = search;
                self.stale = false;
                Ok(state)
            }
            Command::SetBase(base) => {
                let state = self.recompute(&base, &self.search)?;
                self.base = base;
                self.stale = false;
                Ok(state)
            }
            Command::AddOverride { base, quote, rate } => {
                let entry = RateEntry::manual(base, quote, rate);
                self.store.upsert_manual(&entry)?;
                Ok(self.after_write())
            }
            Command::UpdateOverride { existing, rate } => {
                let entry =
                    RateEntry::manual(existing.base_currency, existing.quote_currency, rate);
                self.store.upsert_manual(&entry)?;
                Ok(self.after_write())
            }
            Command::RemoveOverride(entry) => {
                self.store
                    .remove_manual(&entry.base_currency, &entry.quote_currency)?;
                Ok(self.after_write())
            }
            Command::Refresh => {
                let state = self.recompute(&self.base, &self.search)?;
                self.stale = false;
                Ok(state)
            }
        }
    }

    fn run(mut self, rx: Receiver<Job>) {
        for job in rx {
            if self.shared.is_closed() {
                debug!("discarding queued {:?}", job.command);
                let _ = job.reply.send(Err(RatesError::SessionClosed));
                continue;
            }
            self.shared.set_status(SessionStatus::Mutating);
            let mut res = self.apply(job.command);
            if self.shared.is_closed() {
                // Already dispatched to the store; only the result is dropped.
                res = Err(RatesError::SessionClosed);
            } else {
                match &res {
                    Ok(_) if self.stale => {}
                    Ok(state) => self.shared.publish(state),
                    Err(e) => warn!("rates command failed for {}: {}", self.base, e),
                }
            }
            self.shared.set_status(SessionStatus::Idle);
            let _ = job.reply.send(res);
        }
        debug!("rates session worker for {} stopped", self.base);
    }
}

/// Query service session. See the module docs for ordering guarantees.
pub struct RatesSession {
    sender: Mutex<Option<Sender<Job>>>,
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl RatesSession {
    /// Resolves the initial state for `base` and starts the session worker.
    pub fn open(store: Arc<dyn RateStore>, base: CurrencyCode) -> Result<Self> {
        let shared = Arc::new(Shared {
            closed: AtomicBool::new(false),
            status: Mutex::new(SessionStatus::Idle),
            state: RwLock::new(RatesState::empty(base.clone())),
            subscribers: Mutex::new(Vec::new()),
        });
        let worker = Worker {
            store,
            base,
            search: String::new(),
            shared: Arc::clone(&shared),
            stale: false,
        };
        let initial = worker.recompute(&worker.base, &worker.search)?;
        shared.publish(&initial);

        let (tx, rx) = mpsc::channel();
        let handle = thread::spawn(move || worker.run(rx));
        debug!("opened rates session for {}", initial.base_currency);

        Ok(RatesSession {
            sender: Mutex::new(Some(tx)),
            shared,
            worker: Mutex::new(Some(handle)),
        })
    }

    fn dispatch(&self, command: Command) -> Result<RatesState> {
        if self.shared.is_closed() {
            return Err(RatesError::SessionClosed);
        }
        let sender = lock(&self.sender)
            .as_ref()
            .cloned()
            .ok_or(RatesError::SessionClosed)?;
        let (reply, rx) = mpsc::channel();
        sender
            .send(Job { command, reply })
            .map_err(|_| RatesError::SessionClosed)?;
        drop(sender);
        rx.recv().unwrap_or(Err(RatesError::SessionClosed))
    }

    fn ensure_open(&self) -> Result<()> {
        if self.shared.is_closed() {
            Err(RatesError::SessionClosed)
        } else {
            Ok(())
        }
    }

    /// Replaces the search text; empty text matches everything.
    pub fn search(&self, text: &str) -> Result<RatesState> {
        self.dispatch(Command::Search(text.to_string()))
    }

    pub fn add_override(
        &self,
        base: &CurrencyCode,
        quote: &CurrencyCode,
        rate: Decimal,
    ) -> Result<RatesState> {
        self.ensure_open()?;
        validate_pair(base, quote, rate)?;
        self.dispatch(Command::AddOverride {
            base: base.clone(),
            quote: quote.clone(),
            rate,
        })
    }

    /// Upserts `new_rate` for the pair of `existing`, whatever its origin.
    /// Creates the override again if it was removed in the meantime.
    pub fn update_override(&self, existing: &RateEntry, new_rate: Decimal) -> Result<RatesState> {
        self.ensure_open()?;
        validate_pair(&existing.base_currency, &existing.quote_currency, new_rate)?;
        self.dispatch(Command::UpdateOverride {
            existing: existing.clone(),
            rate: new_rate,
        })
    }

    /// Removing an override that is already gone succeeds.
    pub fn remove_override(&self, entry: &RateEntry) -> Result<RatesState> {
        self.dispatch(Command::RemoveOverride(entry.clone()))
    }

    pub fn set_base_currency(&self, base: &CurrencyCode) -> Result<RatesState> {
        self.dispatch(Command::SetBase(base.clone()))
    }

    /// Re-reads the store, e.g. after an external automatic refresh.
    pub fn refresh(&self) -> Result<RatesState> {
        self.dispatch(Command::Refresh)
    }

    /// Last successfully resolved state.
    pub fn state(&self) -> RatesState {
        self.shared.current()
    }

    pub fn status(&self) -> SessionStatus {
        *lock(&self.shared.status)
    }

    /// Receives every snapshot published after this call.
    pub fn subscribe(&self) -> Receiver<RatesState> {
        let (tx, rx) = mpsc::channel();
        if !self.shared.is_closed() {
            lock(&self.shared.subscribers).push(tx);
        }
        rx
    }

    /// Ends the session. Queued commands fail with `SessionClosed` without
    /// touching the store. Safe to call more than once.
    pub fn close(&self) {
        if self.shared.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        *lock(&self.shared.status) = SessionStatus::Closed;
        lock(&self.sender).take();
        lock(&self.shared.subscribers).clear();
        let handle = lock(&self.worker).take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                log::error!("rates session worker panicked");
            }
        }
        debug!("closed rates session");
    }
}

impl Drop for RatesSession {
    fn drop(&mut self) {
        self.close();
    }
}
