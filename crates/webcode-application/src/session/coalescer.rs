//! Debounced save coalescer.
//!
//! Pending saves are keyed by (owner, session id). Every request resets one
//! shared timer; when it fires, every pending entry is taken under the lock
//! and written outside it. Requests arriving during the write start a new
//! pending batch with its own timer.
//!
//! Writes of one key are serialized by a per-key async lock. Each request
//! carries a ticket, and a write only runs if its ticket is still the latest
//! for the key once the lock is held. [`SaveCoalescer::supersede`] issues a
//! fresh ticket, so a batch that was already taken can no longer land after
//! an immediate save or a delete.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tokio_util::task::TaskTracker;
use webcode_core::error::{Result, WebCodeError};
use webcode_core::owner::Owner;
use webcode_core::session::Session;

/// Destination of coalesced writes.
#[async_trait]
pub trait SaveTarget: Send + Sync {
    async fn write(&self, owner: &Owner, session: &Session) -> Result<()>;
}

type PendingKey = (Owner, String);

struct PendingSave {
    session: Session,
    ticket: u64,
}

struct KeyState {
    latest_ticket: u64,
    write_lock: Arc<AsyncMutex<()>>,
}

/// A pending save taken by a flush, together with the lock of its key.
struct TakenSave {
    key: PendingKey,
    session: Session,
    ticket: u64,
    write_lock: Arc<AsyncMutex<()>>,
}

#[derive(Default)]
struct PendingSaves {
    entries: HashMap<PendingKey, PendingSave>,
    keys: HashMap<PendingKey, KeyState>,
    /// Bumped on every request; a timer only flushes if it is still current.
    generation: u64,
    next_ticket: u64,
    shut_down: bool,
}

impl PendingSaves {
    fn issue_ticket(&mut self, key: &PendingKey) -> (u64, Arc<AsyncMutex<()>>) {
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        let state = self.keys.entry(key.clone()).or_insert_with(|| KeyState {
            latest_ticket: 0,
            write_lock: Arc::new(AsyncMutex::new(())),
        });
        state.latest_ticket = ticket;
        (ticket, Arc::clone(&state.write_lock))
    }

    fn is_current(&self, key: &PendingKey, ticket: u64) -> bool {
        self.keys
            .get(key)
            .is_some_and(|state| state.latest_ticket == ticket)
    }

    fn take_all(&mut self) -> Vec<TakenSave> {
        let entries = std::mem::take(&mut self.entries);
        entries
            .into_iter()
            .filter_map(|(key, pending)| {
                let write_lock = Arc::clone(&self.keys.get(&key)?.write_lock);
                Some(TakenSave {
                    key,
                    session: pending.session,
                    ticket: pending.ticket,
                    write_lock,
                })
            })
            .collect()
    }
}

/// Holds the write lock of one session key.
///
/// While it is alive no coalesced write of that key can run, and writes taken
/// before it was issued are discarded.
pub struct KeyWriteGuard {
    /// Whether a not-yet-flushed save was dropped.
    pub dropped_pending: bool,
    _guard: OwnedMutexGuard<()>,
}

pub struct SaveCoalescer {
    pending: Arc<Mutex<PendingSaves>>,
    target: Arc<dyn SaveTarget>,
    quantum: Duration,
    in_flight: TaskTracker,
    written: Arc<AtomicUsize>,
}

impl SaveCoalescer {
    pub fn new(target: Arc<dyn SaveTarget>, quantum: Duration) -> Self {
        Self {
            pending: Arc::new(Mutex::new(PendingSaves::default())),
            target,
            quantum,
            in_flight: TaskTracker::new(),
            written: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn lock(pending: &Mutex<PendingSaves>) -> MutexGuard<'_, PendingSaves> {
        pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Registers `session` as pending and restarts the timer.
    ///
    /// Returns without waiting for I/O. Must be called within a tokio runtime.
    ///
    /// # Errors
    ///
    /// `Internal` after [`shutdown`](Self::shutdown) or outside a runtime.
    pub fn request(&self, owner: &Owner, session: Session) -> Result<()> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| WebCodeError::internal(format!("no async runtime: {e}")))?;

        let generation = {
            let mut pending = Self::lock(&self.pending);
            if pending.shut_down {
                return Err(WebCodeError::internal("coalescer is shut down"));
            }
            let key = (owner.clone(), session.session_id.clone());
            let (ticket, _) = pending.issue_ticket(&key);
            pending.entries.insert(key, PendingSave { session, ticket });
            pending.generation += 1;
            pending.generation
        };

        let pending = Arc::clone(&self.pending);
        let target = Arc::clone(&self.target);
        let written = Arc::clone(&self.written);
        let in_flight = self.in_flight.clone();
        let quantum = self.quantum;
        runtime.spawn(async move {
            tokio::time::sleep(quantum).await;
            let flush = {
                let mut guard = Self::lock(&pending);
                if guard.generation != generation || guard.shut_down {
                    return;
                }
                let batch = guard.take_all();
                // Registered under the lock so shutdown cannot miss it.
                in_flight.track_future(flush_batch(Arc::clone(&pending), target, written, batch))
            };
            flush.await;
        });

        Ok(())
    }

    /// Drops the pending save of a session and waits for the key's write lock.
    ///
    /// Used before an immediate save or a delete: a coalesced write that is
    /// already running finishes first, and one that was taken but not started
    /// is discarded. Hold the returned guard until the caller's own write is
    /// done.
    ///
    /// # Arguments
    ///
    /// * `owner` - Owner of the session
    /// * `session_id` - Session whose pending state becomes stale
    pub async fn supersede(&self, owner: &Owner, session_id: &str) -> KeyWriteGuard {
        let key = (owner.clone(), session_id.to_string());
        let (dropped_pending, write_lock) = {
            let mut pending = Self::lock(&self.pending);
            let dropped = pending.entries.remove(&key).is_some();
            let (_, write_lock) = pending.issue_ticket(&key);
            (dropped, write_lock)
        };
        KeyWriteGuard {
            dropped_pending,
            _guard: write_lock.lock_owned().await,
        }
    }

    /// The not-yet-flushed state of one session, if any.
    pub fn pending(&self, owner: &Owner, session_id: &str) -> Option<Session> {
        Self::lock(&self.pending)
            .entries
            .get(&(owner.clone(), session_id.to_string()))
            .map(|p| p.session.clone())
    }

    /// Every not-yet-flushed session of `owner`.
    pub fn pending_for(&self, owner: &Owner) -> Vec<Session> {
        Self::lock(&self.pending)
            .entries
            .iter()
            .filter(|((o, _), _)| o == owner)
            .map(|(_, p)| p.session.clone())
            .collect()
    }

    /// Number of saves waiting for the timer.
    pub fn pending_count(&self) -> usize {
        Self::lock(&self.pending).entries.len()
    }

    /// Writes every pending entry and waits for writes already in flight,
    /// all within `timeout`.
    ///
    /// Later requests are rejected.
    ///
    /// # Returns
    ///
    /// The number of successful writes that completed during the call.
    ///
    /// # Errors
    ///
    /// `Internal` if the flush did not finish within `timeout`.
    pub async fn shutdown(&self, timeout: Duration) -> Result<usize> {
        let written_before = self.written.load(Ordering::SeqCst);
        let flush = {
            let mut pending = Self::lock(&self.pending);
            pending.shut_down = true;
            let batch = pending.take_all();
            if !batch.is_empty() {
                tracing::info!("[SaveCoalescer] Flushing {} pending saves", batch.len());
            }
            self.in_flight.track_future(flush_batch(
                Arc::clone(&self.pending),
                Arc::clone(&self.target),
                Arc::clone(&self.written),
                batch,
            ))
        };
        self.in_flight.close();
        if self.in_flight.len() > 1 {
            tracing::info!(
                "[SaveCoalescer] Waiting for {} in-flight flushes",
                self.in_flight.len() - 1
            );
        }

        tokio::time::timeout(timeout, async {
            flush.await;
            self.in_flight.wait().await;
        })
        .await
        .map_err(|_| {
            WebCodeError::internal(format!(
                "pending saves not flushed within {} ms",
                timeout.as_millis()
            ))
        })?;

        Ok(self
            .written
            .load(Ordering::SeqCst)
            .saturating_sub(written_before))
    }
}

/// Writes each entry; failures are logged and dropped.
async fn flush_batch(
    pending: Arc<Mutex<PendingSaves>>,
    target: Arc<dyn SaveTarget>,
    written: Arc<AtomicUsize>,
    batch: Vec<TakenSave>,
) -> usize {
    let writes = batch.into_iter().map(|taken| {
        let pending = Arc::clone(&pending);
        let target = Arc::clone(&target);
        let written = Arc::clone(&written);
        async move {
            let _guard = taken.write_lock.lock().await;
            let (owner, session_id) = &taken.key;
            let current = SaveCoalescer::lock(&pending).is_current(&taken.key, taken.ticket);
            if !current {
                tracing::debug!(
                    "[SaveCoalescer] Skipped superseded save of session {} for {}",
                    session_id,
                    owner
                );
                return false;
            }
            match target.write(owner, &taken.session).await {
                Ok(()) => {
                    written.fetch_add(1, Ordering::SeqCst);
                    tracing::debug!(
                        "[SaveCoalescer] Flushed session {} for {} ({} messages)",
                        session_id,
                        owner,
                        taken.session.messages.len()
                    );
                    true
                }
                Err(e) => {
                    tracing::error!(
                        "[SaveCoalescer] Debounced save of session {} for {} failed: {}",
                        session_id,
                        owner,
                        e
                    );
                    false
                }
            }
        }
    });
    futures::future::join_all(writes)
        .await
        .into_iter()
        .filter(|ok| *ok)
        .count()
}
