//! Durable record store: ping-pong rotation over two log files, a separate
//! always-on error log, and the bounded in-memory pending set.
//!
//! Rotation trades unbounded retention for bounded storage: when the active
//! file crosses the size limit, the roles toggle and the newly active file
//! is truncated before anything else is written to it. The file that just
//! filled up stays frozen and retrievable until the roles toggle back.

use heapless::Vec;
use log::warn;

use super::observation::{Observation, RECORD_CAPACITY};
use super::ports::{StorageError, VolumePort};

/// The rotating append targets, in role order at first boot.
pub const LOG_FILES: [&str; 2] = ["jsonlog1.txt", "jsonlog2.txt"];

/// Free-text failure lines accumulate here; never rotated, never parsed.
pub const ERROR_LOG: &str = "log.err";

/// Bound on the in-memory undelivered set. On overflow the oldest entry is
/// abandoned to the error log.
pub const PENDING_CAPACITY: usize = 32;

/// Delivery bookkeeping for one undelivered observation. The observation
/// itself stays immutable; only this wrapper carries mutable state.
#[derive(Debug, Clone, Copy)]
pub struct PendingEntry {
    pub observation: Observation,
    pub attempts: u8,
    pub delivered: bool,
}

/// Result of a successful append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Appended {
    /// The append pushed the active file over its limit and the roles
    /// toggled.
    pub rotated: bool,
    pub bytes: usize,
}

pub struct RecordStore {
    active: usize,
    active_size: u64,
    limit: u64,
    /// A rotation was due but the truncate failed; it must complete before
    /// the next record is written.
    rotation_due: bool,
    pending: Vec<PendingEntry, PENDING_CAPACITY>,
}

impl RecordStore {
    /// Open against the volume, resuming on whichever file last held the
    /// active role (the larger one). An already-over-limit active file
    /// rotates immediately.
    pub fn open(
        vol: &mut impl VolumePort,
        rotation_limit_bytes: u64,
    ) -> Result<Self, StorageError> {
        let s0 = vol.size(LOG_FILES[0])?;
        let s1 = vol.size(LOG_FILES[1])?;
        let active = usize::from(s1 > s0);

        let mut store = Self {
            active,
            active_size: s0.max(s1),
            limit: rotation_limit_bytes,
            rotation_due: false,
            pending: Vec::new(),
        };
        if store.active_size > store.limit {
            store.try_rotate(vol)?;
        }
        Ok(store)
    }

    /// Name of the file currently receiving records.
    pub fn active_file(&self) -> &'static str {
        LOG_FILES[self.active]
    }

    // ── Durable records ───────────────────────────────────────

    /// Serialize and append one observation to the active file, rotating
    /// afterwards if the size limit was crossed.
    pub fn append(
        &mut self,
        vol: &mut impl VolumePort,
        obs: &Observation,
    ) -> Result<Appended, StorageError> {
        // A rotation that failed earlier must land before any further write.
        if self.rotation_due {
            self.try_rotate(vol)?;
        }

        let line = obs.to_record_line(RECORD_CAPACITY)?;
        vol.append(LOG_FILES[self.active], line.as_bytes())?;
        self.active_size += line.len() as u64;

        let mut rotated = false;
        if self.active_size > self.limit {
            match self.try_rotate(vol) {
                Ok(()) => rotated = true,
                Err(e) => {
                    // The record landed; the rotation retries next append.
                    self.rotation_due = true;
                    warn!("rotation deferred: {e}");
                }
            }
        }

        Ok(Appended {
            rotated,
            bytes: line.len(),
        })
    }

    fn try_rotate(&mut self, vol: &mut impl VolumePort) -> Result<(), StorageError> {
        let next = 1 - self.active;
        vol.truncate(LOG_FILES[next])?;
        self.active = next;
        self.active_size = 0;
        self.rotation_due = false;
        Ok(())
    }

    /// Append one timestamped free-text line to the error log. Best-effort:
    /// a failure here is only logged, never propagated.
    pub fn log_error(&mut self, vol: &mut impl VolumePort, timestamp: i64, msg: &str) {
        let line = format!("{timestamp} {msg}\n");
        if let Err(e) = vol.append(ERROR_LOG, line.as_bytes()) {
            warn!("error log append failed: {e}");
        }
    }

    // ── Pending set ───────────────────────────────────────────

    /// Enqueue a freshly created observation for delivery. When the set is
    /// full, delivered entries are pruned first; if none are prunable the
    /// oldest entry is abandoned to the error log.
    pub fn push_pending(&mut self, vol: &mut impl VolumePort, obs: Observation) {
        if self.pending.is_full() {
            self.pending.retain(|e| !e.delivered);
        }
        if self.pending.is_full() {
            let evicted = self.pending.remove(0);
            self.log_error(
                vol,
                obs.timestamp,
                &format!(
                    "pending set full, dropped observation ts={} after {} attempts",
                    evicted.observation.timestamp, evicted.attempts
                ),
            );
        }
        let _ = self.pending.push(PendingEntry {
            observation: obs,
            attempts: 0,
            delivered: false,
        });
    }

    /// The undelivered set, oldest first.
    pub fn pending(&self) -> &[PendingEntry] {
        &self.pending
    }

    /// Record one delivery attempt; returns the new attempt count.
    pub fn record_attempt(&mut self, timestamp: i64) -> u8 {
        for entry in &mut self.pending {
            if entry.observation.timestamp == timestamp {
                entry.attempts = entry.attempts.saturating_add(1);
                return entry.attempts;
            }
        }
        0
    }

    /// Flag an observation as acknowledged; it will never be re-submitted.
    pub fn mark_delivered(&mut self, timestamp: i64) {
        for entry in &mut self.pending {
            if entry.observation.timestamp == timestamp {
                entry.delivered = true;
            }
        }
    }

    /// Drop an observation from the pending set (attempt budget exhausted).
    /// It remains in the durable log.
    pub fn abandon(&mut self, timestamp: i64) -> Option<PendingEntry> {
        let idx = self
            .pending
            .iter()
            .position(|e| e.observation.timestamp == timestamp)?;
        Some(self.pending.remove(idx))
    }

    /// Prune delivered entries after a flush pass.
    pub fn compact(&mut self) {
        self.pending.retain(|e| !e.delivered);
    }
}
