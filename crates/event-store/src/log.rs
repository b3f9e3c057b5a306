//! The ordered, append-only event log itself.
//!
//! One [`EventLog`] instance per event kind per chain, each maintaining its
//! own ascending `(block, txIndex, logIndex)` order and its own dedup rule —
//! deposits tolerate duplicates, fills and slow-fill requests don't.

use bridge_types::EventCoordinates;
use tracing::warn;

/// Things an event-store entry must expose to be ordered and deduplicated.
pub trait StoredEvent: Clone + PartialEq {
    fn coordinates(&self) -> &EventCoordinates;
}

/// What happens when a second event arrives for the same dedup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupPolicy {
    /// Multiple entries under the same key are legal (deposits: duplicate
    /// deposits are recorded, not rejected).
    AllowDuplicates,
    /// A second arrival for an existing key is an error condition, logged
    /// and rejected (fills, slow-fill requests).
    RejectSecondArrival,
}

/// Outcome of [`EventLog::append`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Inserted,
    /// Exact duplicate `(coordinates, payload)` — a silent no-op.
    ExactDuplicateIgnored,
    /// A second arrival under `RejectSecondArrival` policy for a key that
    /// already has an entry. The caller decides whether this is fatal.
    Rejected,
}

/// A per-chain, per-kind, ascending-ordered append-only log.
///
/// `query` never exposes an event past `search_end_block` — the store is
/// always truncated to what has actually been searched.
#[derive(Debug, Clone, Default)]
pub struct EventLog<T: StoredEvent> {
    events: Vec<T>,
    search_end_block: u64,
}

impl<T: StoredEvent> EventLog<T> {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            search_end_block: 0,
        }
    }

    /// Insert `event`, preserving ascending order. Out-of-order input (e.g.
    /// an upstream transport that returned logs unsorted) is accepted and
    /// placed at the correct position rather than rejected.
    pub fn append(&mut self, event: T) -> AppendOutcome {
        let pos = self
            .events
            .partition_point(|e| e.coordinates() < event.coordinates());

        if let Some(existing) = self.events.get(pos) {
            if existing.coordinates() == event.coordinates() {
                if *existing == event {
                    return AppendOutcome::ExactDuplicateIgnored;
                }
                // Same coordinates, different payload: the upstream
                // transport returned a corrected copy of a log we somehow
                // already ingested. Treat it like an exact duplicate of
                // position (the coordinates are the source of truth) but
                // replace the payload.
                self.events[pos] = event;
                return AppendOutcome::Inserted;
            }
        }

        self.events.insert(pos, event);
        AppendOutcome::Inserted
    }

    /// Append under a dedup policy keyed by an externally-computed key
    /// (typically a `RelayDataHash`). Returns whether the insert was
    /// accepted.
    pub fn append_keyed<K: PartialEq>(
        &mut self,
        event: T,
        key: K,
        existing_keys: &[K],
        policy: DedupPolicy,
    ) -> AppendOutcome {
        let key_exists = existing_keys.iter().any(|k| *k == key);
        if key_exists && policy == DedupPolicy::RejectSecondArrival {
            warn!("rejecting second arrival for an event that must be unique per key");
            return AppendOutcome::Rejected;
        }
        self.append(event)
    }

    pub fn set_search_end_block(&mut self, block: u64) {
        self.search_end_block = block;
    }

    pub fn search_end_block(&self) -> u64 {
        self.search_end_block
    }

    /// Ascending slice of events with `from_block <= block <= to_block`,
    /// never including anything past `search_end_block`.
    pub fn query(&self, from_block: u64, to_block: u64) -> Vec<&T> {
        let effective_to = to_block.min(self.search_end_block);
        self.events
            .iter()
            .filter(|e| {
                let b = e.coordinates().block;
                b >= from_block && b <= effective_to
            })
            .collect()
    }

    pub fn all(&self) -> &[T] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
