// ============================================================================
// View Model Store
// ============================================================================
//
// Holds the current `ViewState` snapshot. Fetches are bracketed by tickets:
// a ticket carries a per-source sequence number, and only a ticket newer
// than the last one applied for that source may replace the data. Guarded
// tickets additionally hold the source's in-flight flag until dropped.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::debug;

use crate::models::MapRegion;
use crate::state::{Source, ViewState};

pub struct ViewStore {
    inner: Mutex<Inner>,
    trackers: BTreeMap<Source, SourceTracker>,
}

struct Inner {
    state: Arc<ViewState>,
    applied: BTreeMap<Source, u64>,
}

#[derive(Default)]
struct SourceTracker {
    in_flight: Arc<AtomicBool>,
    next_seq: AtomicU64,
}

/// Permission to publish one fetch result.
#[derive(Debug)]
pub struct FetchTicket {
    source: Source,
    seq: u64,
    _guard: Option<InFlightGuard>,
}

impl FetchTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

#[derive(Debug)]
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ViewStore {
    pub fn new(initial: ViewState) -> Self {
        ViewStore {
            inner: Mutex::new(Inner {
                state: Arc::new(initial),
                applied: BTreeMap::new(),
            }),
            trackers: Source::ALL
                .iter()
                .map(|source| (*source, SourceTracker::default()))
                .collect(),
        }
    }

    pub fn with_region(region: MapRegion) -> Self {
        ViewStore::new(ViewState::new(region))
    }

    pub fn snapshot(&self) -> Arc<ViewState> {
        self.lock().state.clone()
    }

    /// Starts a guarded fetch. Returns `None` while another fetch for the
    /// same source is outstanding.
    pub fn try_begin(&self, source: Source) -> Option<FetchTicket> {
        let tracker = self.tracker(source);
        if tracker
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return None;
        }

        Some(FetchTicket {
            source,
            seq: tracker.next_seq.fetch_add(1, Ordering::AcqRel) + 1,
            _guard: Some(InFlightGuard(tracker.in_flight.clone())),
        })
    }

    /// Starts an unguarded fetch; overlapping fetches are allowed but only
    /// the most recently issued one that completes can still apply.
    pub fn issue(&self, source: Source) -> FetchTicket {
        let tracker = self.tracker(source);
        FetchTicket {
            source,
            seq: tracker.next_seq.fetch_add(1, Ordering::AcqRel) + 1,
            _guard: None,
        }
    }

    pub fn is_in_flight(&self, source: Source) -> bool {
        self.tracker(source).in_flight.load(Ordering::Acquire)
    }

    /// Publishes the result of a fetch. Returns `false` and changes nothing
    /// when a newer ticket for the same source has already been applied.
    pub fn apply<F>(&self, ticket: FetchTicket, update: F) -> bool
    where
        F: FnOnce(&ViewState) -> ViewState,
    {
        let mut inner = self.lock();
        let last = inner.applied.get(&ticket.source).copied().unwrap_or(0);
        if ticket.seq <= last {
            debug!(
                "Dropping stale {} response #{} (already at #{})",
                ticket.source.name(),
                ticket.seq,
                last
            );
            return false;
        }

        let next = update(&inner.state).stamped(ticket.source, Utc::now().timestamp());
        inner.state = Arc::new(next);
        inner.applied.insert(ticket.source, ticket.seq);
        true
    }

    /// Applies a user-driven change that is not tied to a fetch.
    pub fn update<F>(&self, update: F) -> Arc<ViewState>
    where
        F: FnOnce(&ViewState) -> ViewState,
    {
        let mut inner = self.lock();
        inner.state = Arc::new(update(&inner.state));
        inner.state.clone()
    }

    fn tracker(&self, source: Source) -> &SourceTracker {
        // Every source gets a tracker in `new`.
        &self.trackers[&source]
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
