//! Tracking of renders currently being computed by a worker.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use super::types::RenderKey;

/// Why a render job exists.
///
/// Only `Requested` completions are published to subscribers; `Prefetch`
/// results go to the cache silently.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobKind {
    Requested,
    Prefetch,
}

/// Outcome of trying to start work on a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BeginOutcome {
    /// No job existed; the caller must schedule one.
    Started,
    /// A job is already running; the caller must not schedule another.
    /// `promoted` is set when an in-flight prefetch was upgraded to a
    /// requested job by this call.
    AlreadyRunning { promoted: bool },
}

/// Registry of keys with an outstanding worker job.
///
/// At most one entry per key ever exists, so no two workers compute the
/// same render concurrently.
#[derive(Debug, Default)]
pub struct InFlightRegistry {
    jobs: HashMap<RenderKey, JobKind>,
}

impl InFlightRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `key` for a new job, or join the job already in flight.
    /// A `Requested` claim upgrades an in-flight `Prefetch` entry in place.
    pub fn try_begin(&mut self, key: RenderKey, kind: JobKind) -> BeginOutcome {
        match self.jobs.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(kind);
                BeginOutcome::Started
            }
            Entry::Occupied(mut slot) => {
                let promoted = *slot.get() == JobKind::Prefetch && kind == JobKind::Requested;
                if promoted {
                    slot.insert(JobKind::Requested);
                }
                BeginOutcome::AlreadyRunning { promoted }
            }
        }
    }

    /// Release `key` and report the kind its job ended with. `None` when
    /// the key was not tracked.
    pub fn finish(&mut self, key: RenderKey) -> Option<JobKind> {
        self.jobs.remove(&key)
    }

    #[must_use]
    pub fn contains(&self, key: &RenderKey) -> bool {
        self.jobs.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::PageId;
    use crate::render::types::Size;

    fn key(page: u32) -> RenderKey {
        RenderKey {
            page: PageId::new(page),
            size: Size::new(640, 480),
        }
    }

    #[test]
    fn first_claim_starts() {
        let mut registry = InFlightRegistry::new();
        assert_eq!(
            registry.try_begin(key(0), JobKind::Requested),
            BeginOutcome::Started
        );
        assert!(registry.contains(&key(0)));
    }

    #[test]
    fn second_claim_joins_without_promotion() {
        let mut registry = InFlightRegistry::new();
        registry.try_begin(key(0), JobKind::Requested);

        assert_eq!(
            registry.try_begin(key(0), JobKind::Requested),
            BeginOutcome::AlreadyRunning { promoted: false }
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn request_promotes_in_flight_prefetch() {
        let mut registry = InFlightRegistry::new();
        registry.try_begin(key(0), JobKind::Prefetch);

        assert_eq!(
            registry.try_begin(key(0), JobKind::Requested),
            BeginOutcome::AlreadyRunning { promoted: true }
        );
        assert_eq!(registry.finish(key(0)), Some(JobKind::Requested));
    }

    #[test]
    fn prefetch_never_demotes_a_request() {
        let mut registry = InFlightRegistry::new();
        registry.try_begin(key(0), JobKind::Requested);

        assert_eq!(
            registry.try_begin(key(0), JobKind::Prefetch),
            BeginOutcome::AlreadyRunning { promoted: false }
        );
        assert_eq!(registry.finish(key(0)), Some(JobKind::Requested));
    }

    #[test]
    fn finish_releases_the_slot() {
        let mut registry = InFlightRegistry::new();
        registry.try_begin(key(0), JobKind::Prefetch);

        assert_eq!(registry.finish(key(0)), Some(JobKind::Prefetch));
        assert!(registry.is_empty());
        assert_eq!(registry.finish(key(0)), None);
        // The slot is free for a fresh job.
        assert_eq!(
            registry.try_begin(key(0), JobKind::Requested),
            BeginOutcome::Started
        );
    }
}
