//! Byte-budget LRU cache of compressed renders.

use std::sync::Arc;

use log::{debug, trace};
use lru::LruCache;

use super::types::{CompressedRender, RenderKey};

/// Associative store of compressed renders, bounded by total byte cost.
///
/// Recency order comes from the underlying [`LruCache`]; the byte budget is
/// accounted here, since the crate bounds entry count rather than cost.
/// Eviction only happens under insert pressure, never on lookup.
pub struct BoundedCache {
    entries: LruCache<RenderKey, Arc<CompressedRender>>,
    max_cost: usize,
    total_cost: usize,
}

impl BoundedCache {
    /// Cache with a budget of `max_cost` bytes of compressed data.
    #[must_use]
    pub fn new(max_cost: usize) -> Self {
        Self {
            entries: LruCache::unbounded(),
            max_cost,
            total_cost: 0,
        }
    }

    /// Look up a render, marking it most recently used on hit.
    #[must_use]
    pub fn get(&mut self, key: &RenderKey) -> Option<Arc<CompressedRender>> {
        self.entries.get(key).cloned()
    }

    /// Check presence without touching recency order.
    #[must_use]
    pub fn contains(&self, key: &RenderKey) -> bool {
        self.entries.contains(key)
    }

    /// Insert a render, evicting least recently used entries until the
    /// budget holds. An item whose cost alone exceeds the whole budget is
    /// rejected and `None` is returned.
    pub fn insert(
        &mut self,
        key: RenderKey,
        render: CompressedRender,
    ) -> Option<Arc<CompressedRender>> {
        let cost = render.cost();
        if cost > self.max_cost {
            debug!(
                "cache: rejected {key:?}, {cost}B exceeds the {}B budget",
                self.max_cost
            );
            return None;
        }

        if let Some(previous) = self.entries.pop(&key) {
            self.total_cost -= previous.cost();
        }
        while self.total_cost + cost > self.max_cost {
            let Some((evicted_key, evicted)) = self.entries.pop_lru() else {
                break;
            };
            self.total_cost -= evicted.cost();
            trace!("cache: evicted {evicted_key:?} ({}B)", evicted.cost());
        }

        self.total_cost += cost;
        let shared = Arc::new(render);
        self.entries.put(key, Arc::clone(&shared));
        Some(shared)
    }

    /// Drop a single entry (e.g. one that failed to decode).
    pub fn remove(&mut self, key: &RenderKey) {
        if let Some(removed) = self.entries.pop(key) {
            self.total_cost -= removed.cost();
        }
    }

    /// Sum of the costs of all stored entries. Never exceeds `max_cost`.
    #[must_use]
    pub fn total_cost(&self) -> usize {
        self.total_cost
    }

    #[must_use]
    pub fn max_cost(&self) -> usize {
        self.max_cost
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::PageId;
    use crate::render::types::{PixelFormat, Size};

    fn key(page: u32) -> RenderKey {
        RenderKey {
            page: PageId::new(page),
            size: Size::new(100, 75),
        }
    }

    fn render_of_cost(cost: usize) -> CompressedRender {
        CompressedRender {
            data: vec![0; cost],
            size: Size::new(100, 75),
            stride: 300,
            format: PixelFormat::Rgb8,
        }
    }

    #[test]
    fn insert_and_get() {
        let mut cache = BoundedCache::new(1000);
        assert!(cache.insert(key(0), render_of_cost(100)).is_some());

        assert!(cache.contains(&key(0)));
        assert_eq!(cache.get(&key(0)).map(|r| r.cost()), Some(100));
        assert_eq!(cache.total_cost(), 100);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn cost_stays_bounded() {
        let mut cache = BoundedCache::new(1000);
        for page in 0..50 {
            cache.insert(key(page), render_of_cost(300));
            assert!(cache.total_cost() <= cache.max_cost());
        }
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn evicts_least_recently_used_first() {
        let mut cache = BoundedCache::new(1000);
        cache.insert(key(0), render_of_cost(400));
        cache.insert(key(1), render_of_cost(400));

        // Touch key 0 so key 1 becomes the eviction candidate.
        assert!(cache.get(&key(0)).is_some());
        cache.insert(key(2), render_of_cost(400));

        assert!(cache.contains(&key(0)));
        assert!(!cache.contains(&key(1)));
        assert!(cache.contains(&key(2)));
        assert_eq!(cache.total_cost(), 800);
    }

    #[test]
    fn evicts_in_insertion_order_without_access() {
        let mut cache = BoundedCache::new(1000);
        for page in 0..4 {
            cache.insert(key(page), render_of_cost(300));
        }
        // 4 x 300 over a 1000 budget: the first insert is gone.
        assert!(!cache.contains(&key(0)));
        assert!(cache.contains(&key(1)));
        assert!(cache.contains(&key(2)));
        assert!(cache.contains(&key(3)));
    }

    #[test]
    fn rejects_item_larger_than_budget() {
        let mut cache = BoundedCache::new(1000);
        cache.insert(key(0), render_of_cost(400));

        assert!(cache.insert(key(1), render_of_cost(1001)).is_none());
        // Nothing was evicted for the rejected item.
        assert!(cache.contains(&key(0)));
        assert_eq!(cache.total_cost(), 400);
    }

    #[test]
    fn item_filling_the_whole_budget_is_accepted() {
        let mut cache = BoundedCache::new(1000);
        cache.insert(key(0), render_of_cost(400));

        assert!(cache.insert(key(1), render_of_cost(1000)).is_some());
        assert!(!cache.contains(&key(0)));
        assert_eq!(cache.total_cost(), 1000);
    }

    #[test]
    fn reinserting_a_key_replaces_its_cost() {
        let mut cache = BoundedCache::new(1000);
        cache.insert(key(0), render_of_cost(600));
        cache.insert(key(0), render_of_cost(200));

        assert_eq!(cache.total_cost(), 200);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn remove_releases_cost() {
        let mut cache = BoundedCache::new(1000);
        cache.insert(key(0), render_of_cost(600));
        cache.remove(&key(0));

        assert!(cache.is_empty());
        assert_eq!(cache.total_cost(), 0);
    }
}
