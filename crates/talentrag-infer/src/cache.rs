//! Query embedding cache with LRU eviction and a time-to-live.
//!
//! Recruiters tend to ask the same handful of questions, so repeated queries
//! skip the encoder entirely. Default: 1000 entries, 1-hour TTL.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use ndarray::Array1;
use parking_lot::Mutex;

struct Slot {
    embedding: Array1<f32>,
    stored: Instant,
    /// Tick of the last read or write; the smallest tick is evicted first.
    used: u64,
}

struct Slots {
    map: HashMap<String, Slot>,
    tick: u64,
    capacity: usize,
    ttl: Duration,
    hits: u64,
    misses: u64,
}

impl Slots {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn evict_stalest(&mut self) {
        let stalest = self
            .map
            .iter()
            .min_by_key(|(_, slot)| slot.used)
            .map(|(key, _)| key.clone());
        if let Some(key) = stalest {
            self.map.remove(&key);
        }
    }
}

/// Hit/miss counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Thread-safe query embedding cache.
pub struct QueryCache {
    slots: Mutex<Slots>,
}

impl QueryCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            slots: Mutex::new(Slots {
                map: HashMap::with_capacity(capacity),
                tick: 0,
                capacity,
                ttl,
                hits: 0,
                misses: 0,
            }),
        }
    }

    /// 1000 entries, 1-hour TTL.
    pub fn default_cache() -> Self {
        const ONE_HOUR: Duration = Duration::from_secs(60 * 60);
        Self::new(1000, ONE_HOUR)
    }

    /// Cached embedding for `query`; expired entries are dropped and count as a miss.
    pub fn get(&self, query: &str) -> Option<Array1<f32>> {
        let mut slots = self.slots.lock();
        let tick = slots.next_tick();
        let ttl = slots.ttl;

        let fresh = match slots.map.get_mut(query) {
            Some(slot) if slot.stored.elapsed() < ttl => {
                slot.used = tick;
                Some(slot.embedding.clone())
            }
            Some(_) => {
                slots.map.remove(query);
                None
            }
            None => None,
        };

        if fresh.is_some() {
            slots.hits += 1;
        } else {
            slots.misses += 1;
        }
        fresh
    }

    /// Store `embedding` for `query`, evicting the least recently used entry when full.
    pub fn put(&self, query: String, embedding: Array1<f32>) {
        let mut slots = self.slots.lock();
        if slots.capacity == 0 {
            return;
        }

        if !slots.map.contains_key(&query) {
            while slots.map.len() >= slots.capacity {
                slots.evict_stalest();
            }
        }

        let used = slots.next_tick();
        slots.map.insert(
            query,
            Slot {
                embedding,
                stored: Instant::now(),
                used,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.slots.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let slots = self.slots.lock();
        CacheStats {
            entries: slots.map.len(),
            hits: slots.hits,
            misses: slots.misses,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_hit_after_put_and_counters() {
        let cache = QueryCache::new(10, Duration::from_secs(600));
        assert!(cache.get("vaga Python").is_none());

        cache.put("vaga Python".into(), array![1.0, 2.0, 3.0]);
        assert_eq!(cache.get("vaga Python"), Some(array![1.0, 2.0, 3.0]));

        let stats = cache.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_least_recently_used_is_evicted() {
        let cache = QueryCache::new(2, Duration::from_secs(600));
        cache.put("vaga Java".into(), array![1.0]);
        cache.put("vaga SQL".into(), array![2.0]);

        // Reading "vaga Java" makes "vaga SQL" the eviction candidate.
        assert!(cache.get("vaga Java").is_some());
        cache.put("vaga Go".into(), array![3.0]);

        assert_eq!(cache.len(), 2);
        assert!(cache.get("vaga SQL").is_none());
        assert!(cache.get("vaga Java").is_some());
        assert!(cache.get("vaga Go").is_some());
    }

    #[test]
    fn test_reinsert_replaces_value() {
        let cache = QueryCache::new(2, Duration::from_secs(600));
        cache.put("vaga Java".into(), array![1.0]);
        cache.put("vaga Java".into(), array![9.0]);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("vaga Java"), Some(array![9.0]));
    }

    #[test]
    fn test_expired_entry_is_dropped() {
        let cache = QueryCache::new(4, Duration::from_millis(1));
        cache.put("vaga temporária".into(), array![1.0]);

        std::thread::sleep(Duration::from_millis(10));
        assert!(cache.get("vaga temporária").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let cache = QueryCache::new(0, Duration::from_secs(60));
        cache.put("vaga Java".into(), array![1.0]);
        assert!(cache.is_empty());
    }
}
