//! Bounded, expiring response cache.
//!
//! One `ResponseCache` is created per process and shared (via `Arc`) by the
//! embedding client and the answer composer. Entries expire `ttl` after they
//! were inserted; once `capacity` is reached the least recently used entry is
//! evicted.

use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use lru::LruCache;

pub const DEFAULT_CAPACITY: usize = 10_000;
pub const DEFAULT_TTL: Duration = Duration::from_secs(12 * 60 * 60);

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

pub struct TtlCache<K: Hash + Eq, V> {
    inner: Mutex<LruCache<K, Entry<V>>>,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self { inner: Mutex::new(LruCache::new(capacity)), ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    pub fn put(&self, key: K, value: V) {
        self.put_at(key, value, Instant::now());
    }

    /// Drops every expired entry, returning how many were removed.
    pub fn evict_expired(&self) -> usize {
        self.evict_expired_at(Instant::now())
    }

    fn get_at(&self, key: &K, now: Instant) -> Option<V> {
        let mut cache = self.lock();
        let expired = match cache.get(key) {
            None => return None,
            Some(entry) if !self.is_expired(entry, now) => return Some(entry.value.clone()),
            Some(_) => true,
        };
        if expired {
            cache.pop(key);
        }
        None
    }

    fn put_at(&self, key: K, value: V, now: Instant) {
        self.lock().put(key, Entry { value, inserted_at: now });
    }

    fn evict_expired_at(&self, now: Instant) -> usize {
        let mut cache = self.lock();
        let expired: Vec<K> = cache
            .iter()
            .filter(|(_, entry)| self.is_expired(entry, now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            cache.pop(key);
        }
        expired.len()
    }

    fn is_expired(&self, entry: &Entry<V>, now: Instant) -> bool {
        now.saturating_duration_since(entry.inserted_at) >= self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<K, Entry<V>>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<K, V> Default for TtlCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TTL)
    }
}

/// Key space of the shared response cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Embedding {
        text: String,
        model: String,
    },
    Answer {
        system_prompt: String,
        user_message: String,
        model: String,
        use_reminder: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    Vector(Vec<f32>),
    Text(String),
}

pub type ResponseCache = TtlCache<CacheKey, CachedValue>;
