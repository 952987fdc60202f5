//! Query cache for remote reads.
//!
//! Each cached read is identified by a `QueryKey` whose first segment is its
//! scope (for example `contribution_total`). Writes invalidate a whole scope.

use anyhow::Result;
use log::debug;
use lru::LruCache;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};

/// Identifies one cached query: a scope followed by its parameters
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new(scope: &str) -> Self {
        Self(vec![scope.to_string()])
    }

    /// Append a parameter segment; `None` is recorded explicitly as `-`
    pub fn with<V: fmt::Display>(mut self, part: Option<V>) -> Self {
        self.0.push(match part {
            Some(value) => value.to_string(),
            None => "-".to_string(),
        });
        self
    }

    pub fn scope(&self) -> &str {
        &self.0[0]
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(":"))
    }
}

struct CacheState<V> {
    entries: LruCache<QueryKey, V>,
    /// Bumped on every invalidation of a scope
    generations: HashMap<String, u64>,
}

impl<V> CacheState<V> {
    fn generation(&self, scope: &str) -> u64 {
        self.generations.get(scope).copied().unwrap_or(0)
    }
}

/// LRU cache of query results shared between clones
#[derive(Clone)]
pub struct QueryCache<V> {
    state: Arc<Mutex<CacheState<V>>>,
}

impl<V: Clone> QueryCache<V> {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            state: Arc::new(Mutex::new(CacheState {
                entries: LruCache::new(capacity),
                generations: HashMap::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState<V>> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, key: &QueryKey) -> Option<V> {
        self.lock().entries.get(key).cloned()
    }

    pub fn put(&self, key: QueryKey, value: V) {
        self.lock().entries.put(key, value);
    }

    /// Return the cached value for `key`, or run `fetch` and cache its result.
    ///
    /// Failed fetches are not cached. A result whose scope was invalidated
    /// while it was being fetched is returned but not cached.
    pub async fn get_or_fetch<F, Fut>(&self, key: QueryKey, fetch: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        let generation = {
            let mut state = self.lock();
            if let Some(value) = state.entries.get(&key) {
                debug!("Cache hit: {}", key);
                return Ok(value.clone());
            }
            state.generation(key.scope())
        };
        debug!("Cache miss: {}", key);
        let value = fetch().await?;

        let mut state = self.lock();
        if state.generation(key.scope()) == generation {
            state.entries.put(key, value.clone());
        } else {
            debug!("Not caching {}: scope invalidated during fetch", key);
        }
        Ok(value)
    }

    /// Drop every entry in `scope`; returns how many were removed
    pub fn invalidate_scope(&self, scope: &str) -> usize {
        let mut state = self.lock();
        *state.generations.entry(scope.to_string()).or_insert(0) += 1;
        let stale: Vec<QueryKey> = state
            .entries
            .iter()
            .filter(|(key, _)| key.scope() == scope)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &stale {
            state.entries.pop(key);
        }
        if !stale.is_empty() {
            debug!("Invalidated {} cached {} entries", stale.len(), scope);
        }
        stale.len()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }
}
