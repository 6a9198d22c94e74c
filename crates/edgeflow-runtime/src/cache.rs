//! Time-bounded caching of loaded values.
//!
//! The cache is an owned object injected where it is needed, never a global.
//! Expiry is checked on every read.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tokio::time::Instant;

/// Caches values for a fixed time-to-live.
#[derive(Clone)]
pub struct TtlCache<K, V> {
  ttl: Duration,
  entries: Arc<RwLock<HashMap<K, (Instant, V)>>>,
}

impl<K, V> TtlCache<K, V>
where
  K: Eq + Hash + Clone,
  V: Clone,
{
  pub fn new(ttl: Duration) -> Self {
    Self {
      ttl,
      entries: Arc::new(RwLock::new(HashMap::new())),
    }
  }

  pub fn ttl(&self) -> Duration {
    self.ttl
  }

  /// Get a live entry. Expired entries are evicted.
  pub fn get(&self, key: &K) -> Option<V> {
    {
      let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
      match entries.get(key) {
        Some((inserted, value)) if inserted.elapsed() < self.ttl => return Some(value.clone()),
        Some(_) => {}
        None => return None,
      }
    }

    self.evict_expired(key)
  }

  /// Remove `key` if it is still expired under the write lock. An entry
  /// refreshed since the read is kept and returned.
  fn evict_expired(&self, key: &K) -> Option<V> {
    let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
    let (inserted, _) = entries.get(key)?;
    if inserted.elapsed() >= self.ttl {
      entries.remove(key);
      return None;
    }
    entries.get(key).map(|(_, value)| value.clone())
  }

  pub fn insert(&self, key: K, value: V) {
    if self.ttl.is_zero() {
      return;
    }
    self
      .entries
      .write()
      .unwrap_or_else(PoisonError::into_inner)
      .insert(key, (Instant::now(), value));
  }

  pub fn invalidate(&self, key: &K) {
    self
      .entries
      .write()
      .unwrap_or_else(PoisonError::into_inner)
      .remove(key);
  }

  pub fn clear(&self) {
    self
      .entries
      .write()
      .unwrap_or_else(PoisonError::into_inner)
      .clear();
  }

  /// Number of stored entries, including any not yet evicted.
  pub fn len(&self) -> usize {
    self
      .entries
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test(start_paused = true)]
  async fn test_entry_expires_after_ttl() {
    let cache = TtlCache::new(Duration::from_secs(10));
    cache.insert("wf", 1);

    tokio::time::advance(Duration::from_secs(9)).await;
    assert_eq!(cache.get(&"wf"), Some(1));

    tokio::time::advance(Duration::from_secs(2)).await;
    assert_eq!(cache.get(&"wf"), None);
    assert!(cache.is_empty());
  }

  #[tokio::test(start_paused = true)]
  async fn test_reinsert_refreshes() {
    let cache = TtlCache::new(Duration::from_secs(10));
    cache.insert("wf", 1);

    tokio::time::advance(Duration::from_secs(8)).await;
    cache.insert("wf", 2);
    tokio::time::advance(Duration::from_secs(8)).await;

    assert_eq!(cache.get(&"wf"), Some(2));
  }

  #[tokio::test(start_paused = true)]
  async fn test_eviction_keeps_refreshed_entry() {
    let cache = TtlCache::new(Duration::from_secs(10));
    cache.insert("wf", 1);
    tokio::time::advance(Duration::from_secs(11)).await;

    // Another run reloads the entry between the expired read and the eviction.
    cache.insert("wf", 2);

    assert_eq!(cache.evict_expired(&"wf"), Some(2));
    assert_eq!(cache.get(&"wf"), Some(2));
    assert_eq!(cache.len(), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_eviction_removes_stale_entry() {
    let cache = TtlCache::new(Duration::from_secs(10));
    cache.insert("wf", 1);
    tokio::time::advance(Duration::from_secs(11)).await;

    assert_eq!(cache.evict_expired(&"wf"), None);
    assert!(cache.is_empty());
  }

  #[test]
  fn test_zero_ttl_disables_cache() {
    let cache = TtlCache::new(Duration::ZERO);
    cache.insert("wf", 1);

    assert_eq!(cache.get(&"wf"), None);
    assert_eq!(cache.len(), 0);
  }

  #[test]
  fn test_invalidate_and_clear() {
    let cache = TtlCache::new(Duration::from_secs(60));
    cache.insert("a", 1);
    cache.insert("b", 2);

    cache.invalidate(&"a");
    assert_eq!(cache.get(&"a"), None);
    assert_eq!(cache.get(&"b"), Some(2));

    cache.clear();
    assert!(cache.is_empty());
  }
}
