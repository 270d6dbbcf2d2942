use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Key-value store for uploaded images.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn insert(&self, id: String, image: Bytes);
    async fn get(&self, id: &str) -> Option<Bytes>;
    async fn len(&self) -> usize;
}

struct Entry {
    image: Bytes,
    created_at: Instant,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    // insertion order; may hold ids already removed
    order: VecDeque<String>,
}

impl Inner {
    fn purge_expired(&mut self, ttl: Duration, now: Instant) {
        while let Some(id) = self.order.front().cloned() {
            let expired = match self.entries.get(&id) {
                Some(e) => now.duration_since(e.created_at) >= ttl,
                None => true,
            };
            if !expired {
                break;
            }
            self.entries.remove(&id);
            self.order.pop_front();
        }
    }

    fn evict_oldest(&mut self) {
        while let Some(id) = self.order.pop_front() {
            if self.entries.remove(&id).is_some() {
                return;
            }
        }
    }
}

/// In-process store bounded by entry count, with per-entry expiry.
/// When full, the oldest upload is evicted first.
pub struct MemoryImageStore {
    capacity: usize,
    ttl: Duration,
    inner: Mutex<Inner>,
}

impl MemoryImageStore {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            capacity: capacity.max(1),
            ttl,
            inner: Mutex::new(Inner::default()),
        }
    }
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn insert(&self, id: String, image: Bytes) {
        let now = Instant::now();
        let mut inner = self.inner.lock().await;
        inner.purge_expired(self.ttl, now);

        if inner.entries.remove(&id).is_some() {
            inner.order.retain(|k| k != &id);
        }
        while inner.entries.len() >= self.capacity {
            inner.evict_oldest();
        }
        inner.order.push_back(id.clone());
        inner.entries.insert(id, Entry { image, created_at: now });
    }

    async fn get(&self, id: &str) -> Option<Bytes> {
        let mut inner = self.inner.lock().await;
        inner.purge_expired(self.ttl, Instant::now());
        inner.entries.get(id).map(|e| e.image.clone())
    }

    async fn len(&self) -> usize {
        let mut inner = self.inner.lock().await;
        inner.purge_expired(self.ttl, Instant::now());
        inner.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn img(b: &'static [u8]) -> Bytes {
        Bytes::from_static(b)
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = MemoryImageStore::new(4, Duration::from_secs(60));
        store.insert("a".into(), img(b"one")).await;
        assert_eq!(store.get("a").await, Some(img(b"one")));
        assert_eq!(store.get("missing").await, None);
    }

    #[tokio::test]
    async fn test_oldest_evicted_at_capacity() {
        let store = MemoryImageStore::new(2, Duration::from_secs(60));
        store.insert("a".into(), img(b"1")).await;
        store.insert("b".into(), img(b"2")).await;
        store.insert("c".into(), img(b"3")).await;
        assert_eq!(store.len().await, 2);
        assert!(store.get("a").await.is_none());
        assert!(store.get("b").await.is_some() && store.get("c").await.is_some());
    }

    #[tokio::test]
    async fn test_reinsert_refreshes_position() {
        let store = MemoryImageStore::new(2, Duration::from_secs(60));
        store.insert("a".into(), img(b"1")).await;
        store.insert("b".into(), img(b"2")).await;
        store.insert("a".into(), img(b"1b")).await;
        store.insert("c".into(), img(b"3")).await;
        assert!(store.get("b").await.is_none());
        assert_eq!(store.get("a").await, Some(img(b"1b")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire() {
        let store = MemoryImageStore::new(8, Duration::from_secs(10));
        store.insert("a".into(), img(b"1")).await;
        tokio::time::advance(Duration::from_secs(5)).await;
        store.insert("b".into(), img(b"2")).await;
        tokio::time::advance(Duration::from_secs(6)).await;

        assert!(store.get("a").await.is_none());
        assert!(store.get("b").await.is_some());
        assert_eq!(store.len().await, 1);
    }
}
