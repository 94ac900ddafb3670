// Copyright 2025 RisingWave Labs
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::HashMap;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::Notify;

/// The per-node map from key ids to serialized blobs.
///
/// Purely in-memory and never garbage-collected; values live until the node
/// shuts down. Waiters parked in [`MemoryBlobStore::wait_for`] are woken on
/// every insert and re-check their key.
#[derive(Default)]
pub struct MemoryBlobStore {
    inner: Mutex<HashMap<String, Bytes>>,
    changed: Notify,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the value under `id`.
    pub fn insert(&self, id: String, blob: Bytes) {
        self.inner.lock().insert(id, blob);
        self.changed.notify_waiters();
    }

    pub fn get(&self, id: &str) -> Option<Bytes> {
        self.inner.lock().get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.lock().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Blocks until `id` is present, then returns its value.
    pub async fn wait_for(&self, id: &str) -> Bytes {
        loop {
            let notified = self.changed.notified();
            tokio::pin!(notified);
            // Register interest before checking, so an insert between the
            // check and the await cannot be missed.
            notified.as_mut().enable();
            if let Some(blob) = self.get(id) {
                return blob;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_insert_get_contains() {
        let store = MemoryBlobStore::new();
        assert!(!store.contains("a"));
        store.insert("a".to_owned(), Bytes::from_static(b"one"));
        assert!(store.contains("a"));
        assert_eq!(store.get("a").unwrap(), Bytes::from_static(b"one"));

        // Re-insert replaces.
        store.insert("a".to_owned(), Bytes::from_static(b"two"));
        assert_eq!(store.get("a").unwrap(), Bytes::from_static(b"two"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_wait_for_sees_later_insert() {
        let store = Arc::new(MemoryBlobStore::new());
        let waiter = {
            let store = store.clone();
            tokio::spawn(async move { store.wait_for("k").await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        store.insert("k".to_owned(), Bytes::from_static(b"v"));
        assert_eq!(waiter.await.unwrap(), Bytes::from_static(b"v"));
    }

    #[tokio::test]
    async fn test_wait_for_present_key_returns_immediately() {
        let store = MemoryBlobStore::new();
        store.insert("k".to_owned(), Bytes::from_static(b"v"));
        assert_eq!(store.wait_for("k").await, Bytes::from_static(b"v"));
    }
}
