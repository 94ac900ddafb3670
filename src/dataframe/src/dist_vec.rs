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

//! The chunked backbone of a column.
//!
//! Cells accumulate in one live chunk; each full chunk is serialized and
//! stored in the K/V plane under a key synthesized from the column's anchor,
//! homed round-robin across the cluster. Only the chunk keys stay in memory,
//! so a column's resident footprint is one chunk regardless of its length.

use std::fmt;
use std::sync::Arc;

use eddy_common::array::Chunk;
use eddy_common::catalog::{Key, KeyBuilder};
use eddy_common::codec::{Decoder, Encoder};
use eddy_common::config::CHUNK_SIZE;
use eddy_common::types::Cell;
use eddy_store::KvNode;
use tracing::debug;

use crate::error::Result;

pub struct DistVec {
    kv: Arc<KvNode>,
    /// Mints chunk keys off the column's anchor key. Absent on vectors
    /// rehydrated from the store, which therefore cannot flush new chunks.
    builder: Option<KeyBuilder>,
    size: usize,
    keys: Vec<Key>,
    sealed: bool,
    /// The chunk currently accepting appends, while open.
    current: Option<Chunk>,
    /// Single-slot retrieval cache, while sealed. Workloads are sequential
    /// or chunk-local, so one slot is enough.
    cache: tokio::sync::Mutex<Option<Chunk>>,
}

impl DistVec {
    /// An empty, open vector whose chunk keys derive from `anchor`.
    pub fn new(kv: Arc<KvNode>, anchor: &Key) -> Self {
        Self {
            kv,
            builder: Some(KeyBuilder::new(anchor)),
            size: 0,
            keys: Vec::new(),
            sealed: false,
            current: Some(Chunk::new(0)),
            cache: tokio::sync::Mutex::new(None),
        }
    }

    /// A sealed vector over chunks already resident in the store.
    pub fn from_parts(kv: Arc<KvNode>, size: usize, keys: Vec<Key>) -> Self {
        Self {
            kv,
            builder: None,
            size,
            keys,
            sealed: true,
            current: None,
            cache: tokio::sync::Mutex::new(None),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Index of the node holding the cell at `index`.
    pub fn home_of(&self, index: usize) -> usize {
        self.keys[index / CHUNK_SIZE].home()
    }

    /// Appends to the live chunk, flushing it to the store first when full.
    pub async fn append(&mut self, cell: Cell) -> Result<()> {
        assert!(!self.sealed, "append on a sealed vector");
        let (full, next_index) = {
            let current = self.current.as_ref().expect("open vector has a live chunk");
            (current.is_full(), current.index() + 1)
        };
        if full {
            self.flush_current().await?;
            self.current = Some(Chunk::new(next_index));
        }
        self.current
            .as_mut()
            .expect("open vector has a live chunk")
            .append(cell);
        self.size += 1;
        Ok(())
    }

    /// Returns a copy of the cell at `index`, faulting in its chunk if the
    /// cache holds a different one.
    pub async fn get(&self, index: usize) -> Result<Cell> {
        assert!(self.sealed, "reads require a sealed vector");
        assert!(
            index < self.size,
            "index {} out of bounds for vector of {} cells",
            index,
            self.size
        );
        let chunk_index = index / CHUNK_SIZE;
        let cell_index = index % CHUNK_SIZE;

        let mut cache = self.cache.lock().await;
        if cache.as_ref().map(|c| c.index()) != Some(chunk_index) {
            *cache = None;
            debug!(key = ?self.keys[chunk_index], "faulting in chunk");
            let blob = self.kv.get(&self.keys[chunk_index]).await?;
            *cache = Some(Chunk::decode(&mut Decoder::new(&blob))?);
        }
        let chunk = cache.as_ref().expect("cache was just filled");
        Ok(chunk.get(cell_index).clone())
    }

    /// Seals the vector, flushing a non-empty live chunk.
    pub async fn lock(&mut self) -> Result<()> {
        assert!(!self.sealed, "vector is already sealed");
        if self.current.as_ref().is_some_and(|c| !c.is_empty()) {
            self.flush_current().await?;
        } else {
            self.current = None;
        }
        self.sealed = true;
        *self.cache.get_mut() = None;
        Ok(())
    }

    /// Reopens a sealed vector by pulling its last chunk back in as the live
    /// chunk. Dataframe padding appends through this path.
    pub async fn unlock(&mut self) -> Result<()> {
        assert!(self.sealed, "vector is already open");
        *self.cache.get_mut() = None;
        if self.keys.is_empty() {
            self.current = Some(Chunk::new(0));
        } else {
            let last = self.keys.len() - 1;
            let blob = self.kv.get(&self.keys[last]).await?;
            self.current = Some(Chunk::decode(&mut Decoder::new(&blob))?);
        }
        self.sealed = false;
        Ok(())
    }

    /// Serializes the live chunk, stores it under `anchor-<index>` homed at
    /// `index mod N`, and records the key at the chunk's position.
    async fn flush_current(&mut self) -> Result<()> {
        let chunk = self.current.take().expect("no live chunk to flush");
        let index = chunk.index();
        let builder = self
            .builder
            .as_mut()
            .expect("vector rehydrated from the store cannot flush chunks");
        let key = builder
            .push("-")
            .push(index)
            .build(index % self.kv.num_nodes());

        debug!(key = ?key, cells = chunk.len(), "flushing chunk");
        let mut enc = Encoder::new();
        chunk.encode(&mut enc);
        self.kv.put(&key, enc.finish()).await?;

        if index == self.keys.len() {
            self.keys.push(key);
        } else {
            // Re-flush of a chunk that was unsealed for more appends.
            self.keys[index] = key;
        }
        Ok(())
    }

    /// Size plus the chunk-key table. Only sealed vectors have a stable
    /// serialized form.
    pub fn encode(&self, enc: &mut Encoder) {
        assert!(self.sealed, "only a sealed vector can be serialized");
        enc.uint(self.size as u64);
        enc.tag(b'[');
        for key in &self.keys {
            key.encode(enc);
        }
        enc.tag(b']');
    }

    pub fn decode(dec: &mut Decoder<'_>, kv: Arc<KvNode>) -> eddy_common::codec::Result<Self> {
        let size = dec.uint()? as usize;
        dec.expect(b'[')?;
        let mut keys = Vec::new();
        while dec.peek()? != b']' {
            keys.push(Key::decode(dec)?);
        }
        dec.expect(b']')?;
        Ok(Self::from_parts(kv, size, keys))
    }
}

/// Structural equality over size and chunk keys, the sealed representation.
impl PartialEq for DistVec {
    fn eq(&self, other: &Self) -> bool {
        self.size == other.size && self.keys == other.keys
    }
}

impl fmt::Debug for DistVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DistVec")
            .field("size", &self.size)
            .field("keys", &self.keys)
            .field("sealed", &self.sealed)
            .finish_non_exhaustive()
    }
}
