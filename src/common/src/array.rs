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

use crate::codec::{Decoder, Encoder, Result};
use crate::config::CHUNK_SIZE;
use crate::types::Cell;

/// One fixed-capacity run of cells out of a distributed column, identified
/// by its position within that column.
///
/// A chunk is the unit of placement: full chunks are serialized and shipped
/// to their home node, and re-materialized on demand.
#[derive(Debug, PartialEq)]
pub struct Chunk {
    index: usize,
    cells: Vec<Cell>,
}

impl Chunk {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            cells: Vec::with_capacity(CHUNK_SIZE),
        }
    }

    /// Position of this chunk within its column.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.cells.len() == CHUNK_SIZE
    }

    pub fn append(&mut self, cell: Cell) {
        assert!(!self.is_full(), "chunk {} is full", self.index);
        self.cells.push(cell);
    }

    pub fn get(&self, idx: usize) -> &Cell {
        assert!(
            idx < self.cells.len(),
            "cell index {} out of bounds for chunk of {} cells",
            idx,
            self.cells.len()
        );
        &self.cells[idx]
    }

    pub fn encode(&self, enc: &mut Encoder) {
        enc.uint(self.index as u64);
        enc.uint(self.cells.len() as u64);
        enc.tag(b'[');
        for cell in &self.cells {
            cell.encode(enc);
        }
        enc.tag(b']');
    }

    pub fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
        let index = dec.uint()? as usize;
        let count = dec.uint()? as usize;
        dec.expect(b'[')?;
        let mut chunk = Chunk::new(index);
        for _ in 0..count {
            chunk.append(Cell::decode(dec)?);
        }
        dec.expect(b']')?;
        Ok(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_get() {
        let mut chunk = Chunk::new(3);
        chunk.append(Cell::Int(1));
        chunk.append(Cell::Missing);
        assert_eq!(chunk.len(), 2);
        assert_eq!(chunk.get(0), &Cell::Int(1));
        assert!(chunk.get(1).is_missing());
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_get_out_of_bounds() {
        Chunk::new(0).get(0);
    }

    #[test]
    #[should_panic(expected = "is full")]
    fn test_append_past_capacity() {
        let mut chunk = Chunk::new(0);
        for i in 0..=CHUNK_SIZE {
            chunk.append(Cell::Int(i as i32));
        }
    }

    #[test]
    fn test_chunk_roundtrip() {
        let mut chunk = Chunk::new(7);
        chunk.append(Cell::Int(42));
        chunk.append(Cell::Str("abc".to_owned()));
        chunk.append(Cell::Missing);

        let mut enc = Encoder::new();
        chunk.encode(&mut enc);
        let blob = enc.finish();
        assert_eq!(&blob[..], b"{7}{3}[I{42}S{3}abcU]");

        let mut dec = Decoder::new(&blob);
        assert_eq!(Chunk::decode(&mut dec).unwrap(), chunk);
        assert!(dec.is_done());
    }
}
