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

use std::fmt;
use std::fmt::Write;
use std::sync::Arc;

use crate::codec::{Decoder, Encoder, Result};

/// Address of one value in the cluster: a string id plus the index of the
/// node that owns it. The id is reference-counted so keys clone cheaply.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Key {
    id: Arc<str>,
    home: usize,
}

impl Key {
    pub fn new(id: impl Into<Arc<str>>, home: usize) -> Self {
        Self {
            id: id.into(),
            home,
        }
    }

    /// The id naming this value within its home node's map.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Index of the unique node that owns this value.
    pub fn home(&self) -> usize {
        self.home
    }

    pub fn encode(&self, enc: &mut Encoder) {
        enc.str(&self.id);
        enc.uint(self.home as u64);
    }

    pub fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
        let id = dec.string()?;
        let home = dec.uint()? as usize;
        Ok(Self::new(id, home))
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.home)
    }
}

/// Derives keys from an anchor key by appending suffixes to its id.
///
/// `build` hands out the accumulated id with the given home node and resets
/// the buffer back to the anchor, so one builder can mint a whole family of
/// keys.
pub struct KeyBuilder {
    anchor: Arc<str>,
    buf: String,
}

impl KeyBuilder {
    pub fn new(anchor: &Key) -> Self {
        Self {
            anchor: anchor.id.clone(),
            buf: anchor.id.to_string(),
        }
    }

    pub fn push(&mut self, part: impl fmt::Display) -> &mut Self {
        write!(self.buf, "{}", part).expect("write to string buffer");
        self
    }

    pub fn build(&mut self, home: usize) -> Key {
        let id = std::mem::replace(&mut self.buf, self.anchor.to_string());
        Key::new(id, home)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_resets_to_anchor() {
        let anchor = Key::new("col", 0);
        let mut builder = KeyBuilder::new(&anchor);

        let first = builder.push("-").push(0).build(0);
        assert_eq!(first.id(), "col-0");
        assert_eq!(first.home(), 0);

        let second = builder.push("-").push(1).build(1);
        assert_eq!(second.id(), "col-1");
        assert_eq!(second.home(), 1);
    }

    #[test]
    fn test_key_roundtrip() {
        let key = Key::new("wc-map-3", 2);
        let mut enc = Encoder::new();
        key.encode(&mut enc);
        let blob = enc.finish();
        assert_eq!(&blob[..], b"{8}wc-map-3{2}");

        let mut dec = Decoder::new(&blob);
        assert_eq!(Key::decode(&mut dec).unwrap(), key);
    }
}
