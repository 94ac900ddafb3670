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

//! Self-describing textual serialization shared by the wire protocol and the
//! chunk store.
//!
//! Primitives are wrapped in braces (`{42}`, `{-7}`, `{1.5000000}`, `{0}` /
//! `{1}` for booleans). Strings are a braced byte length followed by exactly
//! that many payload bytes, so no escaping is needed. Sequences are a braced
//! count followed by the elements; chunk- and column-level composites add a
//! `[` `]` framing hint. Floats are printed with seven fractional digits.

use bytes::Bytes;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("unexpected end of input at byte {0}")]
    UnexpectedEof(usize),
    #[error("expected {expected:?} but found {found:?} at byte {at}")]
    Unexpected { expected: char, found: char, at: usize },
    #[error("malformed number {0:?}")]
    Number(String),
    #[error("invalid utf-8 in string payload")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("unknown cell tag {0:?}")]
    UnknownCellTag(char),
    #[error("unknown message kind {0}")]
    UnknownMsgKind(u64),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Append-only byte sink for the textual format.
#[derive(Default)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single framing or type-tag byte, written verbatim.
    pub fn tag(&mut self, b: u8) {
        self.buf.push(b);
    }

    /// Raw payload bytes, written verbatim.
    pub fn raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn uint(&mut self, v: u64) {
        self.buf.extend_from_slice(format!("{{{}}}", v).as_bytes());
    }

    pub fn int(&mut self, v: i32) {
        self.buf.extend_from_slice(format!("{{{}}}", v).as_bytes());
    }

    pub fn float(&mut self, v: f32) {
        self.buf.extend_from_slice(format!("{{{:.7}}}", v).as_bytes());
    }

    pub fn boolean(&mut self, v: bool) {
        self.buf.extend_from_slice(if v { b"{1}" } else { b"{0}" });
    }

    /// Length-prefixed string: the byte length is authoritative, the payload
    /// is copied unescaped.
    pub fn str(&mut self, s: &str) {
        self.uint(s.len() as u64);
        self.buf.extend_from_slice(s.as_bytes());
    }

    pub fn finish(self) -> Bytes {
        Bytes::from(self.buf)
    }
}

/// Cursor over an encoded buffer.
pub struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_done(&self) -> bool {
        self.pos >= self.buf.len()
    }

    pub fn peek(&self) -> Result<u8> {
        self.buf
            .get(self.pos)
            .copied()
            .ok_or(Error::UnexpectedEof(self.pos))
    }

    /// Consume and return the current byte.
    pub fn bump(&mut self) -> Result<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Ok(b)
    }

    pub fn expect(&mut self, expected: u8) -> Result<()> {
        let found = self.peek()?;
        if found != expected {
            return Err(Error::Unexpected {
                expected: expected as char,
                found: found as char,
                at: self.pos,
            });
        }
        self.pos += 1;
        Ok(())
    }

    /// Consume exactly `n` payload bytes.
    pub fn raw(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.pos + n > self.buf.len() {
            return Err(Error::UnexpectedEof(self.buf.len()));
        }
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    /// Consume everything up to the end of the buffer.
    pub fn rest(&mut self) -> &'a [u8] {
        let bytes = &self.buf[self.pos..];
        self.pos = self.buf.len();
        bytes
    }

    fn braced(&mut self) -> Result<&'a str> {
        self.expect(b'{')?;
        let start = self.pos;
        while self.peek()? != b'}' {
            self.pos += 1;
        }
        let inner = &self.buf[start..self.pos];
        self.pos += 1;
        Ok(std::str::from_utf8(inner)?)
    }

    pub fn uint(&mut self) -> Result<u64> {
        let digits = self.braced()?;
        digits
            .parse()
            .map_err(|_| Error::Number(digits.to_owned()))
    }

    pub fn int(&mut self) -> Result<i32> {
        let digits = self.braced()?;
        digits
            .parse()
            .map_err(|_| Error::Number(digits.to_owned()))
    }

    pub fn float(&mut self) -> Result<f32> {
        let digits = self.braced()?;
        digits
            .parse()
            .map_err(|_| Error::Number(digits.to_owned()))
    }

    pub fn boolean(&mut self) -> Result<bool> {
        match self.braced()? {
            "0" => Ok(false),
            "1" => Ok(true),
            other => Err(Error::Number(other.to_owned())),
        }
    }

    pub fn string(&mut self) -> Result<String> {
        let len = self.uint()? as usize;
        let payload = self.raw(len)?;
        Ok(std::str::from_utf8(payload)?.to_owned())
    }
}
