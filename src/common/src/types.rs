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

use crate::codec::{Decoder, Encoder, Error, Result};

/// The four concrete field types a column can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellType {
    Int,
    Bool,
    Float,
    Str,
}

impl CellType {
    pub fn as_char(self) -> char {
        match self {
            CellType::Int => 'I',
            CellType::Bool => 'B',
            CellType::Float => 'F',
            CellType::Str => 'S',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'I' => Some(CellType::Int),
            'B' => Some(CellType::Bool),
            'F' => Some(CellType::Float),
            'S' => Some(CellType::Str),
            _ => None,
        }
    }
}

/// A single dataframe field.
///
/// A cell starts out `Missing` and latches its type on first assignment via
/// the `set_*` methods. Reads of a `Missing` cell yield the type's zero
/// value and leave the cell untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Cell {
    Int(i32),
    Bool(bool),
    Float(f32),
    Str(String),
    #[default]
    Missing,
}

impl Cell {
    /// The concrete type of this cell, or `None` while it is missing.
    pub fn cell_type(&self) -> Option<CellType> {
        match self {
            Cell::Int(_) => Some(CellType::Int),
            Cell::Bool(_) => Some(CellType::Bool),
            Cell::Float(_) => Some(CellType::Float),
            Cell::Str(_) => Some(CellType::Str),
            Cell::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    pub fn set_int(&mut self, val: i32) {
        assert!(self.is_missing(), "cell type already latched to {:?}", self);
        *self = Cell::Int(val);
    }

    pub fn set_bool(&mut self, val: bool) {
        assert!(self.is_missing(), "cell type already latched to {:?}", self);
        *self = Cell::Bool(val);
    }

    pub fn set_float(&mut self, val: f32) {
        assert!(self.is_missing(), "cell type already latched to {:?}", self);
        *self = Cell::Float(val);
    }

    pub fn set_str(&mut self, val: String) {
        assert!(self.is_missing(), "cell type already latched to {:?}", self);
        *self = Cell::Str(val);
    }

    pub fn as_int(&self) -> i32 {
        match self {
            Cell::Int(v) => *v,
            Cell::Missing => 0,
            other => panic!("requested int from {:?} cell", other),
        }
    }

    pub fn as_bool(&self) -> bool {
        match self {
            Cell::Bool(v) => *v,
            Cell::Missing => false,
            other => panic!("requested bool from {:?} cell", other),
        }
    }

    pub fn as_float(&self) -> f32 {
        match self {
            Cell::Float(v) => *v,
            Cell::Missing => 0.0,
            other => panic!("requested float from {:?} cell", other),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Cell::Str(v) => v,
            Cell::Missing => "",
            other => panic!("requested string from {:?} cell", other),
        }
    }

    /// One tag byte, then the value in its primitive encoding. `Missing`
    /// is the bare tag.
    pub fn encode(&self, enc: &mut Encoder) {
        match self {
            Cell::Int(v) => {
                enc.tag(b'I');
                enc.int(*v);
            }
            Cell::Bool(v) => {
                enc.tag(b'B');
                enc.boolean(*v);
            }
            Cell::Float(v) => {
                enc.tag(b'F');
                enc.float(*v);
            }
            Cell::Str(v) => {
                enc.tag(b'S');
                enc.str(v);
            }
            Cell::Missing => enc.tag(b'U'),
        }
    }

    pub fn decode(dec: &mut Decoder<'_>) -> Result<Self> {
        let cell = match dec.bump()? {
            b'I' => Cell::Int(dec.int()?),
            b'B' => Cell::Bool(dec.boolean()?),
            b'F' => Cell::Float(dec.float()?),
            b'S' => Cell::Str(dec.string()?),
            b'U' => Cell::Missing,
            other => return Err(Error::UnknownCellTag(other as char)),
        };
        Ok(cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latch_on_first_set() {
        let mut cell = Cell::Missing;
        cell.set_int(7);
        assert_eq!(cell, Cell::Int(7));
        assert_eq!(cell.cell_type(), Some(CellType::Int));
    }

    #[test]
    #[should_panic(expected = "already latched")]
    fn test_double_set_panics() {
        let mut cell = Cell::Missing;
        cell.set_bool(true);
        cell.set_int(1);
    }

    #[test]
    fn test_missing_reads_zero_without_latching() {
        let cell = Cell::Missing;
        assert_eq!(cell.as_int(), 0);
        assert_eq!(cell.as_bool(), false);
        assert_eq!(cell.as_float(), 0.0);
        assert_eq!(cell.as_str(), "");
        // Reading must not mutate the cell.
        assert!(cell.is_missing());
    }

    #[test]
    #[should_panic(expected = "requested int")]
    fn test_type_mismatch_panics() {
        Cell::Str("x".to_owned()).as_int();
    }

    #[test]
    fn test_cell_roundtrip() {
        for cell in [
            Cell::Int(-42),
            Cell::Bool(true),
            Cell::Float(2.5),
            Cell::Str("hello".to_owned()),
            Cell::Missing,
        ] {
            let mut enc = Encoder::new();
            cell.encode(&mut enc);
            let blob = enc.finish();
            let mut dec = Decoder::new(&blob);
            assert_eq!(Cell::decode(&mut dec).unwrap(), cell);
            assert!(dec.is_done());
        }
    }
}
