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
use std::ops::Index;

use crate::types::CellType;

/// Ordered column types of a dataframe.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Schema {
    types: Vec<CellType>,
}

impl Schema {
    pub fn new(types: Vec<CellType>) -> Self {
        Self { types }
    }

    /// Parses a type string such as `"IBFS"`. Characters outside the four
    /// type tags are a programming error.
    pub fn parse(types: &str) -> Self {
        let types = types
            .chars()
            .map(|c| {
                CellType::from_char(c).unwrap_or_else(|| panic!("invalid type character {:?}", c))
            })
            .collect();
        Self { types }
    }

    pub fn add(&mut self, ty: CellType) {
        self.types.push(ty);
    }

    pub fn col_type(&self, idx: usize) -> CellType {
        self.types[idx]
    }

    /// The number of columns.
    pub fn width(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn types(&self) -> &[CellType] {
        &self.types
    }
}

impl Index<usize> for Schema {
    type Output = CellType;

    fn index(&self, index: usize) -> &Self::Output {
        &self.types[index]
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ty in &self.types {
            write!(f, "{}", ty.as_char())?;
        }
        Ok(())
    }
}

#[allow(dead_code)]
pub mod test_utils {
    use super::*;

    /// Schema with two int columns, for tests.
    pub fn ii() -> Schema {
        Schema::parse("II")
    }

    /// Schema with an int and a string column, for tests.
    pub fn is() -> Schema {
        Schema::parse("IS")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_width() {
        let schema = Schema::parse("IBFS");
        assert_eq!(schema.width(), 4);
        assert_eq!(schema[0], CellType::Int);
        assert_eq!(schema[3], CellType::Str);
        assert_eq!(format!("{:?}", schema), "IBFS");
    }

    #[test]
    fn test_equality_is_sequence_equality() {
        let mut grown = Schema::default();
        grown.add(CellType::Int);
        grown.add(CellType::Str);
        assert_eq!(grown, Schema::parse("IS"));
        assert_ne!(grown, Schema::parse("SI"));
    }

    #[test]
    #[should_panic(expected = "invalid type character")]
    fn test_invalid_type_char() {
        Schema::parse("IX");
    }
}
