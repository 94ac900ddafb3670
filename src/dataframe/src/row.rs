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

use eddy_common::catalog::Schema;
use eddy_common::types::{Cell, CellType};

use crate::visit::Fielder;

/// One row of a dataframe, bound to the dataframe's schema.
///
/// Rows exist to read and write whole tuples against a columnar store; they
/// are reused across iterations, so setters replace the cell outright.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    types: Vec<CellType>,
    cells: Vec<Cell>,
    index: Option<usize>,
}

impl Row {
    pub fn new(schema: &Schema) -> Self {
        Self {
            types: schema.types().to_vec(),
            cells: vec![Cell::Missing; schema.width()],
            index: None,
        }
    }

    /// Number of fields in the row.
    pub fn width(&self) -> usize {
        self.types.len()
    }

    pub fn types(&self) -> &[CellType] {
        &self.types
    }

    pub fn matches_schema(&self, schema: &Schema) -> bool {
        self.types == schema.types()
    }

    /// Position of this row in its dataframe, if known. Informational only.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn set_index(&mut self, index: usize) {
        self.index = Some(index);
    }

    fn check(&self, col: usize, expected: CellType) {
        assert!(col < self.width(), "column index {} out of bounds", col);
        assert_eq!(
            self.types[col],
            expected,
            "column {} holds {:?} fields",
            col,
            self.types[col]
        );
    }

    pub fn set_int(&mut self, col: usize, val: i32) {
        self.check(col, CellType::Int);
        self.cells[col] = Cell::Int(val);
    }

    pub fn set_bool(&mut self, col: usize, val: bool) {
        self.check(col, CellType::Bool);
        self.cells[col] = Cell::Bool(val);
    }

    pub fn set_float(&mut self, col: usize, val: f32) {
        self.check(col, CellType::Float);
        self.cells[col] = Cell::Float(val);
    }

    pub fn set_str(&mut self, col: usize, val: String) {
        self.check(col, CellType::Str);
        self.cells[col] = Cell::Str(val);
    }

    pub fn get_int(&self, col: usize) -> i32 {
        self.check(col, CellType::Int);
        self.cells[col].as_int()
    }

    pub fn get_bool(&self, col: usize) -> bool {
        self.check(col, CellType::Bool);
        self.cells[col].as_bool()
    }

    pub fn get_float(&self, col: usize) -> f32 {
        self.check(col, CellType::Float);
        self.cells[col].as_float()
    }

    pub fn get_str(&self, col: usize) -> &str {
        self.check(col, CellType::Str);
        self.cells[col].as_str()
    }

    pub fn cell(&self, col: usize) -> &Cell {
        &self.cells[col]
    }

    /// Replaces the cell at `col`. The cell must match the column type or be
    /// missing.
    pub fn set_cell(&mut self, col: usize, cell: Cell) {
        if let Some(ty) = cell.cell_type() {
            self.check(col, ty);
        }
        self.cells[col] = cell;
    }

    /// Drives `fielder` over every field, typed by the schema. Missing
    /// fields surface as their type's zero value.
    pub fn visit(&self, index: usize, fielder: &mut impl Fielder) {
        fielder.start(index);
        for (col, ty) in self.types.iter().enumerate() {
            match ty {
                CellType::Int => fielder.accept_int(self.cells[col].as_int()),
                CellType::Bool => fielder.accept_bool(self.cells[col].as_bool()),
                CellType::Float => fielder.accept_float(self.cells[col].as_float()),
                CellType::Str => fielder.accept_str(self.cells[col].as_str()),
            }
        }
        fielder.done();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get() {
        let schema = Schema::parse("IBFS");
        let mut row = Row::new(&schema);
        row.set_int(0, 4);
        row.set_bool(1, true);
        row.set_float(2, 2.5);
        row.set_str(3, "hi".to_owned());

        assert_eq!(row.get_int(0), 4);
        assert!(row.get_bool(1));
        assert_eq!(row.get_float(2), 2.5);
        assert_eq!(row.get_str(3), "hi");

        // Setters replace; a row is reused across iterations.
        row.set_int(0, 5);
        assert_eq!(row.get_int(0), 5);
    }

    #[test]
    #[should_panic(expected = "holds Int fields")]
    fn test_typed_access_is_checked() {
        let row = Row::new(&Schema::parse("I"));
        row.get_bool(0);
    }

    #[test]
    fn test_unset_fields_read_as_zero() {
        let row = Row::new(&Schema::parse("IS"));
        assert_eq!(row.get_int(0), 0);
        assert_eq!(row.get_str(1), "");
    }

    #[test]
    fn test_visit_order_and_types() {
        #[derive(Default)]
        struct Trace(Vec<String>);
        impl Fielder for Trace {
            fn start(&mut self, row_index: usize) {
                self.0.push(format!("start {}", row_index));
            }
            fn accept_int(&mut self, v: i32) {
                self.0.push(format!("int {}", v));
            }
            fn accept_str(&mut self, v: &str) {
                self.0.push(format!("str {}", v));
            }
            fn done(&mut self) {
                self.0.push("done".to_owned());
            }
        }

        let schema = Schema::parse("IS");
        let mut row = Row::new(&schema);
        row.set_int(0, 9);
        row.set_str(1, "w".to_owned());

        let mut trace = Trace::default();
        row.visit(3, &mut trace);
        assert_eq!(trace.0, ["start 3", "int 9", "str w", "done"]);
    }
}
