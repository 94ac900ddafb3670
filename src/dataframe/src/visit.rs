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

//! Visitor seams between the dataframe engine and applications.

use crate::row::Row;

/// Field visitor invoked by [`Row::visit`]. Implementations override the
/// accessors for the types they care about.
pub trait Fielder {
    /// Called before the fields, with the row's offset in the dataframe.
    fn start(&mut self, _row_index: usize) {}

    fn accept_int(&mut self, _v: i32) {}
    fn accept_bool(&mut self, _v: bool) {}
    fn accept_float(&mut self, _v: f32) {}
    fn accept_str(&mut self, _v: &str) {}

    /// Called once every field has been seen.
    fn done(&mut self) {}
}

/// Row visitor for `map`, `local_map` and `filter`.
pub trait Rower {
    /// Called once per row. The row is on loan and will be overwritten for
    /// the next call. The return value is the `filter` predicate.
    fn accept(&mut self, row: &Row) -> bool;
}

/// Pull-based row producer driving [`crate::frame::DataFrame::from_visitor`].
pub trait Writer {
    /// Fills the next row in place.
    fn visit(&mut self, row: &mut Row);

    /// True once there are no more rows to produce.
    fn done(&mut self) -> bool;
}
