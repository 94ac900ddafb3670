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

//! Typed columnar tables over the distributed K/V plane.

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use eddy_common::catalog::{Key, KeyBuilder, Schema};
use eddy_common::codec::{Decoder, Encoder};
use eddy_common::types::{Cell, CellType};
use eddy_store::KvNode;

use crate::column::Column;
use crate::error::Result;
use crate::row::Row;
use crate::sor;
use crate::store::FrameStore;
use crate::visit::{Rower, Writer};

/// A table of equal-length typed columns, sharded chunk-wise across the
/// cluster.
///
/// The dataframe owns its column anchor keys (derived from its own key) and
/// a handle to the local store node; rows are materialized on demand by
/// pulling the owning chunks back through the K/V plane.
pub struct DataFrame {
    schema: Schema,
    columns: Vec<Column>,
    nrows: usize,
    kv: Arc<KvNode>,
    key: Key,
}

impl DataFrame {
    /// A dataframe with one empty open column per schema entry. Column `i`
    /// anchors its chunk keys at `<key>-c<i>`.
    pub fn new(schema: Schema, kv: Arc<KvNode>, key: Key) -> Self {
        let mut builder = KeyBuilder::new(&key);
        let columns = schema
            .types()
            .iter()
            .enumerate()
            .map(|(i, &ty)| {
                let anchor = builder.push("-c").push(i).build(kv.this_node());
                Column::new(ty, kv.clone(), &anchor)
            })
            .collect();
        Self {
            schema,
            columns,
            nrows: 0,
            kv,
            key,
        }
    }

    /// A dataframe with no columns yet; the schema grows as columns are
    /// added.
    pub fn empty(kv: Arc<KvNode>, key: Key) -> Self {
        Self {
            schema: Schema::default(),
            columns: Vec::new(),
            nrows: 0,
            kv,
            key,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub async fn get_int(&self, col: usize, row: usize) -> Result<i32> {
        self.columns[col].get_int(row).await
    }

    pub async fn get_bool(&self, col: usize, row: usize) -> Result<bool> {
        self.columns[col].get_bool(row).await
    }

    pub async fn get_float(&self, col: usize, row: usize) -> Result<f32> {
        self.columns[col].get_float(row).await
    }

    pub async fn get_str(&self, col: usize, row: usize) -> Result<String> {
        self.columns[col].get_str(row).await
    }

    /// Index of the node holding row `row`. Every column of a row lives on
    /// the same node, so the first column answers for all of them.
    pub fn home_of_row(&self, row: usize) -> usize {
        assert!(!self.columns.is_empty(), "dataframe has no columns");
        self.columns[0].home_of(row)
    }

    /// Appends one row across all columns. With `last` set, every column is
    /// sealed afterwards and the dataframe becomes readable.
    pub async fn add_row(&mut self, row: &Row, last: bool) -> Result<()> {
        assert!(
            row.matches_schema(&self.schema),
            "row schema does not match the dataframe"
        );
        for (j, col) in self.columns.iter_mut().enumerate() {
            col.push_cell(row.cell(j).clone()).await?;
        }
        self.nrows += 1;
        if last {
            self.seal().await?;
        }
        Ok(())
    }

    /// Appends `col` as the rightmost column, padding with missing cells so
    /// every column ends up `max(nrows, col.size())` long. Extends the
    /// schema when the column is new to it.
    pub async fn add_column(&mut self, mut col: Column) -> Result<()> {
        if col.size() < self.nrows {
            pad_column(&mut col, self.nrows).await?;
        } else if col.size() > self.nrows {
            self.nrows = col.size();
            for existing in &mut self.columns {
                pad_column(existing, self.nrows).await?;
            }
        }
        let ty = col.cell_type();
        self.columns.push(col);
        if self.columns.len() > self.schema.width() {
            self.schema.add(ty);
        }
        Ok(())
    }

    /// Copies row `index` of every column into `row`.
    pub async fn fill_row(&self, index: usize, row: &mut Row) -> Result<()> {
        assert!(
            row.matches_schema(&self.schema),
            "row schema does not match the dataframe"
        );
        for (j, col) in self.columns.iter().enumerate() {
            row.set_cell(j, col.cell(index).await?);
        }
        row.set_index(index);
        Ok(())
    }

    /// Visits every row in order.
    pub async fn map(&self, rower: &mut impl Rower) -> Result<()> {
        let mut row = Row::new(&self.schema);
        for i in 0..self.nrows {
            self.fill_row(i, &mut row).await?;
            rower.accept(&row);
        }
        Ok(())
    }

    /// Visits only the rows whose chunks live on this node. This is the
    /// affinity primitive: applications use it to compute where the data
    /// already resides.
    pub async fn local_map(&self, rower: &mut impl Rower) -> Result<()> {
        let mut row = Row::new(&self.schema);
        for i in 0..self.nrows {
            if self.home_of_row(i) != self.kv.this_node() {
                continue;
            }
            self.fill_row(i, &mut row).await?;
            rower.accept(&row);
        }
        Ok(())
    }

    /// Streams the rows `rower` accepts into a fresh, sealed dataframe with
    /// the same schema. The result anchors its chunks under a derived key so
    /// it cannot collide with this dataframe's chunks.
    pub async fn filter(&self, rower: &mut impl Rower) -> Result<DataFrame> {
        let anchor = Key::new(format!("{}-f", self.key.id()), self.key.home());
        let mut out = DataFrame::new(self.schema.clone(), self.kv.clone(), anchor);
        let mut row = Row::new(&self.schema);
        for i in 0..self.nrows {
            self.fill_row(i, &mut row).await?;
            if rower.accept(&row) {
                out.add_row(&row, false).await?;
            }
        }
        out.seal().await?;
        Ok(out)
    }

    /// Seals every still-open column.
    pub async fn seal(&mut self) -> Result<()> {
        for col in &mut self.columns {
            if !col.is_sealed() {
                col.lock().await?;
            }
        }
        Ok(())
    }

    /// The dataframe's serialized form: its columns, bracket-framed. Chunks
    /// are not inlined; they are already resident in the store.
    pub fn encode(&self) -> Bytes {
        let mut enc = Encoder::new();
        enc.tag(b'[');
        for col in &self.columns {
            col.encode(&mut enc);
        }
        enc.tag(b']');
        enc.finish()
    }

    pub fn decode(blob: &[u8], kv: Arc<KvNode>, key: Key) -> Result<DataFrame> {
        let mut dec = Decoder::new(blob);
        let mut df = DataFrame::empty(kv.clone(), key);
        dec.expect(b'[')?;
        while dec.peek()? != b']' {
            let col = Column::decode(&mut dec, kv.clone())?;
            if df.columns.is_empty() {
                df.nrows = col.size();
            }
            df.schema.add(col.cell_type());
            df.columns.push(col);
        }
        dec.expect(b']')?;
        Ok(df)
    }

    /// Stores the serialized dataframe under its own key.
    pub async fn publish(&self) -> Result<()> {
        self.kv.put(&self.key, self.encode()).await?;
        Ok(())
    }

    /// One sealed int column holding `vals`, published under `key`.
    pub async fn from_int_slice(key: &Key, store: &FrameStore, vals: &[i32]) -> Result<DataFrame> {
        from_single_column(
            key,
            store,
            CellType::Int,
            vals.iter().map(|&v| Cell::Int(v)),
        )
        .await
    }

    pub async fn from_bool_slice(
        key: &Key,
        store: &FrameStore,
        vals: &[bool],
    ) -> Result<DataFrame> {
        from_single_column(
            key,
            store,
            CellType::Bool,
            vals.iter().map(|&v| Cell::Bool(v)),
        )
        .await
    }

    pub async fn from_float_slice(
        key: &Key,
        store: &FrameStore,
        vals: &[f32],
    ) -> Result<DataFrame> {
        from_single_column(
            key,
            store,
            CellType::Float,
            vals.iter().map(|&v| Cell::Float(v)),
        )
        .await
    }

    pub async fn from_str_slice(key: &Key, store: &FrameStore, vals: &[&str]) -> Result<DataFrame> {
        from_single_column(
            key,
            store,
            CellType::Str,
            vals.iter().map(|&v| Cell::Str(v.to_owned())),
        )
        .await
    }

    pub async fn from_int_scalar(key: &Key, store: &FrameStore, val: i32) -> Result<DataFrame> {
        Self::from_int_slice(key, store, &[val]).await
    }

    pub async fn from_bool_scalar(key: &Key, store: &FrameStore, val: bool) -> Result<DataFrame> {
        Self::from_bool_slice(key, store, &[val]).await
    }

    pub async fn from_float_scalar(key: &Key, store: &FrameStore, val: f32) -> Result<DataFrame> {
        Self::from_float_slice(key, store, &[val]).await
    }

    pub async fn from_str_scalar(key: &Key, store: &FrameStore, val: &str) -> Result<DataFrame> {
        Self::from_str_slice(key, store, &[val]).await
    }

    /// Pulls rows from `writer` until it reports completion, then seals and
    /// publishes the dataframe.
    pub async fn from_visitor(
        key: &Key,
        store: &FrameStore,
        types: &str,
        writer: &mut impl Writer,
    ) -> Result<DataFrame> {
        let schema = Schema::parse(types);
        let mut df = DataFrame::new(schema.clone(), store.kv().clone(), key.clone());
        let mut row = Row::new(&schema);
        while !writer.done() {
            writer.visit(&mut row);
            df.add_row(&row, false).await?;
        }
        df.seal().await?;
        df.publish().await?;
        Ok(df)
    }

    /// Reads a schema-on-read file (at most `max_bytes` of it), infers the
    /// schema, and builds and publishes the dataframe.
    pub async fn from_file(
        path: &Path,
        key: &Key,
        store: &FrameStore,
        max_bytes: Option<u64>,
    ) -> Result<DataFrame> {
        let table = sor::parse_file(path, max_bytes)?;
        let mut df = DataFrame::new(table.schema.clone(), store.kv().clone(), key.clone());
        let mut row = Row::new(&table.schema);
        for cells in table.rows {
            for (j, cell) in cells.into_iter().enumerate() {
                row.set_cell(j, cell);
            }
            df.add_row(&row, false).await?;
        }
        df.seal().await?;
        df.publish().await?;
        Ok(df)
    }
}

impl PartialEq for DataFrame {
    fn eq(&self, other: &Self) -> bool {
        self.schema == other.schema && self.nrows == other.nrows && self.columns == other.columns
    }
}

impl std::fmt::Debug for DataFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataFrame")
            .field("schema", &self.schema)
            .field("nrows", &self.nrows)
            .field("key", &self.key)
            .field("columns", &self.columns)
            .finish()
    }
}

async fn pad_column(col: &mut Column, target: usize) -> Result<()> {
    col.unlock().await?;
    while col.size() < target {
        col.push_missing().await?;
    }
    col.lock().await
}

async fn from_single_column(
    key: &Key,
    store: &FrameStore,
    ty: CellType,
    cells: impl Iterator<Item = Cell>,
) -> Result<DataFrame> {
    let kv = store.kv().clone();
    let mut builder = KeyBuilder::new(key);
    let anchor = builder.push("-c0").build(kv.this_node());
    let mut col = Column::new(ty, kv.clone(), &anchor);
    for cell in cells {
        col.push_cell(cell).await?;
    }
    col.lock().await?;

    let mut df = DataFrame::empty(kv, key.clone());
    df.add_column(col).await?;
    df.publish().await?;
    Ok(df)
}
