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

use std::sync::Arc;

use eddy_common::catalog::Key;
use eddy_common::codec::{Decoder, Encoder, Error as CodecError};
use eddy_common::types::{Cell, CellType};
use eddy_store::KvNode;

use crate::dist_vec::DistVec;
use crate::error::Result;

/// One typed column of a dataframe, backed by a [`DistVec`].
///
/// Typed pushes and reads check the column type strictly; a missing cell is
/// accepted by any column and reads back as the type's zero value.
#[derive(Debug)]
pub struct Column {
    ty: CellType,
    data: DistVec,
}

impl Column {
    pub fn new(ty: CellType, kv: Arc<KvNode>, anchor: &Key) -> Self {
        Self {
            ty,
            data: DistVec::new(kv, anchor),
        }
    }

    pub fn cell_type(&self) -> CellType {
        self.ty
    }

    pub fn size(&self) -> usize {
        self.data.size()
    }

    pub fn is_sealed(&self) -> bool {
        self.data.is_sealed()
    }

    /// Index of the node holding row `index` of this column.
    pub fn home_of(&self, index: usize) -> usize {
        self.data.home_of(index)
    }

    fn check(&self, expected: CellType) {
        assert_eq!(
            self.ty, expected,
            "column holds {:?} fields",
            self.ty
        );
    }

    pub async fn push_int(&mut self, val: i32) -> Result<()> {
        self.check(CellType::Int);
        self.data.append(Cell::Int(val)).await
    }

    pub async fn push_bool(&mut self, val: bool) -> Result<()> {
        self.check(CellType::Bool);
        self.data.append(Cell::Bool(val)).await
    }

    pub async fn push_float(&mut self, val: f32) -> Result<()> {
        self.check(CellType::Float);
        self.data.append(Cell::Float(val)).await
    }

    pub async fn push_str(&mut self, val: String) -> Result<()> {
        self.check(CellType::Str);
        self.data.append(Cell::Str(val)).await
    }

    /// Appends a missing field.
    pub async fn push_missing(&mut self) -> Result<()> {
        self.data.append(Cell::Missing).await
    }

    /// Appends any cell matching the column type; missing always fits.
    pub async fn push_cell(&mut self, cell: Cell) -> Result<()> {
        if let Some(ty) = cell.cell_type() {
            self.check(ty);
        }
        self.data.append(cell).await
    }

    pub async fn get_int(&self, index: usize) -> Result<i32> {
        self.check(CellType::Int);
        Ok(self.data.get(index).await?.as_int())
    }

    pub async fn get_bool(&self, index: usize) -> Result<bool> {
        self.check(CellType::Bool);
        Ok(self.data.get(index).await?.as_bool())
    }

    pub async fn get_float(&self, index: usize) -> Result<f32> {
        self.check(CellType::Float);
        Ok(self.data.get(index).await?.as_float())
    }

    pub async fn get_str(&self, index: usize) -> Result<String> {
        self.check(CellType::Str);
        Ok(self.data.get(index).await?.as_str().to_owned())
    }

    /// The raw cell at `index`, missing included.
    pub async fn cell(&self, index: usize) -> Result<Cell> {
        self.data.get(index).await
    }

    pub async fn lock(&mut self) -> Result<()> {
        self.data.lock().await
    }

    pub async fn unlock(&mut self) -> Result<()> {
        self.data.unlock().await
    }

    pub fn encode(&self, enc: &mut Encoder) {
        enc.tag(self.ty.as_char() as u8);
        self.data.encode(enc);
    }

    pub fn decode(
        dec: &mut Decoder<'_>,
        kv: Arc<KvNode>,
    ) -> eddy_common::codec::Result<Self> {
        let tag = dec.bump()? as char;
        let ty = CellType::from_char(tag).ok_or(CodecError::UnknownCellTag(tag))?;
        let data = DistVec::decode(dec, kv)?;
        Ok(Self { ty, data })
    }
}

impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        self.ty == other.ty && self.data == other.data
    }
}
