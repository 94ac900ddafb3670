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

//! Typed columnar dataframes materialized over the distributed K/V plane:
//! chunked columns, row visitors, and the dataframe-level store façade.

pub mod column;
pub mod dist_vec;
pub mod error;
pub mod frame;
pub mod row;
mod sor;
pub mod store;
pub mod visit;

pub use column::Column;
pub use error::{Error, Result};
pub use frame::DataFrame;
pub use row::Row;
pub use store::FrameStore;
pub use visit::{Fielder, Rower, Writer};
