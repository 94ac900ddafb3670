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

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Store(#[from] eddy_store::Error),

    #[error("codec error: {0}")]
    Codec(#[from] eddy_common::codec::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed input file: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, Error>;
