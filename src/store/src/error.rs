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

use eddy_common::codec;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("codec error: {0}")]
    Codec(#[from] codec::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("key {key:?} is homed on node {home} but was routed to node {node}")]
    WrongHome { key: String, home: usize, node: usize },

    #[error("no value for key {0:?} in the local map")]
    KeyNotFound(String),

    #[error("protocol violation: {0}")]
    Protocol(String),

    #[error("node is shutting down")]
    Shutdown,
}

pub type Result<T> = std::result::Result<T, Error>;
