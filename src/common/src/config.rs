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

use std::path::Path;

use serde::Deserialize;

/// Number of cells held by one column chunk.
pub const CHUNK_SIZE: usize = 5000;

/// Port every node listens on. Nodes are distinguished by loopback IP, not
/// by port.
pub const DEFAULT_PORT: u16 = 8080;

/// Upper bound on cluster size supported by the deterministic `127.0.0.x`
/// addressing scheme.
pub const MAX_NODES: usize = 6;

/// Tunables for a single store node. All fields have defaults so an empty
/// config file (or none at all) is valid.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Port the node binds and peers connect to.
    pub listen_port: u16,

    /// How long to wait after bootstrap for peer registration to settle.
    pub warmup_millis: u64,

    /// Backoff between attempts to reach a peer that is not up yet.
    pub connect_retry_millis: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            listen_port: DEFAULT_PORT,
            warmup_millis: 1000,
            connect_retry_millis: 1000,
        }
    }
}

/// Loads the node configuration, falling back to defaults when no path is
/// given. A present-but-malformed file is a startup error.
pub fn load_config(path: Option<&Path>) -> StoreConfig {
    let Some(path) = path else {
        return StoreConfig::default();
    };
    let raw = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("failed to read config file {}: {}", path.display(), e));
    toml::from_str(&raw)
        .unwrap_or_else(|e| panic!("failed to parse config file {}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.listen_port, DEFAULT_PORT);
        assert_eq!(config.warmup_millis, 1000);
    }

    #[test]
    fn test_parse_config() {
        let config: StoreConfig = toml::from_str("listen_port = 9090").unwrap();
        assert_eq!(config.listen_port, 9090);
        // Unset fields keep their defaults.
        assert_eq!(config.connect_retry_millis, 1000);
    }
}
