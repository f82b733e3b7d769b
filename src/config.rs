use std::fs;

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};

/// Geometry and latency of the Shepherd tag store.
///
/// `sc_associativity` is the number of Shepherd ways per set; the remaining
/// `associativity - sc_associativity` ways form the Main Cache.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TagStoreConfig {
    pub sets: usize,
    pub associativity: usize,
    pub block_size: usize,
    pub sc_associativity: usize,
    pub hit_latency: usize,
    /// number of distinct requester ids tracked by the occupancy counters
    pub max_owners: usize,
}

impl Default for TagStoreConfig {
    fn default() -> Self {
        TagStoreConfig {
            sets: 8192,
            associativity: 16,
            block_size: 64,
            sc_associativity: 4,
            hit_latency: 15,
            max_owners: 8,
        }
    }
}

/// the config for the cache simulation
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub miss_latency: usize,
    pub channel_size: usize,
    pub tag_store: TagStoreConfig,
}

impl Default for Config {
    /// build a default config: an LLC-like 8M tag store with fixed latencies
    fn default() -> Self {
        Config {
            tag_store: TagStoreConfig::default(),
            miss_latency: 120,
            channel_size: 16,
        }
    }
}

impl Config {
    pub fn from_config_file(config_file: &str) -> Result<Config> {
        let config_file = fs::read_to_string(config_file).wrap_err("cannot read config file")?;
        let config: Config =
            toml::from_str(&config_file).wrap_err("cannot deserialize to Config")?;
        Ok(config)
    }
}

#[cfg(test)]
mod test {
    use std::fs;

    use super::Config;

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let content = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&content).unwrap();
        assert_eq!(parsed.tag_store.sets, config.tag_store.sets);
        assert_eq!(parsed.tag_store.sc_associativity, config.tag_store.sc_associativity);
        assert_eq!(parsed.miss_latency, config.miss_latency);
    }

    #[test]
    fn test_missing_config_file() {
        let err = Config::from_config_file("no_such_config.toml").unwrap_err();
        assert!(err.to_string().contains("cannot read config file"));
    }

    #[test]
    #[ignore]
    fn test_generate_config_file() {
        let config = Config::default();
        let config_file = "shepherd_config_sample.toml";
        let content = toml::to_string_pretty(&config).unwrap();
        fs::write(config_file, content).unwrap();
    }
}
