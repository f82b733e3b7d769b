pub(self) mod block;
pub(self) mod decoder;
pub(self) mod pending;
pub(self) mod set;
pub(self) mod stats;
pub(self) mod store;
pub(self) mod tag_cache;

use thiserror::Error;

pub use block::{BlockId, CacheBlock};
pub use decoder::AddressDecoder;
pub use pending::PendingQueue;
pub use set::{CacheSet, CmEntry};
pub use stats::{CacheStatistics, Statistics, TagStats};
pub use store::ShepherdTags;
pub use tag_cache::ShepherdTagCache;

/// A construction-time precondition failure. Everything past construction
/// is either a miss (not an error) or fatal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("block size must be at least 4 bytes and a power of two, got {0}")]
    BlockSize(usize),
    #[error("number of sets must be non-zero and a power of two, got {0}")]
    NumSets(usize),
    #[error("associativity must be greater than zero")]
    Associativity,
    #[error("hit latency must be greater than zero")]
    HitLatency,
    #[error("shepherd ways must satisfy 0 < sc < assoc, got sc {sc} with associativity {assoc}")]
    ScAssociativity { sc: usize, assoc: usize },
    #[error("max owners must be greater than zero")]
    MaxOwners,
}

/// A memory request as it travels between requesters, the cache and memory.
#[derive(Debug, Clone)]
pub struct MemReq {
    pub addr: u64,
    pub id: usize,
    pub owner: usize,
    pub is_write: bool,
}

/// An evicted dirty line the host must push down to memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Writeback {
    pub addr: u64,
    pub owner: usize,
}

/// Victim selection threads this through for the host to fill; the tag
/// store itself never appends to it.
pub type WritebackList = Vec<Writeback>;

/// Status shared by every component in a simulation run.
#[derive(Debug, Default)]
pub struct SimStatus {
    pub statistics: Statistics,
    current_mem_req_id: usize,
}

impl SimStatus {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn next_mem_id(&mut self) -> usize {
        self.current_mem_req_id += 1;
        self.current_mem_req_id
    }
}
