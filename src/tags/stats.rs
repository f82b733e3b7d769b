use serde::{Deserialize, Serialize};

/// Scalar counters kept by the tag store and read by the host.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct TagStats {
    /// distinct tags currently live
    pub tags_in_use: u64,
    /// valid lines overwritten by an insert
    pub replacements: u64,
    /// references accumulated over replaced and surviving lines
    pub total_refs: u64,
    /// lines that contributed to total_refs
    pub sampled_refs: u64,
    /// live lines per requester id
    pub occupancies: Vec<u64>,
    pub warmed_up: bool,
    /// cycle at which every tag had been touched once
    pub warmup_cycle: usize,
}

impl TagStats {
    pub fn new(max_owners: usize) -> Self {
        TagStats {
            occupancies: vec![0; max_owners],
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct CacheStatistics {
    pub cache_hits: usize,
    pub cache_misses: usize,
}

/// Run-wide statistics shared by every simulated component.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Statistics {
    pub total_cycle: usize,
    pub llc: CacheStatistics,
}

impl Statistics {
    pub fn update_hit(&mut self) {
        self.llc.cache_hits += 1;
    }
    pub fn update_miss(&mut self) {
        self.llc.cache_misses += 1;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_save_statistics() {
        let mut stat = Statistics::default();
        stat.update_hit();
        stat.update_miss();
        stat.update_miss();
        let json = serde_json::to_string_pretty(&stat).unwrap();
        let parsed: Statistics = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.llc.cache_hits, 1);
        assert_eq!(parsed.llc.cache_misses, 2);
    }

    #[test]
    fn tag_stats_sized_by_owner_count() {
        let stats = TagStats::new(4);
        assert_eq!(stats.occupancies, vec![0; 4]);
        assert!(!stats.warmed_up);
    }
}
