use tracing::debug;

use crate::config::TagStoreConfig;

use super::{
    block::{BlockId, CacheBlock},
    decoder::AddressDecoder,
    set::{CacheSet, CmEntry},
    stats::TagStats,
    ConfigError, WritebackList,
};

/// The Shepherd tag store.
///
/// Every set keeps `sc_assoc` Shepherd ways that watch reference order for
/// recently filled lines and `assoc - sc_assoc` Main Cache ways for lines
/// pushed out of SC. Blocks and line data live in flat per-store arrays;
/// the sets carry only replacement bookkeeping.
#[derive(Debug)]
pub struct ShepherdTags {
    num_sets_total: usize,
    blk_size: usize,
    assoc: usize,
    sc_assoc: usize,
    mc_assoc: usize,
    hit_latency: usize,
    max_owners: usize,
    warmup_bound: u64,
    decoder: AddressDecoder,
    pub(crate) sets: Vec<CacheSet>,
    pub(crate) blocks: Vec<CacheBlock>,
    data: Vec<u8>,
    stats: TagStats,
}

impl ShepherdTags {
    pub fn new(
        num_sets_total: usize,
        block_size: usize,
        assoc: usize,
        hit_latency: usize,
        num_sets_sc: usize,
    ) -> Result<Self, ConfigError> {
        Self::from_config(&TagStoreConfig {
            sets: num_sets_total,
            associativity: assoc,
            block_size,
            sc_associativity: num_sets_sc,
            hit_latency,
            ..TagStoreConfig::default()
        })
    }

    pub fn from_config(config: &TagStoreConfig) -> Result<Self, ConfigError> {
        let TagStoreConfig {
            sets: num_sets_total,
            associativity: assoc,
            block_size,
            sc_associativity: sc_assoc,
            hit_latency,
            max_owners,
        } = config.clone();
        if assoc == 0 {
            return Err(ConfigError::Associativity);
        }
        if hit_latency == 0 {
            return Err(ConfigError::HitLatency);
        }
        if sc_assoc == 0 || sc_assoc >= assoc {
            return Err(ConfigError::ScAssociativity {
                sc: sc_assoc,
                assoc,
            });
        }
        if max_owners == 0 {
            return Err(ConfigError::MaxOwners);
        }
        let decoder = AddressDecoder::new(num_sets_total, block_size)?;

        let num_blocks = num_sets_total * assoc;
        let mut sets = Vec::with_capacity(num_sets_total);
        let mut blocks = Vec::with_capacity(num_blocks);
        for set_index in 0..num_sets_total {
            sets.push(CacheSet::new(set_index, assoc, sc_assoc));
            for way in 0..assoc {
                let data_offset = (set_index * assoc + way) * block_size;
                blocks.push(CacheBlock::new(set_index, data_offset));
            }
        }
        Ok(ShepherdTags {
            num_sets_total,
            blk_size: block_size,
            assoc,
            sc_assoc,
            mc_assoc: assoc - sc_assoc,
            hit_latency,
            max_owners,
            warmup_bound: num_blocks as u64,
            decoder,
            sets,
            blocks,
            data: vec![0; num_blocks * block_size],
            stats: TagStats::new(max_owners),
        })
    }

    pub fn get_block_size(&self) -> usize {
        self.blk_size
    }

    /// sub-blocking is not modeled, the sub-block is the block
    pub fn get_sub_block_size(&self) -> usize {
        self.blk_size
    }

    pub fn get_hit_latency(&self) -> usize {
        self.hit_latency
    }

    pub fn num_sets(&self) -> usize {
        self.num_sets_total
    }

    pub fn associativity(&self) -> usize {
        self.assoc
    }

    pub fn sc_associativity(&self) -> usize {
        self.sc_assoc
    }

    pub fn mc_associativity(&self) -> usize {
        self.mc_assoc
    }

    pub fn stats(&self) -> &TagStats {
        &self.stats
    }

    pub fn extract_tag(&self, addr: u64) -> u64 {
        self.decoder.extract_tag(addr)
    }

    pub fn extract_set(&self, addr: u64) -> usize {
        self.decoder.extract_set(addr)
    }

    pub fn extract_offset(&self, addr: u64) -> usize {
        self.decoder.extract_offset(addr)
    }

    pub fn block_align(&self, addr: u64) -> u64 {
        self.decoder.block_align(addr)
    }

    pub fn regenerate_block_addr(&self, tag: u64, set: usize) -> u64 {
        self.decoder.regenerate_block_addr(tag, set)
    }

    pub fn block(&self, id: BlockId) -> &CacheBlock {
        &self.blocks[id.set * self.assoc + id.way]
    }

    pub fn block_mut(&mut self, id: BlockId) -> &mut CacheBlock {
        &mut self.blocks[id.set * self.assoc + id.way]
    }

    pub fn block_data(&self, id: BlockId) -> &[u8] {
        let offset = self.block(id).data_offset;
        &self.data[offset..offset + self.blk_size]
    }

    pub fn block_data_mut(&mut self, id: BlockId) -> &mut [u8] {
        let offset = self.block(id).data_offset;
        &mut self.data[offset..offset + self.blk_size]
    }

    /// Look up `addr` and update replacement state on a hit: every SC
    /// column still waiting on the FIFO-head way gets stamped with its
    /// next counter value. Returns the hit block and the access latency.
    pub fn access(&mut self, addr: u64, owner: usize, now: usize) -> (Option<BlockId>, usize) {
        self.check_owner(owner);
        let tag = self.decoder.extract_tag(addr);
        let set_index = self.decoder.extract_set(addr);
        let assoc = self.assoc;
        let way = self.sets[set_index]
            .find_block(tag, &self.blocks[set_index * assoc..(set_index + 1) * assoc]);
        let way = match way {
            Some(way) => way,
            None => return (None, self.hit_latency),
        };

        // the imminence update is keyed to the FIFO-head way, not the way
        // that hit
        let head_way = self.sets[set_index].sc_fifo_head();
        let set = &mut self.sets[set_index];
        for col in 0..self.sc_assoc {
            if set.cm(head_way, col) == CmEntry::Empty {
                let stamp = set.nvc[col];
                debug!(
                    set = set_index,
                    way = head_way,
                    col,
                    stamp,
                    "stamping count matrix on hit"
                );
                set.set_cm(head_way, col, CmEntry::Stamp(stamp));
                set.nvc[col] += 1;
            }
        }

        let blk = &mut self.blocks[set_index * assoc + way];
        blk.ref_count += 1;
        let mut lat = self.hit_latency;
        if blk.when_ready > now && blk.when_ready - now > self.hit_latency {
            lat = blk.when_ready - now;
        }
        (Some(BlockId { set: set_index, way }), lat)
    }

    /// side-effect-free tag match
    pub fn find_block(&self, addr: u64) -> Option<BlockId> {
        let tag = self.decoder.extract_tag(addr);
        let set_index = self.decoder.extract_set(addr);
        let assoc = self.assoc;
        self.sets[set_index]
            .find_block(tag, &self.blocks[set_index * assoc..(set_index + 1) * assoc])
            .map(|way| BlockId { set: set_index, way })
    }

    /// Pick the way an incoming fill will overwrite. New lines always land
    /// in SC; when SC is full its oldest line is demoted to MC, which may
    /// in turn evict the least imminent line of the whole set. The
    /// writeback list is filled by the caller, never here.
    pub fn find_victim(&mut self, addr: u64, _writebacks: &mut WritebackList) -> BlockId {
        let set_index = self.decoder.extract_set(addr);
        let assoc = self.assoc;

        // an empty SC way takes the fill directly
        for way in 0..assoc {
            if self.sets[set_index].sc_flag[way] && !self.blocks[set_index * assoc + way].valid {
                return BlockId { set: set_index, way };
            }
        }

        // otherwise the oldest SC line makes room by moving to MC
        let candidate = self.sc_victim_candidate(set_index);
        debug!(set = set_index, candidate, "demoting SC way to make room");
        self.demote_and_pick(set_index, candidate)
    }

    /// first valid SC way in FIFO order, oldest column first
    fn sc_victim_candidate(&self, set_index: usize) -> usize {
        let set = &self.sets[set_index];
        for step in 0..self.sc_assoc {
            let col = set.sc_queue[(set.least_imm_sc_ptr + step) % self.sc_assoc];
            for way in 0..self.assoc {
                if set.sc_ptr[way] == Some(col)
                    && self.blocks[set_index * self.assoc + way].valid
                {
                    return way;
                }
            }
        }
        panic!("set {set_index}: no valid SC way to demote");
    }

    fn demote_and_pick(&mut self, set_index: usize, candidate: usize) -> BlockId {
        let assoc = self.assoc;
        // an empty MC way joins SC in the candidate's place, keeping the
        // SC and MC way counts intact
        for way in 0..assoc {
            if !self.sets[set_index].sc_flag[way] && !self.blocks[set_index * assoc + way].valid {
                let set = &mut self.sets[set_index];
                set.sc_ptr[way] = set.sc_ptr[candidate];
                set.sc_flag[way] = true;
                set.sc_flag[candidate] = false;
                set.sc_ptr[candidate] = None;
                return BlockId { set: set_index, way };
            }
        }

        // the set is full, the count matrix decides who goes
        let victim = self.sets[set_index].find_least_imminent();
        if self.sets[set_index].sc_flag[victim] {
            // the least imminent line is itself in SC, evict it in place
            debug!(set = set_index, victim, "evicting SC way directly");
            return BlockId {
                set: set_index,
                way: victim,
            };
        }
        debug!(set = set_index, victim, candidate, "swapping MC victim into SC");
        let set = &mut self.sets[set_index];
        set.sc_ptr[victim] = set.sc_ptr[candidate];
        set.sc_flag[victim] = true;
        set.sc_flag[candidate] = false;
        set.sc_ptr[candidate] = None;
        BlockId {
            set: set_index,
            way: victim,
        }
    }

    /// Write the new tag into the way `find_victim` returned and rebuild
    /// that way's SC column. The caller marks the block valid (and dirty)
    /// afterwards.
    pub fn insert_block(&mut self, addr: u64, blk: BlockId, owner: usize, now: usize) {
        self.check_owner(owner);
        let BlockId {
            set: set_index,
            way,
        } = blk;
        let assoc = self.assoc;
        let idx = set_index * assoc + way;
        assert!(
            self.sets[set_index].sc_flag[way],
            "set {set_index}: insert targets non-SC way {way}"
        );

        if !self.blocks[idx].touched {
            self.blocks[idx].touched = true;
            self.stats.tags_in_use += 1;
            if !self.stats.warmed_up && self.stats.tags_in_use >= self.warmup_bound {
                self.stats.warmed_up = true;
                self.stats.warmup_cycle = now;
                debug!(cycle = now, "tag store warmed up");
            }
        }

        // replacing a live line, account for it before wiping the metadata
        if self.blocks[idx].valid {
            let prev_owner = self.blocks[idx]
                .owner
                .unwrap_or_else(|| panic!("set {set_index} way {way}: valid block with no owner"));
            self.stats.replacements += 1;
            self.stats.total_refs += self.blocks[idx].ref_count;
            self.stats.sampled_refs += 1;
            self.stats.occupancies[prev_owner] -= 1;
            self.blocks[idx].invalidate();
        }

        let tag = self.decoder.extract_tag(addr);
        {
            let b = &mut self.blocks[idx];
            b.tag = tag;
            b.touched = true;
            b.owner = Some(owner);
        }
        self.stats.occupancies[owner] += 1;

        let sc_assoc = self.sc_assoc;
        let set = &mut self.sets[set_index];
        let col = set.sc_ptr[way]
            .unwrap_or_else(|| panic!("set {set_index} way {way}: SC way with no column"));
        debug!(set = set_index, way, col, "insert reopens SC column");
        set.nvc[col] = 0;
        // reopen the column: every way becomes empty for it
        for m in 0..assoc {
            set.set_cm(m, col, CmEntry::Empty);
        }
        // prime the new line's row with dummy zeros for the columns already
        // past their empty phase
        for m in 0..sc_assoc {
            if m == col || set.cm(col, m) == CmEntry::Empty {
                continue;
            }
            set.set_cm(way, m, CmEntry::Stamp(0));
        }
        // seed the reopened column with the lines already resident, in way
        // order
        for m in 0..assoc {
            if self.blocks[set_index * assoc + m].valid {
                let stamp = set.nvc[col];
                set.set_cm(m, col, CmEntry::Stamp(stamp));
                set.nvc[col] += 1;
            }
        }
        set.rotate_sc_fifo_forward();
    }

    /// Drop a line on request of the host (e.g. an external invalidation).
    /// The vacated SC column refills before the current head.
    pub fn invalidate(&mut self, blk: BlockId) {
        let idx = blk.set * self.assoc + blk.way;
        assert!(
            self.blocks[idx].valid,
            "set {} way {}: invalidating an invalid block",
            blk.set, blk.way
        );
        let owner = self.blocks[idx]
            .owner
            .unwrap_or_else(|| panic!("set {} way {}: valid block with no owner", blk.set, blk.way));
        self.stats.tags_in_use -= 1;
        self.stats.occupancies[owner] -= 1;
        self.blocks[idx].invalidate();
        self.sets[blk.set].rotate_sc_fifo_backward();
    }

    pub fn clear_locks(&mut self) {
        for blk in &mut self.blocks {
            blk.clear_load_locks();
        }
    }

    /// at end of simulation, fold the surviving lines into the reference
    /// statistics
    pub fn cleanup_refs(&mut self) {
        for blk in &self.blocks {
            if blk.valid {
                self.stats.total_refs += blk.ref_count;
                self.stats.sampled_refs += 1;
            }
        }
    }

    fn check_owner(&self, owner: usize) {
        assert!(
            owner < self.max_owners,
            "owner id {owner} out of range, max_owners is {}",
            self.max_owners
        );
    }
}
