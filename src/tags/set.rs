use enum_as_inner::EnumAsInner;

use super::block::CacheBlock;

/// One cell of the count matrix.
///
/// `Untracked` means the slot has never mattered to the column since the
/// column was last opened before this slot held anything; `Empty` means the
/// column is waiting to stamp the slot on its first re-hit; `Stamp` holds
/// the NVC value captured at that first re-hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumAsInner)]
pub enum CmEntry {
    Untracked,
    Empty,
    Stamp(u32),
}

/// An associative set: blocks live in the tag store's flat block array,
/// the set keeps the replacement bookkeeping in parallel arrays.
#[derive(Debug)]
pub struct CacheSet {
    pub(crate) index: usize,
    pub(crate) assoc: usize,
    pub(crate) sc_assoc: usize,
    /// true while way i belongs to the Shepherd Cache
    pub(crate) sc_flag: Vec<bool>,
    /// the SC column a way owns; None for Main Cache ways
    pub(crate) sc_ptr: Vec<Option<usize>>,
    /// next value to stamp for each SC column
    pub(crate) nvc: Vec<u32>,
    /// SC column ids in FIFO admission order
    pub(crate) sc_queue: Vec<usize>,
    /// index into `sc_queue` of the oldest SC column
    pub(crate) least_imm_sc_ptr: usize,
    /// assoc x sc_assoc, indexed way + col * assoc
    pub(crate) count_matrix: Vec<CmEntry>,
}

impl CacheSet {
    pub(crate) fn new(index: usize, assoc: usize, sc_assoc: usize) -> Self {
        let mut sc_flag = vec![false; assoc];
        let mut sc_ptr = vec![None; assoc];
        // the first sc_assoc ways start out as the Shepherd Cache
        for (col, way) in (0..sc_assoc).enumerate() {
            sc_flag[way] = true;
            sc_ptr[way] = Some(col);
        }
        CacheSet {
            index,
            assoc,
            sc_assoc,
            sc_flag,
            sc_ptr,
            nvc: vec![0; sc_assoc],
            sc_queue: (0..sc_assoc).collect(),
            least_imm_sc_ptr: 0,
            count_matrix: vec![CmEntry::Untracked; assoc * sc_assoc],
        }
    }

    pub(crate) fn cm(&self, way: usize, col: usize) -> CmEntry {
        self.count_matrix[way + col * self.assoc]
    }

    pub(crate) fn set_cm(&mut self, way: usize, col: usize, entry: CmEntry) {
        self.count_matrix[way + col * self.assoc] = entry;
    }

    /// the SC column currently at the head of the FIFO
    pub(crate) fn head_col(&self) -> usize {
        self.sc_queue[self.least_imm_sc_ptr]
    }

    /// linear scan for a valid block with a matching tag
    pub(crate) fn find_block(&self, tag: u64, blocks: &[CacheBlock]) -> Option<usize> {
        (0..self.assoc).find(|&way| blocks[way].valid && blocks[way].tag == tag)
    }

    /// the way owning the FIFO-head column; the replacement state is
    /// corrupt if no way carries it
    pub(crate) fn sc_fifo_head(&self) -> usize {
        let col = self.head_col();
        for way in 0..self.assoc {
            if self.sc_ptr[way] == Some(col) {
                return way;
            }
        }
        panic!(
            "set {}: no way owns SC FIFO head column {col}, sc_ptr {:?}",
            self.index, self.sc_ptr
        );
    }

    /// Pick the way whose count in the FIFO-head column is largest. An
    /// `Empty` entry outranks every count and short-circuits; ties go to
    /// the lowest way.
    pub(crate) fn find_least_imminent(&self) -> usize {
        let col = self.head_col();
        let mut max_count: i64 = -2;
        let mut max_way = 0;
        for way in 0..self.assoc {
            match self.cm(way, col) {
                CmEntry::Empty => return way,
                CmEntry::Untracked => {}
                CmEntry::Stamp(count) => {
                    if i64::from(count) > max_count {
                        max_count = i64::from(count);
                        max_way = way;
                    }
                }
            }
        }
        max_way
    }

    pub(crate) fn rotate_sc_fifo_forward(&mut self) {
        self.least_imm_sc_ptr = (self.least_imm_sc_ptr + 1) % self.sc_assoc;
    }

    pub(crate) fn rotate_sc_fifo_backward(&mut self) {
        self.least_imm_sc_ptr = (self.least_imm_sc_ptr + self.sc_assoc - 1) % self.sc_assoc;
    }
}
