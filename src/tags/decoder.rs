use super::ConfigError;

/// Splits a line address into (tag, set, offset) and puts it back together.
#[derive(Debug, Clone)]
pub struct AddressDecoder {
    set_shift: u32,
    tag_shift: u32,
    set_mask: u64,
    blk_mask: u64,
}

impl AddressDecoder {
    pub fn new(num_sets_total: usize, block_size: usize) -> Result<Self, ConfigError> {
        if block_size < 4 || !block_size.is_power_of_two() {
            return Err(ConfigError::BlockSize(block_size));
        }
        if num_sets_total == 0 || !num_sets_total.is_power_of_two() {
            return Err(ConfigError::NumSets(num_sets_total));
        }
        let set_shift = block_size.trailing_zeros();
        let tag_shift = set_shift + num_sets_total.trailing_zeros();
        Ok(AddressDecoder {
            set_shift,
            tag_shift,
            set_mask: num_sets_total as u64 - 1,
            blk_mask: block_size as u64 - 1,
        })
    }

    pub fn extract_tag(&self, addr: u64) -> u64 {
        addr >> self.tag_shift
    }

    pub fn extract_set(&self, addr: u64) -> usize {
        ((addr >> self.set_shift) & self.set_mask) as usize
    }

    pub fn extract_offset(&self, addr: u64) -> usize {
        (addr & self.blk_mask) as usize
    }

    pub fn block_align(&self, addr: u64) -> u64 {
        addr & !self.blk_mask
    }

    pub fn regenerate_block_addr(&self, tag: u64, set: usize) -> u64 {
        (tag << self.tag_shift) | ((set as u64) << self.set_shift)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_decode() {
        let decoder = AddressDecoder::new(256, 64).unwrap();
        let addr = 0xdead_beef;
        assert_eq!(decoder.extract_offset(addr), 0x2f);
        assert_eq!(decoder.extract_set(addr), 0xfb);
        assert_eq!(decoder.extract_tag(addr), 0xdead_beef >> 14);
        assert_eq!(decoder.block_align(addr), 0xdead_beef & !0x3f);
    }

    #[test]
    fn test_regenerate_roundtrip() {
        let decoder = AddressDecoder::new(128, 64).unwrap();
        for tag in [0u64, 1, 0x7f, 0xabcd] {
            for set in [0usize, 1, 63, 127] {
                let addr = decoder.regenerate_block_addr(tag, set);
                assert_eq!(decoder.extract_tag(addr), tag);
                assert_eq!(decoder.extract_set(addr), set);
                assert_eq!(decoder.extract_offset(addr), 0);
            }
        }
    }

    #[test]
    fn test_bad_parameters() {
        assert_eq!(
            AddressDecoder::new(256, 3).unwrap_err(),
            ConfigError::BlockSize(3)
        );
        assert_eq!(
            AddressDecoder::new(256, 48).unwrap_err(),
            ConfigError::BlockSize(48)
        );
        assert_eq!(
            AddressDecoder::new(0, 64).unwrap_err(),
            ConfigError::NumSets(0)
        );
        assert_eq!(
            AddressDecoder::new(12, 64).unwrap_err(),
            ConfigError::NumSets(12)
        );
        // the smallest legal block
        assert!(AddressDecoder::new(1, 4).is_ok());
    }
}
