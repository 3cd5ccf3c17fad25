//! Capacity planning
//!
//! Decides whether a source of a given size fits a partition once rounded up
//! to the flash block size.

/// Flash erase/program block size used when none is configured
pub const DEFAULT_BLOCK_SIZE: u64 = 4096;

/// Result of sizing a source against a partition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityPlan {
    /// Bytes in the source
    pub raw_size: u64,
    /// `raw_size` rounded up to a multiple of the block size
    pub aligned_size: u64,
    /// Bytes available in the partition
    pub partition_size: u64,
    /// Whether `aligned_size <= partition_size`
    pub fits: bool,
}

impl CapacityPlan {
    /// Bytes left in the partition after the aligned image, zero if it does not fit
    pub fn headroom(&self) -> u64 {
        self.partition_size.saturating_sub(self.aligned_size)
    }
}

/// Round `size` up to the next multiple of `block_size`
///
/// Saturates to the largest multiple of `block_size` representable in a
/// `u64` instead of wrapping.
///
/// # Panics
/// Panics if `block_size` is zero.
pub fn align_up(size: u64, block_size: u64) -> u64 {
    assert!(block_size > 0, "block size must be non-zero");
    let blocks = size.div_ceil(block_size);
    blocks
        .checked_mul(block_size)
        .unwrap_or(u64::MAX - u64::MAX % block_size)
}

/// Plan an image of `source_size` bytes into a partition of `partition_size` bytes
pub fn plan(source_size: u64, partition_size: u64, block_size: u64) -> CapacityPlan {
    let aligned_size = align_up(source_size, block_size);
    CapacityPlan {
        raw_size: source_size,
        aligned_size,
        partition_size,
        fits: aligned_size <= partition_size,
    }
}
