//! Block-group descriptor decoding.

use crate::byte_cursor::ByteCursor;
use crate::error::{Error, Result};
use crate::superblock::Superblock;

/// One entry of the block-group descriptor table: locates the bitmaps and
/// inode table for a single block group.
#[derive(Debug, Clone, Copy)]
pub struct GroupDescriptor {
    pub block_bitmap: u64,
    pub inode_bitmap: u64,
    pub inode_table: u64,
    pub free_blocks_count: u16,
    pub free_inodes_count: u16,
    pub used_dirs_count: u16,
}

impl GroupDescriptor {
    /// Parses a single descriptor from a `bg_descriptor_size`-byte slice.
    ///
    /// The 64-bit high halves (for the 64-bit feature) are combined with
    /// the low halves when the slice is large enough to carry them;
    /// otherwise they are treated as zero, which is always correct for
    /// images under 2^32 blocks.
    pub fn parse(buf: &[u8]) -> Result<Self> {
        let c = ByteCursor::new(buf);

        let block_bitmap_lo = c.u32_at(0)?;
        let inode_bitmap_lo = c.u32_at(4)?;
        let inode_table_lo = c.u32_at(8)?;
        let free_blocks_count = c.u16_at(12)?;
        let free_inodes_count = c.u16_at(14)?;
        let used_dirs_count = c.u16_at(16)?;

        if inode_table_lo == 0 {
            return Err(Error::malformed("group descriptor has a null inode table"));
        }

        // Offsets of the 64-bit high halves in the extended (>32 byte)
        // descriptor format.
        let (block_bitmap_hi, inode_bitmap_hi, inode_table_hi) = if buf.len() >= 64 {
            (c.u32_at(32)?, c.u32_at(36)?, c.u32_at(40)?)
        } else {
            (0, 0, 0)
        };

        Ok(Self {
            block_bitmap: ((block_bitmap_hi as u64) << 32) | block_bitmap_lo as u64,
            inode_bitmap: ((inode_bitmap_hi as u64) << 32) | inode_bitmap_lo as u64,
            inode_table: ((inode_table_hi as u64) << 32) | inode_table_lo as u64,
            free_blocks_count,
            free_inodes_count,
            used_dirs_count,
        })
    }

    /// Byte offset of the `group_id`th descriptor in the table.
    pub fn disk_offset(group_id: u32, sb: &Superblock) -> u64 {
        sb.gd_offset() + group_id as u64 * sb.bg_descriptor_size as u64
    }
}

/// Splits an inode id into `(group_id, index_within_group)`.
///
/// Fails with [`Error::InvalidId`] if `id` is 0 or the resulting group id
/// is beyond the volume's group count.
pub fn locate_inode(id: u32, sb: &Superblock) -> Result<(u32, u32)> {
    if id == 0 {
        return Err(Error::invalid_id("inode id 0 is reserved and never valid"));
    }
    if id > sb.total_inodes {
        return Err(Error::invalid_id(format!(
            "inode id {id} exceeds total_inodes {}",
            sb.total_inodes
        )));
    }
    let group_id = (id - 1) / sb.inodes_per_group;
    let index = (id - 1) % sb.inodes_per_group;
    if group_id > sb.group_count() {
        return Err(Error::invalid_id(format!(
            "inode {id} maps to group {group_id}, beyond the volume's {} groups",
            sb.group_count()
        )));
    }
    Ok((group_id, index))
}
