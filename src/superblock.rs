//! Decoding and validation of the volume header.

use crate::byte_cursor::ByteCursor;
use crate::error::{Error, Result};

/// Byte offset of the superblock from the start of the device, regardless
/// of block size.
pub const SUPERBLOCK_OFFSET: u64 = 1024;
/// Size of the region the superblock is parsed from.
pub const SUPERBLOCK_SIZE: usize = 1024;

/// The magic value identifying an ext2/3/4 superblock.
const EXT2_SIGNATURE: u16 = 0xEF53;

/// Feature-incompat bit: 64-bit group descriptors.
pub const INCOMPAT_64BIT: u32 = 0x80;
/// Feature-incompat bit: extent-based inodes (not decoded by this crate).
pub const INCOMPAT_EXTENTS: u32 = 0x40;

/// A decoded ext2/3/4 volume header.
///
/// Fields beyond the revision-0 base are only meaningful (and only read)
/// when `revision >= 1`; see [`Superblock::parse`].
#[derive(Debug, Clone)]
pub struct Superblock {
    pub block_size: u32,
    pub total_blocks: u64,
    pub total_inodes: u32,
    pub reserved_blocks: u32,
    pub free_blocks: u32,
    pub free_inodes: u32,
    pub first_data_block: u32,
    pub blocks_per_group: u32,
    pub inodes_per_group: u32,
    pub state: u16,
    pub errors: u16,
    pub minor_revision: u16,
    pub creator_os: u32,
    pub revision: u32,
    pub first_ino: u32,
    pub inode_size: u16,
    pub feature_compat: u32,
    pub feature_incompat: u32,
    pub feature_ro_compat: u32,
    pub uuid: [u8; 16],
    pub volume_name: String,
    pub bg_descriptor_size: u16,
}

impl Superblock {
    /// Parses a superblock from a 1024-byte buffer (bytes `[1024, 2048)` of
    /// the device).
    ///
    /// Fails with [`Error::Malformed`] on a bad signature, with
    /// [`Error::Unsupported`] when the block-size exponent exceeds 6.
    pub fn parse(buf: &[u8]) -> Result<Self> {
        let c = ByteCursor::new(buf);

        let signature = c.u16_at(56)?;
        if signature != EXT2_SIGNATURE {
            return Err(Error::malformed(format!(
                "bad superblock signature 0x{signature:04x}, expected 0x{EXT2_SIGNATURE:04x}"
            )));
        }

        let total_inodes = c.u32_at(0)?;
        let total_blocks_lo = c.u32_at(4)?;
        let reserved_blocks = c.u32_at(8)?;
        let free_blocks = c.u32_at(12)?;
        let free_inodes = c.u32_at(16)?;
        let first_data_block = c.u32_at(20)?;

        let log2_block_size = c.u32_at(24)?;
        if log2_block_size > 6 {
            return Err(Error::unsupported(format!(
                "block size exponent {log2_block_size} exceeds the maximum of 6 (64 KiB)"
            )));
        }
        let block_size = 1024u32 << log2_block_size;

        let blocks_per_group = c.u32_at(32)?;
        let inodes_per_group = c.u32_at(40)?;
        if blocks_per_group == 0 || inodes_per_group == 0 {
            return Err(Error::malformed("blocks_per_group/inodes_per_group must be non-zero"));
        }

        let state = c.u16_at(58)?;
        let errors = c.u16_at(60)?;
        let minor_revision = c.u16_at(62)?;
        let creator_os = c.u32_at(72)?;
        let revision = c.u32_at(76)?;

        let (
            first_ino,
            inode_size,
            feature_compat,
            feature_incompat,
            feature_ro_compat,
            uuid,
            volume_name,
        ) = if revision >= 1 {
            let first_ino = c.u32_at(84)?;
            let inode_size = c.u16_at(88)?;
            let feature_compat = c.u32_at(92)?;
            let feature_incompat = c.u32_at(96)?;
            let feature_ro_compat = c.u32_at(100)?;
            let uuid = read_uuid(&c)?;
            let volume_name = read_volume_name(&c)?;
            (
                first_ino,
                inode_size,
                feature_compat,
                feature_incompat,
                feature_ro_compat,
                uuid,
                volume_name,
            )
        } else {
            (11, 128, 0, 0, 0, [0u8; 16], String::new())
        };

        if inode_size < 128 {
            return Err(Error::malformed(format!("inode size {inode_size} is smaller than 128")));
        }
        if block_size % inode_size as u32 != 0 {
            return Err(Error::malformed(format!(
                "inode size {inode_size} does not evenly divide block size {block_size}"
            )));
        }

        let bg_descriptor_size = if feature_incompat & INCOMPAT_64BIT != 0 {
            c.u16_at(0xFE)?
        } else {
            32
        };

        let total_blocks = if revision >= 1 {
            let hi = c.u32_at(336)?;
            ((hi as u64) << 32) | total_blocks_lo as u64
        } else {
            total_blocks_lo as u64
        };

        Ok(Self {
            block_size,
            total_blocks,
            total_inodes,
            reserved_blocks,
            free_blocks,
            free_inodes,
            first_data_block,
            blocks_per_group,
            inodes_per_group,
            state,
            errors,
            minor_revision,
            creator_os,
            revision,
            first_ino,
            inode_size,
            feature_compat,
            feature_incompat,
            feature_ro_compat,
            uuid,
            volume_name,
            bg_descriptor_size,
        })
    }

    /// Byte offset of the group descriptor table.
    pub fn gd_offset(&self) -> u64 {
        (self.first_data_block as u64 + 1) * self.block_size as u64
    }

    /// Number of block groups implied by `total_blocks`/`blocks_per_group`.
    pub fn group_count(&self) -> u32 {
        self.total_blocks.div_ceil(self.blocks_per_group as u64) as u32
    }

    pub fn has_compat(&self, flag: u32) -> bool {
        self.feature_compat & flag != 0
    }

    pub fn has_incompat(&self, flag: u32) -> bool {
        self.feature_incompat & flag != 0
    }

    pub fn has_ro_compat(&self, flag: u32) -> bool {
        self.feature_ro_compat & flag != 0
    }
}

fn read_uuid(c: &ByteCursor) -> Result<[u8; 16]> {
    let mut uuid = [0u8; 16];
    uuid.copy_from_slice(c.bytes_at(104, 16)?);
    Ok(uuid)
}

fn read_volume_name(c: &ByteCursor) -> Result<String> {
    let raw = c.bytes_at(120, 16)?;
    let trimmed_len = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8(raw[..trimmed_len].to_vec())
        .map_err(|_| Error::malformed("volume name is not valid UTF-8"))
}
