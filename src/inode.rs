//! Inode record decoding.

use crate::byte_cursor::ByteCursor;
use crate::error::Result;

/// `mode` type bits (`mode & TYPE_MASK`).
pub const TYPE_MASK: u16 = 0xF000;
pub const TYPE_FIFO: u16 = 0x1000;
pub const TYPE_CHAR_DEVICE: u16 = 0x2000;
pub const TYPE_DIRECTORY: u16 = 0x4000;
pub const TYPE_BLOCK_DEVICE: u16 = 0x6000;
pub const TYPE_REGULAR: u16 = 0x8000;
pub const TYPE_SYMLINK: u16 = 0xA000;
pub const TYPE_SOCKET: u16 = 0xC000;

/// `flags` bit: file content is stored inline in the block-pointer area.
pub const FLAG_INLINE_DATA: u32 = 0x1000_0000;
/// `flags` bit: the block-pointer area holds an ext4 extent tree, not
/// classic direct/indirect pointers.
pub const FLAG_EXTENTS: u32 = 0x0008_0000;

/// Size in bytes of the inode's block-pointer area (`i_block` in the
/// classic layout).
pub const BLOCK_AREA_SIZE: usize = 60;

/// A decoded inode record.
///
/// `block_area` is retained verbatim; its interpretation (inline data,
/// extents, or direct/indirect pointers) is [`crate::block_stream`]'s job.
#[derive(Debug, Clone)]
pub struct Inode {
    pub mode: u16,
    pub uid: u16,
    pub gid: u16,
    pub size: u32,
    pub flags: u32,
    pub links_count: u16,
    pub atime: u32,
    pub ctime: u32,
    pub mtime: u32,
    pub dtime: u32,
    pub block_area: [u8; BLOCK_AREA_SIZE],
}

impl Inode {
    /// Decodes an inode from a buffer at least `inode_size` bytes long.
    ///
    /// Only the fixed-layout prefix (common to every revision) is read;
    /// any inode-size padding beyond it (extended attributes, etc.) is
    /// ignored.
    pub fn parse(buf: &[u8]) -> Result<Self> {
        let c = ByteCursor::new(buf);

        let mode = c.u16_at(0)?;
        let uid = c.u16_at(2)?;
        let size = c.u32_at(4)?;
        let atime = c.u32_at(8)?;
        let ctime = c.u32_at(12)?;
        let mtime = c.u32_at(16)?;
        let dtime = c.u32_at(20)?;
        let gid = c.u16_at(24)?;
        let links_count = c.u16_at(26)?;
        let flags = c.u32_at(32)?;

        let mut block_area = [0u8; BLOCK_AREA_SIZE];
        block_area.copy_from_slice(c.bytes_at(40, BLOCK_AREA_SIZE)?);

        Ok(Self {
            mode,
            uid,
            gid,
            size,
            flags,
            links_count,
            atime,
            ctime,
            mtime,
            dtime,
            block_area,
        })
    }

    pub fn file_type(&self) -> u16 {
        self.mode & TYPE_MASK
    }

    pub fn is_directory(&self) -> bool {
        self.file_type() == TYPE_DIRECTORY
    }

    pub fn is_regular(&self) -> bool {
        self.file_type() == TYPE_REGULAR
    }

    pub fn is_symlink(&self) -> bool {
        self.file_type() == TYPE_SYMLINK
    }

    pub fn is_fifo(&self) -> bool {
        self.file_type() == TYPE_FIFO
    }

    pub fn is_char_device(&self) -> bool {
        self.file_type() == TYPE_CHAR_DEVICE
    }

    pub fn is_block_device(&self) -> bool {
        self.file_type() == TYPE_BLOCK_DEVICE
    }

    pub fn is_socket(&self) -> bool {
        self.file_type() == TYPE_SOCKET
    }

    pub fn has_inline_data(&self) -> bool {
        self.flags & FLAG_INLINE_DATA != 0
    }

    pub fn has_extents(&self) -> bool {
        self.flags & FLAG_EXTENTS != 0
    }
}
