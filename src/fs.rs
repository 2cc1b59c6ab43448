//! The public facade binding the decoder, block-addressing engine, and
//! path resolver into the four operations external callers need.

use crate::block_stream::BlockStream;
use crate::device::BlockDevice;
use crate::dir_entry::DirectoryIterator;
use crate::error::{Error, Result};
use crate::group_desc::{locate_inode, GroupDescriptor};
use crate::inode::Inode;
use crate::path;
use crate::superblock::{Superblock, SUPERBLOCK_OFFSET, SUPERBLOCK_SIZE};

/// The root directory's inode id.
pub const ROOT_INODE: u32 = 2;

/// An ext2/3/4 volume opened for read-only access.
///
/// Constructing a `FileSystem` parses the superblock; every other
/// operation reads on demand — `lookup` reads exactly one inode, `blocks`
/// and `files` yield lazily.
pub struct FileSystem<D: BlockDevice> {
    device: D,
    superblock: Superblock,
}

impl<D: BlockDevice> FileSystem<D> {
    /// Opens a volume, parsing its superblock.
    pub fn open(device: D) -> Result<Self> {
        let mut buf = vec![0u8; SUPERBLOCK_SIZE];
        device.read_at(SUPERBLOCK_OFFSET, &mut buf)?;
        let superblock = Superblock::parse(&buf)?;
        Ok(Self { device, superblock })
    }

    /// The volume's decoded superblock.
    pub fn superblock(&self) -> &Superblock {
        &self.superblock
    }

    fn read_group_descriptor(&self, group_id: u32) -> Result<GroupDescriptor> {
        let offset = GroupDescriptor::disk_offset(group_id, &self.superblock);
        let mut buf = vec![0u8; self.superblock.bg_descriptor_size as usize];
        self.device.read_at(offset, &mut buf)?;
        GroupDescriptor::parse(&buf)
    }

    /// Reads and decodes the inode identified by `id`.
    ///
    /// Fails with [`Error::InvalidId`] for `id == 0` or `id` beyond
    /// `total_inodes`.
    pub fn lookup(&self, id: u32) -> Result<Inode> {
        let (group_id, index) = locate_inode(id, &self.superblock)?;
        let gd = self.read_group_descriptor(group_id)?;
        let inode_offset = gd.inode_table * self.superblock.block_size as u64
            + index as u64 * self.superblock.inode_size as u64;
        let mut buf = vec![0u8; self.superblock.inode_size as usize];
        self.device.read_at(inode_offset, &mut buf)?;
        Inode::parse(&buf)
    }

    /// Returns a lazy sequence of `inode`'s data blocks, in file-logical
    /// order, holes skipped.
    pub fn blocks<'a>(&'a self, inode: &Inode) -> Result<BlockStream<'a, D>> {
        BlockStream::new(&self.device, self.superblock.block_size, inode)
    }

    /// Returns a lazy sequence of the directory entries of the directory
    /// inode identified by `id`.
    ///
    /// Fails with [`Error::NotADirectory`] if `id` does not name a
    /// directory.
    pub fn files<'a>(&'a self, id: u32) -> Result<DirectoryIterator<'a, D>> {
        let inode = self.lookup(id)?;
        if !inode.is_directory() {
            return Err(Error::NotADirectory(id));
        }
        Ok(DirectoryIterator::new(self.blocks(&inode)?))
    }

    /// Resolves a slash-separated path to an inode id, walking directory
    /// entries from the root.
    ///
    /// Returns `Ok(None)` — not an error — if the path does not exist.
    pub fn find(&self, path_str: &str) -> Result<Option<u32>> {
        path::resolve(self, path_str)
    }
}
