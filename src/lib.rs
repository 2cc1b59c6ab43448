//! A read-only decoder for ext2/ext3/ext4 volumes.
//!
//! [`FileSystem`] is the entry point: open a [`device::BlockDevice`], then
//! `lookup` inodes, stream their `blocks`, enumerate directory `files`, or
//! `find` an inode by path.

pub mod block_stream;
pub mod byte_cursor;
pub mod device;
pub mod dir_entry;
pub mod error;
#[cfg(test)]
mod fixture;
pub mod fs;
pub mod group_desc;
pub mod inode;
pub mod path;
pub mod superblock;

pub use block_stream::BlockStream;
pub use device::{BlockDevice, FileDevice, MemDevice};
pub use dir_entry::{DirEntry, DirectoryIterator};
pub use error::{Error, Result};
pub use fs::{FileSystem, ROOT_INODE};
pub use group_desc::GroupDescriptor;
pub use inode::Inode;
pub use superblock::Superblock;
