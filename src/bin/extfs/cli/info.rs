//! `extfs info <image>`: prints the decoded superblock.

use extfs::superblock::INCOMPAT_EXTENTS;
use extfs::{FileDevice, FileSystem};

pub fn run(fs: &FileSystem<FileDevice>, _args: &[String]) -> extfs::Result<()> {
    let sb = fs.superblock();
    println!("block size:       {}", sb.block_size);
    println!("total blocks:     {}", sb.total_blocks);
    println!("total inodes:     {}", sb.total_inodes);
    println!("free blocks:      {}", sb.free_blocks);
    println!("free inodes:      {}", sb.free_inodes);
    println!("blocks per group: {}", sb.blocks_per_group);
    println!("inodes per group: {}", sb.inodes_per_group);
    println!("inode size:       {}", sb.inode_size);
    println!("revision:         {}", sb.revision);
    println!("volume name:      {}", sb.volume_name);
    println!(
        "feature flags:    compat=0x{:x} incompat=0x{:x} ro_compat=0x{:x}",
        sb.feature_compat, sb.feature_incompat, sb.feature_ro_compat
    );
    if sb.has_incompat(INCOMPAT_EXTENTS) {
        println!("note:             volume uses ext4 extents on some inodes, not decoded by this reader");
    }
    Ok(())
}
