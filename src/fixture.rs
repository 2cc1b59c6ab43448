//! Synthesizes minimal in-memory ext2 images for tests.
//!
//! Builds the same superblock/group-descriptor/inode layout a real
//! `mkfs.ext2` run would produce, directly into a growable in-memory
//! buffer, to feed the read side under test. Block and inode bitmaps are
//! left zeroed: bitmap inspection is out of this reader's scope, so their
//! content is never consulted.

#![cfg(test)]

use crate::device::MemDevice;
use crate::dir_entry::{FT_DIRECTORY, FT_REGULAR};
use crate::fs::FileSystem;
use crate::inode::{FLAG_EXTENTS, FLAG_INLINE_DATA, TYPE_DIRECTORY, TYPE_REGULAR};
use crate::superblock::Superblock;
use std::collections::{BTreeMap, VecDeque};

const INODES_PER_GROUP: u32 = 1024;
const INODE_SIZE: u32 = 128;
const BG_DESCRIPTOR_SIZE: u32 = 32;
const ROOT_INODE: u32 = 2;
const LOST_AND_FOUND_INODE: u32 = 11;
const FIRST_USER_INODE: u32 = 12;

enum Kind {
    Dir,
    File { content: Vec<u8>, extents: bool },
}

struct Node {
    kind: Kind,
    children: BTreeMap<String, Node>,
}

impl Node {
    fn new_dir() -> Self {
        Self {
            kind: Kind::Dir,
            children: BTreeMap::new(),
        }
    }
}

/// Builds a synthetic single-block-group ext2 image.
pub struct FixtureBuilder {
    block_size: u32,
    root: Node,
}

impl FixtureBuilder {
    pub fn new(block_size: u32) -> Self {
        Self {
            block_size,
            root: Node::new_dir(),
        }
    }

    fn insert(&mut self, path: &str, kind: Kind) {
        let mut node = &mut self.root;
        let components: Vec<&str> = path.split('/').filter(|c| !c.is_empty()).collect();
        for (i, comp) in components.iter().enumerate() {
            let is_last = i == components.len() - 1;
            if is_last {
                node.children.insert(comp.to_string(), Node { kind, children: BTreeMap::new() });
                return;
            }
            node = node
                .children
                .entry(comp.to_string())
                .or_insert_with(Node::new_dir);
        }
    }

    pub fn with_dir(mut self, path: &str) -> Self {
        self.insert(path, Kind::Dir);
        self
    }

    pub fn with_file(mut self, path: &str, content: &[u8]) -> Self {
        self.insert(
            path,
            Kind::File {
                content: content.to_vec(),
                extents: false,
            },
        );
        self
    }

    pub fn with_extent_file(mut self, path: &str, content: &[u8]) -> Self {
        self.insert(
            path,
            Kind::File {
                content: content.to_vec(),
                extents: true,
            },
        );
        self
    }

    pub fn build(self) -> Image {
        let block_size = self.block_size;
        let first_data_block = if block_size == 1024 { 1 } else { 0 };

        let gd_block_start = first_data_block + 1;
        let gd_blocks = ceil_div(BG_DESCRIPTOR_SIZE, block_size);
        let block_bitmap_block = gd_block_start + gd_blocks;
        let inode_bitmap_block = block_bitmap_block + 1;
        let inode_table_start = inode_bitmap_block + 1;
        let inode_table_blocks = ceil_div(INODES_PER_GROUP * INODE_SIZE, block_size);
        let data_start = inode_table_start + inode_table_blocks;

        let mut alloc = BlockAllocator::new(block_size, data_start);
        let mut inode_table: BTreeMap<u32, [u8; INODE_SIZE as usize]> = BTreeMap::new();
        let mut next_id = FIRST_USER_INODE;

        // Pass 1: assign inode ids depth-first, recording (id, parent id) per node.
        let mut assigned: Vec<(u32, u32, &Node)> = Vec::new();
        assign_ids(&self.root, ROOT_INODE, ROOT_INODE, &mut next_id, &mut assigned);

        // lost+found is always present, a child of root, with no children of its own.
        let lost_and_found = Node::new_dir();
        assigned.push((LOST_AND_FOUND_INODE, ROOT_INODE, &lost_and_found));

        // Pass 2: write each node's inode (order does not matter: child ids
        // are already known from pass 1).
        for (id, parent_id, node) in &assigned {
            let inode_bytes = match &node.kind {
                Kind::Dir => {
                    let mut entries: Vec<(u32, u8, String)> = vec![
                        (*id, FT_DIRECTORY, ".".to_string()),
                        (*parent_id, FT_DIRECTORY, "..".to_string()),
                    ];
                    if *id == ROOT_INODE {
                        entries.push((LOST_AND_FOUND_INODE, FT_DIRECTORY, "lost+found".to_string()));
                    }
                    for (name, child) in &node.children {
                        let child_id = assigned
                            .iter()
                            .find(|(_, _, n)| std::ptr::eq(*n, child))
                            .map(|(cid, _, _)| *cid)
                            .expect("child id assigned in pass 1");
                        let ft = match child.kind {
                            Kind::Dir => FT_DIRECTORY,
                            Kind::File { .. } => FT_REGULAR,
                        };
                        entries.push((child_id, ft, name.clone()));
                    }
                    let data_blocks = write_directory_blocks(&mut alloc, &entries);
                    let size = data_blocks.len() as u32 * block_size;
                    let block_area = build_block_area(&mut alloc, data_blocks.into());
                    build_inode(TYPE_DIRECTORY | 0o755, 0, size, block_area)
                }
                Kind::File { content, extents } => {
                    if *extents {
                        build_inode(TYPE_REGULAR | 0o644, FLAG_EXTENTS, content.len() as u32, [0u8; 60])
                    } else if content.is_empty() {
                        build_inode(TYPE_REGULAR | 0o644, 0, 0, [0u8; 60])
                    } else if content.len() <= 60 {
                        let mut area = [0u8; 60];
                        area[..content.len()].copy_from_slice(content);
                        build_inode(TYPE_REGULAR | 0o644, FLAG_INLINE_DATA, content.len() as u32, area)
                    } else {
                        let data_blocks = write_file_blocks(&mut alloc, content);
                        let block_area = build_block_area(&mut alloc, data_blocks.into());
                        build_inode(TYPE_REGULAR | 0o644, 0, content.len() as u32, block_area)
                    }
                }
            };
            inode_table.insert(*id, inode_bytes);
        }

        let total_blocks = alloc.device.len() as u64 / block_size as u64;

        // Write the inode table into the device.
        let mut device = std::mem::take(&mut alloc.device);
        let inode_table_byte_start = inode_table_start as u64 * block_size as u64;
        let inode_table_byte_len = inode_table_blocks as u64 * block_size as u64;
        let needed_end = inode_table_byte_start + inode_table_byte_len;
        if (device.len() as u64) < needed_end {
            device.resize(needed_end as usize, 0);
        }
        for (id, bytes) in &inode_table {
            let index = id - 1; // 1-based ids, single group
            let offset = inode_table_byte_start + index as u64 * INODE_SIZE as u64;
            let start = offset as usize;
            device[start..start + INODE_SIZE as usize].copy_from_slice(bytes);
        }

        let total_blocks = total_blocks.max(data_start as u64);

        // Write the group descriptor.
        let gd_offset = gd_block_start as u64 * block_size as u64;
        let gd_end = gd_offset + BG_DESCRIPTOR_SIZE as u64;
        if (device.len() as u64) < gd_end {
            device.resize(gd_end as usize, 0);
        }
        write_group_descriptor(
            &mut device,
            gd_offset as usize,
            block_bitmap_block,
            inode_bitmap_block,
            inode_table_start,
        );

        // Write the superblock.
        let sb_end = 2048usize;
        if device.len() < sb_end {
            device.resize(sb_end, 0);
        }
        write_superblock(
            &mut device,
            SuperblockParams {
                block_size,
                total_blocks: total_blocks as u32,
                total_inodes: INODES_PER_GROUP,
                first_data_block,
                blocks_per_group: total_blocks as u32,
                inodes_per_group: INODES_PER_GROUP,
                inode_size: INODE_SIZE as u16,
            },
        );

        Image { block_size, data: device }
    }
}

fn assign_ids<'a>(
    node: &'a Node,
    id: u32,
    parent_id: u32,
    next_id: &mut u32,
    out: &mut Vec<(u32, u32, &'a Node)>,
) {
    out.push((id, parent_id, node));
    for child in node.children.values() {
        let child_id = *next_id;
        *next_id += 1;
        assign_ids(child, child_id, id, next_id, out);
    }
}

fn ceil_div(n: u32, d: u32) -> u32 {
    (n + d - 1) / d
}

/// Grows an in-memory device on demand as new blocks are allocated.
struct BlockAllocator {
    block_size: u32,
    next_free_block: u32,
    device: Vec<u8>,
}

impl BlockAllocator {
    fn new(block_size: u32, first_free_block: u32) -> Self {
        Self {
            block_size,
            next_free_block: first_free_block,
            device: Vec::new(),
        }
    }

    fn allocate_block(&mut self) -> u32 {
        let id = self.next_free_block;
        self.next_free_block += 1;
        let end = (id as u64 + 1) * self.block_size as u64;
        if (self.device.len() as u64) < end {
            self.device.resize(end as usize, 0);
        }
        id
    }

    fn write_block(&mut self, id: u32, data: &[u8]) {
        let start = id as u64 * self.block_size as u64;
        let end = start + self.block_size as u64;
        if (self.device.len() as u64) < end {
            self.device.resize(end as usize, 0);
        }
        let start = start as usize;
        device_copy(&mut self.device, start, data);
    }
}

fn device_copy(device: &mut [u8], start: usize, data: &[u8]) {
    device[start..start + data.len()].copy_from_slice(data);
}

/// Writes `content`'s regular-file blocks and returns the allocated block ids.
fn write_file_blocks(alloc: &mut BlockAllocator, content: &[u8]) -> Vec<u32> {
    let bs = alloc.block_size as usize;
    let mut ids = Vec::new();
    for chunk in content.chunks(bs) {
        let id = alloc.allocate_block();
        let mut buf = vec![0u8; bs];
        buf[..chunk.len()].copy_from_slice(chunk);
        alloc.write_block(id, &buf);
        ids.push(id);
    }
    ids
}

/// Packs directory entries into one or more blocks, extending the last
/// entry of each block to consume the remainder (the standard ext2
/// directory padding trick), and returns the allocated block ids.
fn write_directory_blocks(alloc: &mut BlockAllocator, entries: &[(u32, u8, String)]) -> Vec<u32> {
    let bs = alloc.block_size as usize;
    let mut block_ids = Vec::new();
    let mut buf = vec![0u8; bs];
    let mut offset = 0usize;
    let mut last_entry_offset: Option<usize> = None;

    let flush = |alloc: &mut BlockAllocator, buf: &mut Vec<u8>, last_entry_offset: &mut Option<usize>, block_ids: &mut Vec<u32>| {
        if let Some(last) = *last_entry_offset {
            let extended = (bs - last) as u16;
            buf[last + 4..last + 6].copy_from_slice(&extended.to_le_bytes());
        }
        let id = alloc.allocate_block();
        alloc.write_block(id, buf);
        block_ids.push(id);
        for b in buf.iter_mut() {
            *b = 0;
        }
        *last_entry_offset = None;
    };

    for (inode_id, file_type, name) in entries {
        let needed = round_up4(8 + name.len());
        if offset + needed > bs {
            flush(alloc, &mut buf, &mut last_entry_offset, &mut block_ids);
            offset = 0;
        }
        buf[offset..offset + 4].copy_from_slice(&inode_id.to_le_bytes());
        buf[offset + 4..offset + 6].copy_from_slice(&(needed as u16).to_le_bytes());
        buf[offset + 6] = name.len() as u8;
        buf[offset + 7] = *file_type;
        buf[offset + 8..offset + 8 + name.len()].copy_from_slice(name.as_bytes());
        last_entry_offset = Some(offset);
        offset += needed;
    }
    flush(alloc, &mut buf, &mut last_entry_offset, &mut block_ids);

    block_ids
}

fn round_up4(n: usize) -> usize {
    (n + 3) & !3
}

/// Builds the 60-byte block-pointer area addressing `ids`, allocating
/// singly/doubly/triply-indirect pointer blocks as needed — the write-side
/// mirror of [`crate::block_stream::BlockStream`]'s read-side traversal.
fn build_block_area(alloc: &mut BlockAllocator, mut ids: VecDeque<u32>) -> [u8; 60] {
    let mut area = [0u8; 60];
    for i in 0..12 {
        if let Some(id) = ids.pop_front() {
            area[i * 4..i * 4 + 4].copy_from_slice(&id.to_le_bytes());
        } else {
            break;
        }
    }
    let entries_per_block = (alloc.block_size / 4) as usize;
    if !ids.is_empty() {
        let singly = build_tree(alloc, &mut ids, 1, entries_per_block);
        area[48..52].copy_from_slice(&singly.to_le_bytes());
    }
    if !ids.is_empty() {
        let doubly = build_tree(alloc, &mut ids, 2, entries_per_block);
        area[52..56].copy_from_slice(&doubly.to_le_bytes());
    }
    if !ids.is_empty() {
        let triply = build_tree(alloc, &mut ids, 3, entries_per_block);
        area[56..60].copy_from_slice(&triply.to_le_bytes());
    }
    area
}

fn build_tree(alloc: &mut BlockAllocator, ids: &mut VecDeque<u32>, depth: u8, entries_per_block: usize) -> u32 {
    let mut entries = Vec::with_capacity(entries_per_block);
    for _ in 0..entries_per_block {
        if ids.is_empty() {
            break;
        }
        if depth == 1 {
            entries.push(ids.pop_front().unwrap());
        } else {
            entries.push(build_tree(alloc, ids, depth - 1, entries_per_block));
        }
    }
    let id = alloc.allocate_block();
    let mut buf = vec![0u8; alloc.block_size as usize];
    for (i, &e) in entries.iter().enumerate() {
        buf[i * 4..i * 4 + 4].copy_from_slice(&e.to_le_bytes());
    }
    alloc.write_block(id, &buf);
    id
}

fn build_inode(mode: u16, flags: u32, size: u32, block_area: [u8; 60]) -> [u8; INODE_SIZE as usize] {
    let mut buf = [0u8; INODE_SIZE as usize];
    buf[0..2].copy_from_slice(&mode.to_le_bytes());
    buf[4..8].copy_from_slice(&size.to_le_bytes());
    buf[26..28].copy_from_slice(&1u16.to_le_bytes()); // links_count
    buf[32..36].copy_from_slice(&flags.to_le_bytes());
    buf[40..100].copy_from_slice(&block_area);
    buf
}

fn write_group_descriptor(
    device: &mut [u8],
    offset: usize,
    block_bitmap: u32,
    inode_bitmap: u32,
    inode_table: u32,
) {
    device[offset..offset + 4].copy_from_slice(&block_bitmap.to_le_bytes());
    device[offset + 4..offset + 8].copy_from_slice(&inode_bitmap.to_le_bytes());
    device[offset + 8..offset + 12].copy_from_slice(&inode_table.to_le_bytes());
    // free_blocks_count, free_inodes_count, used_dirs_count are left zero:
    // never consulted by any core operation.
}

struct SuperblockParams {
    block_size: u32,
    total_blocks: u32,
    total_inodes: u32,
    first_data_block: u32,
    blocks_per_group: u32,
    inodes_per_group: u32,
    inode_size: u16,
}

fn write_superblock(device: &mut [u8], p: SuperblockParams) {
    let sb = &mut device[1024..2048];
    let log2_block_size = (p.block_size / 1024).trailing_zeros();

    sb[0..4].copy_from_slice(&p.total_inodes.to_le_bytes());
    sb[4..8].copy_from_slice(&p.total_blocks.to_le_bytes());
    sb[20..24].copy_from_slice(&p.first_data_block.to_le_bytes());
    sb[24..28].copy_from_slice(&log2_block_size.to_le_bytes());
    sb[32..36].copy_from_slice(&p.blocks_per_group.to_le_bytes());
    sb[40..44].copy_from_slice(&p.inodes_per_group.to_le_bytes());
    sb[56..58].copy_from_slice(&0xEF53u16.to_le_bytes());
    sb[76..80].copy_from_slice(&1u32.to_le_bytes()); // revision = 1 (dynamic)

    sb[84..88].copy_from_slice(&FIRST_USER_INODE.to_le_bytes());
    sb[88..90].copy_from_slice(&p.inode_size.to_le_bytes());
    // feature_compat/incompat/ro_compat (92, 96, 100) left at 0: no
    // optional features are exercised by these fixtures other than the
    // extents flag, which lives on individual inodes, not the superblock.
    sb[120..127].copy_from_slice(b"fixture");
}

/// A synthesized image, ready to be read back through [`FileSystem`].
pub struct Image {
    block_size: u32,
    data: Vec<u8>,
}

impl Image {
    pub fn superblock_bytes(&self) -> [u8; 1024] {
        let mut buf = [0u8; 1024];
        buf.copy_from_slice(&self.data[1024..2048]);
        buf
    }

    pub fn superblock(&self) -> Superblock {
        Superblock::parse(&self.superblock_bytes()).unwrap()
    }

    pub fn open_fs(&self) -> FileSystem<MemDevice> {
        FileSystem::open(MemDevice::new(self.data.clone())).unwrap()
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }
}
