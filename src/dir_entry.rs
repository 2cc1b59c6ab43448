//! Decoding of variable-length directory records.

use crate::block_stream::BlockStream;
use crate::byte_cursor::ByteCursor;
use crate::device::BlockDevice;
use crate::error::{Error, Result};

/// Directory-entry file-type tag (distinct from the inode `mode` type).
pub const FT_UNKNOWN: u8 = 0;
pub const FT_REGULAR: u8 = 1;
pub const FT_DIRECTORY: u8 = 2;
pub const FT_CHAR_DEVICE: u8 = 3;
pub const FT_BLOCK_DEVICE: u8 = 4;
pub const FT_FIFO: u8 = 5;
pub const FT_SOCKET: u8 = 6;
pub const FT_SYMLINK: u8 = 7;

/// One decoded directory record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub inode_id: u32,
    pub record_size: u16,
    pub file_type: u8,
    pub name: String,
}

/// Lazily decodes the directory records contained in the blocks of a
/// directory inode.
///
/// Entries with name `.` or `..` are yielded unchanged; filtering them is
/// the caller's responsibility. Empty slots (`inode_id == 0`) are skipped
/// silently, never yielded.
pub struct DirectoryIterator<'a, D: BlockDevice> {
    blocks: BlockStream<'a, D>,
    current: Option<Vec<u8>>,
    offset: usize,
}

impl<'a, D: BlockDevice> DirectoryIterator<'a, D> {
    pub fn new(blocks: BlockStream<'a, D>) -> Self {
        Self {
            blocks,
            current: None,
            offset: 0,
        }
    }
}

impl<'a, D: BlockDevice> Iterator for DirectoryIterator<'a, D> {
    type Item = Result<DirEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let need_block = match &self.current {
                None => true,
                Some(buf) => self.offset >= buf.len(),
            };
            if need_block {
                match self.blocks.next() {
                    None => return None,
                    Some(Err(e)) => return Some(Err(e)),
                    Some(Ok(buf)) => {
                        self.current = Some(buf);
                        self.offset = 0;
                    }
                }
                continue;
            }

            let buf = self.current.as_ref().unwrap();
            let c = ByteCursor::new(buf);

            let inode_id = match c.u32_at(self.offset) {
                Ok(v) => v,
                Err(e) => return Some(Err(e)),
            };
            let record_size = match c.u16_at(self.offset + 4) {
                Ok(v) => v,
                Err(e) => return Some(Err(e)),
            };

            if record_size < 8 || record_size % 4 != 0 {
                return Some(Err(Error::malformed(format!(
                    "directory record_size {record_size} at offset {} must be >= 8 and a multiple of 4",
                    self.offset
                ))));
            }
            if self.offset + record_size as usize > buf.len() {
                return Some(Err(Error::malformed(format!(
                    "directory record at offset {} with size {record_size} extends beyond its block",
                    self.offset
                ))));
            }

            if inode_id == 0 {
                self.offset += record_size as usize;
                continue;
            }

            let name_length = match c.u8_at(self.offset + 6) {
                Ok(v) => v,
                Err(e) => return Some(Err(e)),
            };
            let file_type = match c.u8_at(self.offset + 7) {
                Ok(v) => v,
                Err(e) => return Some(Err(e)),
            };
            if name_length as u16 + 8 > record_size {
                return Some(Err(Error::malformed(format!(
                    "directory record name_length {name_length} does not fit in record_size {record_size}"
                ))));
            }
            let name_bytes = match c.bytes_at(self.offset + 8, name_length as usize) {
                Ok(v) => v,
                Err(e) => return Some(Err(e)),
            };
            let name = match std::str::from_utf8(name_bytes) {
                Ok(s) => s.to_owned(),
                Err(_) => return Some(Err(Error::malformed("directory entry name is not valid UTF-8"))),
            };

            self.offset += record_size as usize;
            return Some(Ok(DirEntry {
                inode_id,
                record_size,
                file_type,
                name,
            }));
        }
    }
}
