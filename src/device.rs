//! Positioned, cursor-free reads from the byte source backing a volume.

use crate::error::{Error, Result};
use std::fs::File;
use std::os::unix::fs::FileExt;
use std::path::Path;

/// A random-access byte source: a disk image file or a block device.
///
/// Implementations must be safe to read from at arbitrary offsets without
/// maintaining shared mutable cursor state: `blocks()` and `files()`
/// iterators are not safe to advance concurrently with each other
/// *unless* the device itself reads positionally rather than via a shared
/// seek position (see `FileDevice`, which does exactly that).
pub trait BlockDevice {
    /// Reads exactly `buf.len()` bytes at absolute byte offset `offset`.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()>;

    /// Reads exactly one block of `block_size` bytes at block id `block_id`.
    ///
    /// Block id 0 never appears as a data pointer in the classic
    /// block-pointer format (it denotes a hole); callers must not request
    /// it here.
    fn block(&self, block_size: u32, block_id: u32) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; block_size as usize];
        self.read_at(block_id as u64 * block_size as u64, &mut buf)?;
        Ok(buf)
    }
}

/// A [`BlockDevice`] backed by an open file or block-device special file.
///
/// Reads use `read_exact_at` (pread) rather than `seek`+`read_exact`, so
/// `&FileDevice` carries no cursor that could be disturbed by a concurrent
/// read.
pub struct FileDevice {
    file: File,
}

impl FileDevice {
    /// Opens `path` read-only.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self { file })
    }

    /// Wraps an already-open file.
    pub fn from_file(file: File) -> Self {
        Self { file }
    }

    /// Returns the size of the underlying device in 512-byte sectors, via
    /// `BLKGETSIZE64` for block/char special files or the file's length
    /// otherwise.
    ///
    /// This is a convenience for front-ends (e.g. printing device size in
    /// `extfs info`); the core never calls it.
    pub fn sector_count(&self) -> Result<u64> {
        use std::os::fd::AsRawFd;

        let metadata = self.file.metadata()?;
        let file_type = metadata.file_type();
        if file_type.is_block_device() || file_type.is_char_device() {
            let mut size: u64 = 0;
            let ret = unsafe {
                libc::ioctl(self.file.as_raw_fd(), BLKGETSIZE64 as _, &mut size as *mut u64)
            };
            if ret < 0 {
                return Err(std::io::Error::last_os_error().into());
            }
            Ok(size / 512)
        } else {
            Ok(metadata.len() / 512)
        }
    }
}

// ioctl read-command encoding, mirroring the classic Linux `_IOR` macro.
macro_rules! ior {
    ($ty:expr, $nr:expr, $size:expr) => {
        (2u64 << 30) | (($ty) << 8) | ($nr) | (($size as u64) << 16)
    };
}

/// `BLKGETSIZE64`: get device size in bytes (u64).
const BLKGETSIZE64: u64 = ior!(0x12, 114, std::mem::size_of::<u64>());

use std::os::unix::fs::FileTypeExt;

impl BlockDevice for FileDevice {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        self.file.read_exact_at(buf, offset)?;
        Ok(())
    }
}

/// A [`BlockDevice`] backed by an in-memory buffer.
///
/// Used by tests and by callers who have already read an entire image into
/// memory.
pub struct MemDevice {
    data: Vec<u8>,
}

impl MemDevice {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }
}

impl BlockDevice for MemDevice {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let offset = offset as usize;
        let end = offset
            .checked_add(buf.len())
            .ok_or_else(|| Error::malformed("offset overflow"))?;
        let src = self.data.get(offset..end).ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("read of {} bytes at offset {offset} exceeds device", buf.len()),
            ))
        })?;
        buf.copy_from_slice(src);
        Ok(())
    }
}
