//! Resolution of a slash-separated path to an inode id, by linear
//! directory search from the root.

use crate::device::BlockDevice;
use crate::error::Result;
use crate::fs::{FileSystem, ROOT_INODE};

/// Resolves `path` to the inode id of its final component.
///
/// Returns `Ok(None)` — the not-found sentinel — when a component is
/// absent from its parent directory; this is distinct from an `Err`, which
/// only propagates for actual decode/IO failures (including
/// [`crate::error::Error::NotADirectory`] when an intermediate component
/// is not a directory).
///
/// Splitting on `/` and skipping empty components handles a leading `/`,
/// no leading `/`, a trailing `/`, doubled `//`, and the bare root path
/// uniformly, with no special-casing needed.
///
/// Symlinks are not followed: a symlink mid-path is treated as an ordinary
/// (non-directory) inode, so `files()` on it fails with `NotADirectory`.
pub fn resolve<D: BlockDevice>(fs: &FileSystem<D>, path: &str) -> Result<Option<u32>> {
    let mut current = ROOT_INODE;
    for component in path.split('/') {
        if component.is_empty() {
            continue;
        }
        let mut next = None;
        for entry in fs.files(current)? {
            let entry = entry?;
            if entry.name == component {
                next = Some(entry.inode_id);
                break;
            }
        }
        match next {
            Some(id) => current = id,
            None => return Ok(None),
        }
    }
    Ok(Some(current))
}
