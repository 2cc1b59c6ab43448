//! `extfs cat <image> <path>`: streams a file's contents to stdout.

use extfs::{FileDevice, FileSystem};
use std::io::Write;
use std::process::exit;

pub fn run(fs: &FileSystem<FileDevice>, args: &[String]) -> extfs::Result<()> {
    let path = args.first().cloned().unwrap_or_else(|| {
        eprintln!("cat: specify a path");
        exit(1);
    });
    let id = match fs.find(&path)? {
        Some(id) => id,
        None => {
            eprintln!("cat: {path}: not found");
            exit(1);
        }
    };
    let inode = fs.lookup(id)?;
    if !inode.is_regular() {
        eprintln!("cat: {path}: not a regular file");
        exit(1);
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut remaining = inode.size as u64;
    for block in fs.blocks(&inode)? {
        if remaining == 0 {
            break;
        }
        let block = block?;
        let take = remaining.min(block.len() as u64) as usize;
        out.write_all(&block[..take]).map_err(extfs::Error::from)?;
        remaining -= take as u64;
    }
    Ok(())
}
