//! `extfs find <image> <path>`: resolves a path to an inode id.

use extfs::{FileDevice, FileSystem};
use std::process::exit;

pub fn run(fs: &FileSystem<FileDevice>, args: &[String]) -> extfs::Result<()> {
    let path = args.first().cloned().unwrap_or_else(|| {
        eprintln!("find: specify a path");
        exit(1);
    });
    match fs.find(&path)? {
        Some(id) => println!("{id}"),
        None => println!("not found"),
    }
    Ok(())
}
