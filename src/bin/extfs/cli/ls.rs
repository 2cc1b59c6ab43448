//! `extfs ls <image> <path>`: lists a directory's entries.

use extfs::{FileDevice, FileSystem};
use std::process::exit;

pub fn run(fs: &FileSystem<FileDevice>, args: &[String]) -> extfs::Result<()> {
    let path = args.first().cloned().unwrap_or_else(|| {
        eprintln!("ls: specify a path");
        exit(1);
    });
    let id = match fs.find(&path)? {
        Some(id) => id,
        None => {
            eprintln!("ls: {path}: not found");
            exit(1);
        }
    };
    for entry in fs.files(id)? {
        let entry = entry?;
        println!("{:<10} {}", entry.inode_id, entry.name);
    }
    Ok(())
}
