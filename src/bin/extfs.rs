//! Sample front-end over the `extfs` library.
//!
//! Four subcommands (`info`, `ls`, `find`, `cat`), argv-parsed by hand, no
//! argument-parsing crate. The library itself never writes to stdout or
//! stderr; only this binary does.

mod cli;

use extfs::{FileDevice, FileSystem};
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::process::exit;

struct Args {
    prog: String,
    command: String,
    image_path: Option<PathBuf>,
    rest: Vec<String>,
}

fn parse_args() -> Args {
    let mut iter = env::args();
    let prog = iter.next().unwrap_or_else(|| "extfs".to_owned());
    let command = iter.next().unwrap_or_default();
    let image_path = iter.next().map(PathBuf::from);
    let rest: Vec<String> = iter.collect();
    Args {
        prog,
        command,
        image_path,
        rest,
    }
}

type Command = fn(&FileSystem<FileDevice>, &[String]) -> extfs::Result<()>;

fn main() {
    let args = parse_args();

    let commands = HashMap::<&str, Command>::from([
        ("info", cli::info::run as Command),
        ("ls", cli::ls::run as Command),
        ("find", cli::find::run as Command),
        ("cat", cli::cat::run as Command),
    ]);

    let command = *commands.get(args.command.as_str()).unwrap_or_else(|| {
        eprintln!(
            "{}: usage: {} <info|ls|find|cat> <image> [path]",
            args.prog, args.prog
        );
        exit(1);
    });

    let image_path = args.image_path.unwrap_or_else(|| {
        eprintln!("{}: specify the path to an image", args.prog);
        exit(1);
    });

    let device = FileDevice::open(&image_path).unwrap_or_else(|e| {
        eprintln!("{}: {}: {}", args.prog, image_path.display(), e);
        exit(1);
    });

    let fs = FileSystem::open(device).unwrap_or_else(|e| {
        eprintln!("{}: {}: {}", args.prog, image_path.display(), e);
        exit(1);
    });

    if let Err(e) = command(&fs, &args.rest) {
        eprintln!("{}: {}", args.prog, e);
        exit(1);
    }
}
