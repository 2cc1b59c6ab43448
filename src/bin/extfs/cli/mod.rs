//! One module per subcommand, dispatched from `main.rs` the same way a
//! consolidated multi-applet binary dispatches to `mod` per utility.

pub mod cat;
pub mod find;
pub mod info;
pub mod ls;
