//! TOML settings plus the `--settings` CLI flag.
//! `bin/settings_demo.rs` loads them the way the binaries do.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
