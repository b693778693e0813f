//! Tracing bootstrap. `bin/logger_demo.rs` shows the filter being swapped
//! once settings are loaded.

mod logger;
pub use logger::*;

pub use tracing::{debug, error, info, trace, warn};
