mod relationship;
mod shard;
mod user;

pub use relationship::*;
pub use shard::*;
pub use user::*;
