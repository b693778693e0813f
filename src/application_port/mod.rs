mod friendship_service;
mod identity_provider;

pub use friendship_service::*;
pub use identity_provider::*;
