mod authorization_guard;
mod friend_graph_store;
mod friendship_service_impl;
mod identity_provider_fake;
mod identity_provider_jwt;

pub use authorization_guard::*;
pub use friend_graph_store::*;
pub use friendship_service_impl::*;
pub use identity_provider_fake::*;
pub use identity_provider_jwt::*;
