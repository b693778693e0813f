#![allow(dead_code)]

use rapport::application_impl::{FakeIdentityProvider, RealFriendshipService};
use rapport::application_port::Session;
use rapport::domain_model::UserId;
use rapport::infra_memory::InMemoryStore;
use std::sync::Arc;

pub fn uid(s: &str) -> UserId {
    UserId::from(s)
}

/// One client session over an in-memory store.
pub struct Graph {
    pub store: Arc<InMemoryStore>,
    pub identity: Arc<FakeIdentityProvider>,
    pub service: RealFriendshipService,
}

impl Graph {
    pub async fn with_users(users: &[&str]) -> Self {
        let store = Arc::new(InMemoryStore::new());
        for user in users {
            store.register_user(*user).await;
        }
        Self::on(store)
    }

    /// A separate client, with its own session, sharing `store`.
    pub fn on(store: Arc<InMemoryStore>) -> Self {
        let identity = Arc::new(FakeIdentityProvider::new());
        let service = RealFriendshipService::new(store.clone(), store.clone(), identity.clone());
        Self {
            store,
            identity,
            service,
        }
    }

    pub fn act_as(&self, user: &str) {
        self.identity.sign_in(&uid(user)).unwrap();
    }

    pub fn sign_out(&self) {
        self.identity.sign_out();
    }
}
