use crate::application_port::*;
use crate::domain_model::UserId;
use std::sync::RwLock;

/// Holds the signed-in actor in memory. Meant for tests and local runs.
#[derive(Debug, Default)]
pub struct FakeIdentityProvider {
    actor: RwLock<Option<UserId>>,
}

impl FakeIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signed_in(user: impl Into<UserId>) -> Self {
        Self {
            actor: RwLock::new(Some(user.into())),
        }
    }
}

impl IdentityProvider for FakeIdentityProvider {
    fn current_actor_id(&self) -> Option<UserId> {
        self.actor.read().ok().and_then(|actor| actor.clone())
    }
}

impl Session for FakeIdentityProvider {
    fn sign_in(&self, user: &UserId) -> Result<(), IdentityError> {
        let mut actor = self
            .actor
            .write()
            .map_err(|e| IdentityError::Internal(e.to_string()))?;
        *actor = Some(user.clone());
        Ok(())
    }

    fn sign_out(&self) {
        if let Ok(mut actor) = self.actor.write() {
            *actor = None;
        }
    }
}
