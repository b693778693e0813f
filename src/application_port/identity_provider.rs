use crate::domain_model::UserId;

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("token invalid")]
    TokenInvalid,
    #[error("token expired")]
    TokenExpired,
    #[error("internal error: {0}")]
    Internal(String),
}

/// Supplies the identity the current call is made on behalf of.
pub trait IdentityProvider: Send + Sync {
    fn current_actor_id(&self) -> Option<UserId>;
}

/// Host-side control over who is signed in.
pub trait Session: IdentityProvider {
    fn sign_in(&self, user: &UserId) -> Result<(), IdentityError>;
    fn sign_out(&self);
}
