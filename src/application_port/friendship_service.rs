use crate::domain_model::*;
use std::collections::BTreeSet;
use std::fmt;

/// Coarse classification of a [`RelationError`]. Callers branch on this,
/// never on the error message.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    Validation,
    Authorization,
    Conflict,
    NotFound,
    Transient,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Authorization => "authorization",
            ErrorKind::Conflict => "conflict",
            ErrorKind::NotFound => "not found",
            ErrorKind::Transient => "transient",
        };
        f.write_str(s)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RelationError {
    #[error("cannot send a friend request to yourself")]
    SelfRequest,
    #[error("user id must not be empty")]
    InvalidUserId,
    #[error("recipient not found")]
    RecipientNotFound,
    #[error("not authenticated")]
    Unauthenticated,
    #[error("signed-in user has no active account")]
    ActorNotFound,
    #[error("actor is not a party to this relationship")]
    NotAuthorized,
    #[error("already friends")]
    AlreadyFriends,
    #[error("friend request already sent")]
    RequestAlreadySent,
    #[error("reverse request exists, resolve it first")]
    ReverseRequestPending,
    #[error("not friends")]
    NotFriends,
    #[error("no pending request")]
    NoPendingRequest,
    #[error("no sent request")]
    NoSentRequest,
    #[error("store error: {0}")]
    Store(String),
}

impl RelationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RelationError::SelfRequest
            | RelationError::InvalidUserId
            | RelationError::RecipientNotFound => ErrorKind::Validation,
            RelationError::Unauthenticated
            | RelationError::ActorNotFound
            | RelationError::NotAuthorized => ErrorKind::Authorization,
            RelationError::AlreadyFriends
            | RelationError::RequestAlreadySent
            | RelationError::ReverseRequestPending
            | RelationError::NotFriends => ErrorKind::Conflict,
            RelationError::NoPendingRequest | RelationError::NoSentRequest => ErrorKind::NotFound,
            RelationError::Store(_) => ErrorKind::Transient,
        }
    }
}

/// Friend graph operations on behalf of the signed-in actor.
///
/// Every method authorizes the actor before touching the store. Mutations
/// run inside a single store transaction and either fully apply or leave the
/// pair untouched. Read queries are not transactional and may trail a
/// mutation another caller has just committed.
#[async_trait::async_trait]
pub trait FriendshipService: Send + Sync {
    /// `None -> PendingAtoB`. Actor must be `sender`.
    async fn send_friend_request(
        &self,
        sender: &UserId,
        recipient: &UserId,
    ) -> Result<(), RelationError>;

    /// `PendingAtoB -> Friends`. Actor must be `recipient`.
    async fn accept_friend_request(
        &self,
        recipient: &UserId,
        sender: &UserId,
    ) -> Result<(), RelationError>;

    /// `PendingAtoB -> None`. Actor must be `recipient`.
    async fn reject_friend_request(
        &self,
        recipient: &UserId,
        sender: &UserId,
    ) -> Result<(), RelationError>;

    /// `PendingAtoB -> None`. Actor must be `sender`.
    async fn cancel_friend_request(
        &self,
        sender: &UserId,
        recipient: &UserId,
    ) -> Result<(), RelationError>;

    /// `Friends -> None`. Actor must be one of the two users.
    async fn remove_friend(&self, a: &UserId, b: &UserId) -> Result<(), RelationError>;

    /// Reads `friends(a)` only.
    async fn are_friends(&self, a: &UserId, b: &UserId) -> Result<bool, RelationError>;

    /// Direction follows the actor: as `from` it checks
    /// `outgoingRequests(from)`, as `to` it checks `incomingRequests(to)`.
    /// Any other actor is rejected.
    async fn has_pending_request(
        &self,
        from: &UserId,
        to: &UserId,
    ) -> Result<bool, RelationError>;

    async fn list_friends(&self, user: &UserId) -> Result<BTreeSet<UserId>, RelationError>;

    async fn list_incoming_requests(
        &self,
        user: &UserId,
    ) -> Result<BTreeSet<UserId>, RelationError>;

    async fn list_outgoing_requests(
        &self,
        user: &UserId,
    ) -> Result<BTreeSet<UserId>, RelationError>;

    /// State of the pair seen from `a`, read from one consistent snapshot.
    async fn relationship_state(
        &self,
        a: &UserId,
        b: &UserId,
    ) -> Result<RelationshipState, RelationError>;
}
