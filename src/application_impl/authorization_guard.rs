use crate::application_port::RelationError;
use crate::domain_model::UserId;

/// Which side of a two-party relationship the actor is on.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Party {
    First,
    Second,
}

/// Pure checks that gate every friend graph operation. None of them touch
/// the store, so a rejected call costs no I/O.
pub struct AuthorizationGuard;

impl AuthorizationGuard {
    pub fn actor(current: Option<UserId>) -> Result<UserId, RelationError> {
        match current {
            Some(actor) if !actor.is_blank() => Ok(actor),
            _ => Err(RelationError::Unauthenticated),
        }
    }

    /// Owner-only access: the actor may only touch its own shard.
    pub fn authorize(current: Option<UserId>, target: &UserId) -> Result<UserId, RelationError> {
        let actor = Self::actor(current)?;
        Self::require_owner(&actor, target)?;
        Ok(actor)
    }

    /// Two-party access: the actor must be `a` or `b`.
    pub fn authorize_party(
        current: Option<UserId>,
        a: &UserId,
        b: &UserId,
    ) -> Result<(UserId, Party), RelationError> {
        let actor = Self::actor(current)?;
        let party = Self::require_party(&actor, a, b)?;
        Ok((actor, party))
    }

    pub fn require_owner(actor: &UserId, target: &UserId) -> Result<(), RelationError> {
        if actor == target {
            Ok(())
        } else {
            Err(RelationError::NotAuthorized)
        }
    }

    pub fn require_party(actor: &UserId, a: &UserId, b: &UserId) -> Result<Party, RelationError> {
        if actor == a {
            Ok(Party::First)
        } else if actor == b {
            Ok(Party::Second)
        } else {
            Err(RelationError::NotAuthorized)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_port::ErrorKind;

    fn uid(s: &str) -> UserId {
        UserId::from(s)
    }

    #[test]
    fn missing_or_blank_actor_is_unauthenticated() {
        let err = AuthorizationGuard::actor(None).unwrap_err();
        assert!(matches!(err, RelationError::Unauthenticated));

        let err = AuthorizationGuard::actor(Some(uid("  "))).unwrap_err();
        assert!(matches!(err, RelationError::Unauthenticated));
        assert_eq!(err.kind(), ErrorKind::Authorization);
    }

    #[test]
    fn owner_must_match_target() {
        let actor = AuthorizationGuard::authorize(Some(uid("u1")), &uid("u1")).unwrap();
        assert_eq!(actor, uid("u1"));

        let err = AuthorizationGuard::authorize(Some(uid("u1")), &uid("u2")).unwrap_err();
        assert!(matches!(err, RelationError::NotAuthorized));
    }

    #[test]
    fn party_side_follows_actor() {
        let (_, side) =
            AuthorizationGuard::authorize_party(Some(uid("u1")), &uid("u1"), &uid("u2")).unwrap();
        assert_eq!(side, Party::First);

        let (_, side) =
            AuthorizationGuard::authorize_party(Some(uid("u2")), &uid("u1"), &uid("u2")).unwrap();
        assert_eq!(side, Party::Second);

        let err = AuthorizationGuard::authorize_party(Some(uid("u3")), &uid("u1"), &uid("u2"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
    }
}
