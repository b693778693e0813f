mod common;

use common::*;
use rapport::application_port::*;
use rapport::domain_model::*;
use rapport::domain_port::{StorageTx, TxManager};
use std::collections::BTreeSet;
use std::sync::Arc;

fn set(users: &[&str]) -> BTreeSet<UserId> {
    users.iter().map(|u| uid(u)).collect()
}

#[tokio::test]
async fn friendship_lifecycle() {
    let g = Graph::with_users(&["u1", "u2"]).await;
    let (u1, u2) = (uid("u1"), uid("u2"));

    g.act_as("u1");
    g.service.send_friend_request(&u1, &u2).await.unwrap();
    assert!(g.service.has_pending_request(&u1, &u2).await.unwrap());

    g.act_as("u2");
    g.service.accept_friend_request(&u2, &u1).await.unwrap();
    assert_eq!(g.service.list_friends(&u2).await.unwrap(), set(&["u1"]));

    g.act_as("u1");
    assert_eq!(g.service.list_friends(&u1).await.unwrap(), set(&["u2"]));

    g.service.remove_friend(&u1, &u2).await.unwrap();
    assert!(g.service.list_friends(&u1).await.unwrap().is_empty());
}

#[tokio::test]
async fn accept_leaves_no_pending_request() {
    let g = Graph::with_users(&["a", "b"]).await;
    let (a, b) = (uid("a"), uid("b"));

    g.act_as("a");
    g.service.send_friend_request(&a, &b).await.unwrap();
    g.act_as("b");
    g.service.accept_friend_request(&b, &a).await.unwrap();

    assert!(g.service.are_friends(&b, &a).await.unwrap());
    assert!(!g.service.has_pending_request(&a, &b).await.unwrap());
    assert!(!g.service.has_pending_request(&b, &a).await.unwrap());
    assert!(g.service.list_incoming_requests(&b).await.unwrap().is_empty());

    g.act_as("a");
    assert!(g.service.are_friends(&a, &b).await.unwrap());
    assert!(!g.service.has_pending_request(&a, &b).await.unwrap());
    assert!(!g.service.has_pending_request(&b, &a).await.unwrap());
    assert!(g.service.list_outgoing_requests(&a).await.unwrap().is_empty());
    assert_eq!(
        g.service.relationship_state(&a, &b).await.unwrap(),
        RelationshipState::Friends
    );
}

#[tokio::test]
async fn duplicate_request_is_a_conflict() {
    let g = Graph::with_users(&["a", "b"]).await;
    let (a, b) = (uid("a"), uid("b"));

    g.act_as("a");
    g.service.send_friend_request(&a, &b).await.unwrap();
    let err = g.service.send_friend_request(&a, &b).await.unwrap_err();
    assert!(matches!(err, RelationError::RequestAlreadySent));
    assert_eq!(err.kind(), ErrorKind::Conflict);

    assert_eq!(g.service.list_outgoing_requests(&a).await.unwrap(), set(&["b"]));
}

#[tokio::test]
async fn self_request_is_rejected() {
    let g = Graph::with_users(&["a", "b", "c"]).await;

    for name in ["a", "b", "c", "ghost"] {
        g.act_as(name);
        let me = uid(name);
        let err = g.service.send_friend_request(&me, &me).await.unwrap_err();
        assert!(matches!(err, RelationError::SelfRequest), "{name}");
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
    assert!(g.store.snapshot().await.is_empty());
}

#[tokio::test]
async fn crossed_request_is_not_auto_accepted() {
    let g = Graph::with_users(&["a", "b"]).await;
    let (a, b) = (uid("a"), uid("b"));

    g.act_as("a");
    g.service.send_friend_request(&a, &b).await.unwrap();

    g.act_as("b");
    let err = g.service.send_friend_request(&b, &a).await.unwrap_err();
    assert!(matches!(err, RelationError::ReverseRequestPending));
    assert_eq!(err.kind(), ErrorKind::Conflict);

    assert!(!g.service.are_friends(&b, &a).await.unwrap());
    assert_eq!(
        g.service.relationship_state(&b, &a).await.unwrap(),
        RelationshipState::PendingBtoA
    );
    assert!(g.service.list_outgoing_requests(&b).await.unwrap().is_empty());
}

#[tokio::test]
async fn removal_is_symmetric_and_not_idempotent() {
    let g = Graph::with_users(&["a", "b"]).await;
    let (a, b) = (uid("a"), uid("b"));

    g.act_as("a");
    g.service.send_friend_request(&a, &b).await.unwrap();
    g.act_as("b");
    g.service.accept_friend_request(&b, &a).await.unwrap();

    // either party may remove
    g.service.remove_friend(&a, &b).await.unwrap();
    assert!(!g.service.are_friends(&b, &a).await.unwrap());
    g.act_as("a");
    assert!(!g.service.are_friends(&a, &b).await.unwrap());

    let err = g.service.remove_friend(&a, &b).await.unwrap_err();
    assert!(matches!(err, RelationError::NotFriends));
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(g.store.snapshot().await.is_empty());
}

#[tokio::test]
async fn outsider_is_rejected_before_store_access() {
    let g = Graph::with_users(&["a", "b", "c"]).await;
    let (a, b) = (uid("a"), uid("b"));

    g.act_as("c");
    let results = vec![
        g.service.send_friend_request(&a, &b).await.err(),
        g.service.accept_friend_request(&b, &a).await.err(),
        g.service.reject_friend_request(&b, &a).await.err(),
        g.service.cancel_friend_request(&a, &b).await.err(),
        g.service.remove_friend(&a, &b).await.err(),
        g.service.are_friends(&a, &b).await.err(),
        g.service.has_pending_request(&a, &b).await.err(),
        g.service.list_friends(&a).await.err(),
        g.service.list_incoming_requests(&a).await.err(),
        g.service.list_outgoing_requests(&a).await.err(),
        g.service.relationship_state(&a, &b).await.err(),
    ];
    for err in results {
        let err = err.expect("outsider call must fail");
        assert!(matches!(err, RelationError::NotAuthorized));
        assert_eq!(err.kind(), ErrorKind::Authorization);
    }

    assert_eq!(g.store.access_count(), 0);
}

#[tokio::test]
async fn unauthenticated_is_rejected_before_store_access() {
    let g = Graph::with_users(&["a", "b"]).await;
    let (a, b) = (uid("a"), uid("b"));

    g.sign_out();
    let err = g.service.send_friend_request(&a, &b).await.unwrap_err();
    assert!(matches!(err, RelationError::Unauthenticated));
    let err = g.service.list_friends(&a).await.unwrap_err();
    assert!(matches!(err, RelationError::Unauthenticated));

    g.act_as("");
    let err = g.service.are_friends(&a, &b).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);

    assert_eq!(g.store.access_count(), 0);
}

#[tokio::test]
async fn unknown_recipient_is_a_validation_error() {
    let g = Graph::with_users(&["a"]).await;
    let a = uid("a");

    g.act_as("a");
    let err = g
        .service
        .send_friend_request(&a, &uid("nobody"))
        .await
        .unwrap_err();
    assert!(matches!(err, RelationError::RecipientNotFound));
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = g
        .service
        .send_friend_request(&a, &uid(" "))
        .await
        .unwrap_err();
    assert!(matches!(err, RelationError::InvalidUserId));
    assert_eq!(err.kind(), ErrorKind::Validation);

    assert!(g.store.snapshot().await.is_empty());
}

#[tokio::test]
async fn sender_without_account_is_rejected() {
    let g = Graph::with_users(&["b"]).await;
    let (ghost, b) = (uid("ghost"), uid("b"));

    // signed in, but never registered as a user
    g.act_as("ghost");
    let err = g.service.send_friend_request(&ghost, &b).await.unwrap_err();
    assert!(matches!(err, RelationError::ActorNotFound));
    assert_eq!(err.kind(), ErrorKind::Authorization);
    assert!(g.store.snapshot().await.is_empty());

    g.act_as("b");
    assert!(g.service.list_incoming_requests(&b).await.unwrap().is_empty());
}

#[tokio::test]
async fn request_to_a_friend_is_a_conflict() {
    let g = Graph::with_users(&["a", "b"]).await;
    let (a, b) = (uid("a"), uid("b"));

    g.act_as("a");
    g.service.send_friend_request(&a, &b).await.unwrap();
    g.act_as("b");
    g.service.accept_friend_request(&b, &a).await.unwrap();

    let err = g.service.send_friend_request(&b, &a).await.unwrap_err();
    assert!(matches!(err, RelationError::AlreadyFriends));
    g.act_as("a");
    let err = g.service.send_friend_request(&a, &b).await.unwrap_err();
    assert!(matches!(err, RelationError::AlreadyFriends));
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn missing_request_is_not_found() {
    let g = Graph::with_users(&["a", "b"]).await;
    let (a, b) = (uid("a"), uid("b"));

    g.act_as("b");
    let err = g.service.accept_friend_request(&b, &a).await.unwrap_err();
    assert!(matches!(err, RelationError::NoPendingRequest));
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = g.service.reject_friend_request(&b, &a).await.unwrap_err();
    assert!(matches!(err, RelationError::NoPendingRequest));

    g.act_as("a");
    let err = g.service.cancel_friend_request(&a, &b).await.unwrap_err();
    assert!(matches!(err, RelationError::NoSentRequest));
    assert_eq!(err.kind(), ErrorKind::NotFound);

    // the sender cannot accept its own request
    g.service.send_friend_request(&a, &b).await.unwrap();
    let err = g.service.accept_friend_request(&a, &b).await.unwrap_err();
    assert!(matches!(err, RelationError::NoPendingRequest));
}

#[tokio::test]
async fn reject_and_cancel_clear_both_projections() {
    let g = Graph::with_users(&["a", "b"]).await;
    let (a, b) = (uid("a"), uid("b"));

    g.act_as("a");
    g.service.send_friend_request(&a, &b).await.unwrap();
    g.act_as("b");
    assert_eq!(g.service.list_incoming_requests(&b).await.unwrap(), set(&["a"]));
    g.service.reject_friend_request(&b, &a).await.unwrap();
    assert!(g.store.snapshot().await.is_empty());
    assert!(!g.service.are_friends(&b, &a).await.unwrap());

    // a rejected request may be sent again, then withdrawn
    g.act_as("a");
    g.service.send_friend_request(&a, &b).await.unwrap();
    g.service.cancel_friend_request(&a, &b).await.unwrap();
    assert!(g.store.snapshot().await.is_empty());
    assert_eq!(
        g.service.relationship_state(&a, &b).await.unwrap(),
        RelationshipState::None
    );
}

#[tokio::test]
async fn pending_check_follows_the_actor() {
    let g = Graph::with_users(&["a", "b"]).await;
    let (a, b) = (uid("a"), uid("b"));

    g.act_as("a");
    g.service.send_friend_request(&a, &b).await.unwrap();
    assert!(g.service.has_pending_request(&a, &b).await.unwrap());
    assert!(!g.service.has_pending_request(&b, &a).await.unwrap());
    assert_eq!(
        g.service.relationship_state(&a, &b).await.unwrap(),
        RelationshipState::PendingAtoB
    );

    // the recipient sees the same request through its incoming collection
    g.act_as("b");
    assert!(g.service.has_pending_request(&a, &b).await.unwrap());
    assert!(!g.service.has_pending_request(&b, &a).await.unwrap());
    assert_eq!(
        g.service.relationship_state(&b, &a).await.unwrap(),
        RelationshipState::PendingBtoA
    );
}

#[tokio::test]
async fn lists_are_owner_only() {
    let g = Graph::with_users(&["a", "b", "c"]).await;
    let (a, b, c) = (uid("a"), uid("b"), uid("c"));

    g.act_as("a");
    g.service.send_friend_request(&a, &b).await.unwrap();
    g.service.send_friend_request(&a, &c).await.unwrap();
    assert_eq!(
        g.service.list_outgoing_requests(&a).await.unwrap(),
        set(&["b", "c"])
    );
    let err = g.service.list_incoming_requests(&b).await.unwrap_err();
    assert!(matches!(err, RelationError::NotAuthorized));

    g.act_as("c");
    assert_eq!(g.service.list_incoming_requests(&c).await.unwrap(), set(&["a"]));
    assert!(g.service.list_outgoing_requests(&c).await.unwrap().is_empty());
}

#[tokio::test]
async fn commit_failure_is_transient_and_leaves_no_trace() {
    let g = Graph::with_users(&["a", "b"]).await;
    let (a, b) = (uid("a"), uid("b"));

    g.act_as("a");
    g.store.fail_next_commit();
    let err = g.service.send_friend_request(&a, &b).await.unwrap_err();
    assert!(matches!(err, RelationError::Store(_)));
    assert_eq!(err.kind(), ErrorKind::Transient);
    assert!(g.store.snapshot().await.is_empty());

    g.service.send_friend_request(&a, &b).await.unwrap();
    g.act_as("b");
    g.store.fail_next_commit();
    let err = g.service.accept_friend_request(&b, &a).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transient);
    assert!(!g.service.are_friends(&b, &a).await.unwrap());
    assert!(g.service.has_pending_request(&a, &b).await.unwrap());
}

#[tokio::test]
async fn half_written_records_are_repaired() {
    let g = Graph::with_users(&["a", "b"]).await;
    let (a, b) = (uid("a"), uid("b"));

    // damage: only one projection of a request and of an edge
    let mut tx = g.store.begin().await.unwrap();
    tx.put(&DocKey::new(&a, Collection::OutgoingRequests, &b))
        .await
        .unwrap();
    tx.commit().await.unwrap();

    g.act_as("a");
    g.service.cancel_friend_request(&a, &b).await.unwrap();
    assert!(g.store.snapshot().await.is_empty());

    let mut tx = g.store.begin().await.unwrap();
    tx.put(&DocKey::new(&b, Collection::Friends, &a)).await.unwrap();
    tx.commit().await.unwrap();

    let err = g.service.send_friend_request(&a, &b).await.unwrap_err();
    assert!(matches!(err, RelationError::AlreadyFriends));
    g.service.remove_friend(&a, &b).await.unwrap();
    assert!(g.store.snapshot().await.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_crossed_requests_leave_one_request() {
    for _ in 0..20 {
        let store = Arc::new(rapport::infra_memory::InMemoryStore::new());
        store.register_user("a").await;
        store.register_user("b").await;

        let left = Graph::on(store.clone());
        let right = Graph::on(store.clone());
        left.act_as("a");
        right.act_as("b");

        let l = tokio::spawn(async move {
            left.service
                .send_friend_request(&uid("a"), &uid("b"))
                .await
        });
        let r = tokio::spawn(async move {
            right
                .service
                .send_friend_request(&uid("b"), &uid("a"))
                .await
        });
        let results = [l.await.unwrap(), r.await.unwrap()];

        let ok = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(ok, 1);
        let err = results.into_iter().find_map(Result::err).unwrap();
        assert!(matches!(err, RelationError::ReverseRequestPending));
        // one request, two projections
        assert_eq!(store.snapshot().await.len(), 2);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_duplicate_requests_write_once() {
    let store = Arc::new(rapport::infra_memory::InMemoryStore::new());
    for user in ["a", "b"] {
        store.register_user(user).await;
    }

    let mut handles = Vec::new();
    for _ in 0..8 {
        let client = Graph::on(store.clone());
        client.act_as("a");
        handles.push(tokio::spawn(async move {
            client
                .service
                .send_friend_request(&uid("a"), &uid("b"))
                .await
        }));
    }

    let mut ok = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => ok += 1,
            Err(e) => assert!(matches!(e, RelationError::RequestAlreadySent)),
        }
    }
    assert_eq!(ok, 1);
    assert_eq!(store.snapshot().await.len(), 2);
}
