use crate::application_port::RelationError;
use crate::domain_model::*;
use crate::domain_port::{DocumentStore, StorageTx};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Typed accessors over the `friends`, `incomingRequests` and
/// `outgoingRequests` collections of each user's shard.
///
/// This layer does not enforce any relationship invariant. Mutations belong
/// to the friendship service, which keeps both projections of a record in
/// step.
pub struct FriendGraphStore {
    store: Arc<dyn DocumentStore>,
}

impl FriendGraphStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    // region reads outside of a transaction

    pub async fn list_friends(&self, user: &UserId) -> Result<BTreeSet<UserId>, RelationError> {
        self.list(user, Collection::Friends).await
    }

    pub async fn list_incoming(&self, user: &UserId) -> Result<BTreeSet<UserId>, RelationError> {
        self.list(user, Collection::IncomingRequests).await
    }

    pub async fn list_outgoing(&self, user: &UserId) -> Result<BTreeSet<UserId>, RelationError> {
        self.list(user, Collection::OutgoingRequests).await
    }

    pub async fn has_friend(&self, user: &UserId, other: &UserId) -> Result<bool, RelationError> {
        self.contains(DocKey::new(user, Collection::Friends, other))
            .await
    }

    pub async fn has_incoming(
        &self,
        user: &UserId,
        other: &UserId,
    ) -> Result<bool, RelationError> {
        self.contains(DocKey::new(user, Collection::IncomingRequests, other))
            .await
    }

    pub async fn has_outgoing(
        &self,
        user: &UserId,
        other: &UserId,
    ) -> Result<bool, RelationError> {
        self.contains(DocKey::new(user, Collection::OutgoingRequests, other))
            .await
    }

    pub async fn user_exists(&self, user: &UserId) -> Result<bool, RelationError> {
        self.store
            .user_exists(user)
            .await
            .map_err(|e| RelationError::Store(format!("query user {user}: {e}")))
    }

    async fn list(
        &self,
        user: &UserId,
        collection: Collection,
    ) -> Result<BTreeSet<UserId>, RelationError> {
        self.store
            .list(user, collection)
            .await
            .map_err(|e| RelationError::Store(format!("list {user}/{collection}: {e}")))
    }

    async fn contains(&self, key: DocKey) -> Result<bool, RelationError> {
        self.store
            .exists(&key)
            .await
            .map_err(|e| RelationError::Store(format!("read {key}: {e}")))
    }

    // endregion

    // region reads inside a transaction

    pub async fn has_friend_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        user: &UserId,
        other: &UserId,
    ) -> Result<bool, RelationError> {
        contains_in_tx(tx, DocKey::new(user, Collection::Friends, other)).await
    }

    pub async fn has_incoming_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        user: &UserId,
        other: &UserId,
    ) -> Result<bool, RelationError> {
        contains_in_tx(tx, DocKey::new(user, Collection::IncomingRequests, other)).await
    }

    pub async fn has_outgoing_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        user: &UserId,
        other: &UserId,
    ) -> Result<bool, RelationError> {
        contains_in_tx(tx, DocKey::new(user, Collection::OutgoingRequests, other)).await
    }

    pub async fn user_exists_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        user: &UserId,
    ) -> Result<bool, RelationError> {
        tx.user_exists(user)
            .await
            .map_err(|e| RelationError::Store(format!("query user {user}: {e}")))
    }

    // endregion

    // region writes inside a transaction

    pub async fn put_friend_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        user: &UserId,
        other: &UserId,
    ) -> Result<(), RelationError> {
        put_in_tx(tx, DocKey::new(user, Collection::Friends, other)).await
    }

    pub async fn delete_friend_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        user: &UserId,
        other: &UserId,
    ) -> Result<(), RelationError> {
        delete_in_tx(tx, DocKey::new(user, Collection::Friends, other)).await
    }

    pub async fn put_outgoing_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        user: &UserId,
        other: &UserId,
    ) -> Result<(), RelationError> {
        put_in_tx(tx, DocKey::new(user, Collection::OutgoingRequests, other)).await
    }

    pub async fn delete_outgoing_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        user: &UserId,
        other: &UserId,
    ) -> Result<(), RelationError> {
        delete_in_tx(tx, DocKey::new(user, Collection::OutgoingRequests, other)).await
    }

    pub async fn put_incoming_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        user: &UserId,
        other: &UserId,
    ) -> Result<(), RelationError> {
        put_in_tx(tx, DocKey::new(user, Collection::IncomingRequests, other)).await
    }

    pub async fn delete_incoming_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        user: &UserId,
        other: &UserId,
    ) -> Result<(), RelationError> {
        delete_in_tx(tx, DocKey::new(user, Collection::IncomingRequests, other)).await
    }

    // endregion
}

async fn contains_in_tx(tx: &mut dyn StorageTx<'_>, key: DocKey) -> Result<bool, RelationError> {
    tx.exists(&key)
        .await
        .map_err(|e| RelationError::Store(format!("read {key}: {e}")))
}

async fn put_in_tx(tx: &mut dyn StorageTx<'_>, key: DocKey) -> Result<(), RelationError> {
    tx.put(&key)
        .await
        .map_err(|e| RelationError::Store(format!("write {key}: {e}")))
}

async fn delete_in_tx(tx: &mut dyn StorageTx<'_>, key: DocKey) -> Result<(), RelationError> {
    tx.delete(&key)
        .await
        .map_err(|e| RelationError::Store(format!("delete {key}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain_port::TxManager;
    use crate::infra_memory::InMemoryStore;

    fn uid(s: &str) -> UserId {
        UserId::from(s)
    }

    #[tokio::test]
    async fn user_exists_reads_registered_users() {
        let store = Arc::new(InMemoryStore::new());
        store.register_user("u1").await;
        let graph = FriendGraphStore::new(store.clone());

        assert!(graph.user_exists(&uid("u1")).await.unwrap());
        assert!(!graph.user_exists(&uid("u2")).await.unwrap());
        assert_eq!(store.access_count(), 2);
    }

    #[tokio::test]
    async fn projections_are_independent_keys() {
        let store = Arc::new(InMemoryStore::new());
        store.register_user("u1").await;
        let graph = FriendGraphStore::new(store.clone());

        let mut tx = store.begin().await.unwrap();
        graph
            .put_outgoing_in_tx(&mut *tx, &uid("u1"), &uid("u2"))
            .await
            .unwrap();
        assert!(graph.has_outgoing_in_tx(&mut *tx, &uid("u1"), &uid("u2")).await.unwrap());
        assert!(!graph.has_incoming_in_tx(&mut *tx, &uid("u2"), &uid("u1")).await.unwrap());
        tx.commit().await.unwrap();

        assert_eq!(
            graph.list_outgoing(&uid("u1")).await.unwrap(),
            BTreeSet::from([uid("u2")])
        );
        assert!(graph.list_incoming(&uid("u2")).await.unwrap().is_empty());
    }
}
