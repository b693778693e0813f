use super::authorization_guard::{AuthorizationGuard, Party};
use super::friend_graph_store::FriendGraphStore;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::{DocumentStore, StorageTx, TxManager};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Presence of the two projections of one logical record.
#[derive(Debug, Clone, Copy)]
struct Projections {
    near: bool,
    far: bool,
}

impl Projections {
    fn exists(&self) -> bool {
        self.near || self.far
    }

    fn torn(&self) -> bool {
        self.near != self.far
    }
}

pub struct RealFriendshipService {
    graph: FriendGraphStore,
    tx_manager: Arc<dyn TxManager>,
    identity: Arc<dyn IdentityProvider>,
}

impl RealFriendshipService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        tx_manager: Arc<dyn TxManager>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            graph: FriendGraphStore::new(store),
            tx_manager,
            identity,
        }
    }

    fn authorize_owner(&self, target: &UserId) -> Result<UserId, RelationError> {
        AuthorizationGuard::authorize(self.identity.current_actor_id(), target)
    }

    fn authorize_party(&self, a: &UserId, b: &UserId) -> Result<(UserId, Party), RelationError> {
        AuthorizationGuard::authorize_party(self.identity.current_actor_id(), a, b)
    }

    async fn begin(&self) -> Result<Box<dyn StorageTx<'_> + '_>, RelationError> {
        self.tx_manager
            .begin()
            .await
            .map_err(|e| RelationError::Store(format!("begin tx: {e}")))
    }

    async fn begin_read_only(&self) -> Result<Box<dyn StorageTx<'_> + '_>, RelationError> {
        self.tx_manager
            .begin_read_only()
            .await
            .map_err(|e| RelationError::Store(format!("begin read-only tx: {e}")))
    }

    /// `friends(a) ∋ b` and `friends(b) ∋ a`.
    async fn edge_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        a: &UserId,
        b: &UserId,
    ) -> Result<Projections, RelationError> {
        Ok(Projections {
            near: self.graph.has_friend_in_tx(tx, a, b).await?,
            far: self.graph.has_friend_in_tx(tx, b, a).await?,
        })
    }

    /// `outgoingRequests(sender) ∋ recipient` and
    /// `incomingRequests(recipient) ∋ sender`.
    async fn request_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        sender: &UserId,
        recipient: &UserId,
    ) -> Result<Projections, RelationError> {
        Ok(Projections {
            near: self.graph.has_outgoing_in_tx(tx, sender, recipient).await?,
            far: self.graph.has_incoming_in_tx(tx, recipient, sender).await?,
        })
    }

    async fn delete_request_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        sender: &UserId,
        recipient: &UserId,
    ) -> Result<(), RelationError> {
        self.graph
            .delete_outgoing_in_tx(tx, sender, recipient)
            .await?;
        self.graph
            .delete_incoming_in_tx(tx, recipient, sender)
            .await?;
        Ok(())
    }
}

fn require_id(user: &UserId) -> Result<(), RelationError> {
    if user.is_blank() {
        return Err(RelationError::InvalidUserId);
    }
    Ok(())
}

async fn commit(tx: Box<dyn StorageTx<'_> + '_>) -> Result<(), RelationError> {
    tx.commit()
        .await
        .map_err(|e| RelationError::Store(format!("commit tx: {e}")))
}

async fn abort<T>(tx: Box<dyn StorageTx<'_> + '_>, err: RelationError) -> Result<T, RelationError> {
    if let Err(e) = tx.rollback().await {
        warn!("rollback after \"{err}\": {e}");
    }
    debug!(kind = %err.kind(), "rejected: {err}");
    Err(err)
}

#[async_trait::async_trait]
impl FriendshipService for RealFriendshipService {
    async fn send_friend_request(
        &self,
        sender: &UserId,
        recipient: &UserId,
    ) -> Result<(), RelationError> {
        self.authorize_owner(sender)?;
        require_id(recipient)?;
        if sender == recipient {
            return Err(RelationError::SelfRequest);
        }

        // checks and writes share one tx, so two racing senders cannot both pass
        let mut tx = self.begin().await?;

        // every projection owner needs an active account
        if !self.graph.user_exists_in_tx(&mut *tx, sender).await? {
            return abort(tx, RelationError::ActorNotFound).await;
        }
        if !self.graph.user_exists_in_tx(&mut *tx, recipient).await? {
            return abort(tx, RelationError::RecipientNotFound).await;
        }
        let edge = self.edge_in_tx(&mut *tx, sender, recipient).await?;
        if edge.exists() {
            if edge.torn() {
                warn!(%sender, %recipient, "half friend edge found on send");
            }
            return abort(tx, RelationError::AlreadyFriends).await;
        }
        if self
            .request_in_tx(&mut *tx, sender, recipient)
            .await?
            .exists()
        {
            return abort(tx, RelationError::RequestAlreadySent).await;
        }
        if self
            .request_in_tx(&mut *tx, recipient, sender)
            .await?
            .exists()
        {
            return abort(tx, RelationError::ReverseRequestPending).await;
        }

        self.graph
            .put_outgoing_in_tx(&mut *tx, sender, recipient)
            .await?;
        self.graph
            .put_incoming_in_tx(&mut *tx, recipient, sender)
            .await?;
        commit(tx).await?;

        info!(%sender, %recipient, "friend request sent");
        Ok(())
    }

    async fn accept_friend_request(
        &self,
        recipient: &UserId,
        sender: &UserId,
    ) -> Result<(), RelationError> {
        self.authorize_owner(recipient)?;
        require_id(sender)?;

        let mut tx = self.begin().await?;

        let request = self.request_in_tx(&mut *tx, sender, recipient).await?;
        if !request.far {
            return abort(tx, RelationError::NoPendingRequest).await;
        }
        if request.torn() {
            warn!(%sender, %recipient, "outgoing projection missing, repairing on accept");
        }

        // order matters: request out, edge in, all in one tx
        self.delete_request_in_tx(&mut *tx, sender, recipient)
            .await?;
        self.graph
            .put_friend_in_tx(&mut *tx, recipient, sender)
            .await?;
        self.graph
            .put_friend_in_tx(&mut *tx, sender, recipient)
            .await?;
        commit(tx).await?;

        info!(%sender, %recipient, "friend request accepted");
        Ok(())
    }

    async fn reject_friend_request(
        &self,
        recipient: &UserId,
        sender: &UserId,
    ) -> Result<(), RelationError> {
        self.authorize_owner(recipient)?;
        require_id(sender)?;

        let mut tx = self.begin().await?;

        let request = self.request_in_tx(&mut *tx, sender, recipient).await?;
        if !request.far {
            return abort(tx, RelationError::NoPendingRequest).await;
        }
        if request.torn() {
            warn!(%sender, %recipient, "outgoing projection missing, repairing on reject");
        }

        self.delete_request_in_tx(&mut *tx, sender, recipient)
            .await?;
        commit(tx).await?;

        info!(%sender, %recipient, "friend request rejected");
        Ok(())
    }

    async fn cancel_friend_request(
        &self,
        sender: &UserId,
        recipient: &UserId,
    ) -> Result<(), RelationError> {
        self.authorize_owner(sender)?;
        require_id(recipient)?;

        let mut tx = self.begin().await?;

        let request = self.request_in_tx(&mut *tx, sender, recipient).await?;
        if !request.near {
            return abort(tx, RelationError::NoSentRequest).await;
        }
        if request.torn() {
            warn!(%sender, %recipient, "incoming projection missing, repairing on cancel");
        }

        self.delete_request_in_tx(&mut *tx, sender, recipient)
            .await?;
        commit(tx).await?;

        info!(%sender, %recipient, "friend request cancelled");
        Ok(())
    }

    async fn remove_friend(&self, a: &UserId, b: &UserId) -> Result<(), RelationError> {
        let (actor, _) = self.authorize_party(a, b)?;
        require_id(a)?;
        require_id(b)?;

        let mut tx = self.begin().await?;

        let edge = self.edge_in_tx(&mut *tx, a, b).await?;
        if !edge.exists() {
            return abort(tx, RelationError::NotFriends).await;
        }
        if edge.torn() {
            warn!(%a, %b, "half friend edge found, removing both projections");
        }

        self.graph.delete_friend_in_tx(&mut *tx, a, b).await?;
        self.graph.delete_friend_in_tx(&mut *tx, b, a).await?;
        commit(tx).await?;

        info!(%actor, %a, %b, "friend removed");
        Ok(())
    }

    async fn are_friends(&self, a: &UserId, b: &UserId) -> Result<bool, RelationError> {
        self.authorize_party(a, b)?;
        self.graph.has_friend(a, b).await
    }

    async fn has_pending_request(
        &self,
        from: &UserId,
        to: &UserId,
    ) -> Result<bool, RelationError> {
        match self.authorize_party(from, to)? {
            (_, Party::First) => self.graph.has_outgoing(from, to).await,
            (_, Party::Second) => self.graph.has_incoming(to, from).await,
        }
    }

    async fn list_friends(&self, user: &UserId) -> Result<BTreeSet<UserId>, RelationError> {
        self.authorize_owner(user)?;
        self.graph.list_friends(user).await
    }

    async fn list_incoming_requests(
        &self,
        user: &UserId,
    ) -> Result<BTreeSet<UserId>, RelationError> {
        self.authorize_owner(user)?;
        self.graph.list_incoming(user).await
    }

    async fn list_outgoing_requests(
        &self,
        user: &UserId,
    ) -> Result<BTreeSet<UserId>, RelationError> {
        self.authorize_owner(user)?;
        self.graph.list_outgoing(user).await
    }

    async fn relationship_state(
        &self,
        a: &UserId,
        b: &UserId,
    ) -> Result<RelationshipState, RelationError> {
        self.authorize_party(a, b)?;
        require_id(a)?;
        require_id(b)?;

        let mut tx = self.begin_read_only().await?;
        let edge = self.edge_in_tx(&mut *tx, a, b).await?;
        let a_to_b = self.request_in_tx(&mut *tx, a, b).await?;
        let b_to_a = self.request_in_tx(&mut *tx, b, a).await?;
        if let Err(e) = tx.rollback().await {
            warn!("rollback read-only tx: {e}");
        }

        let state = if edge.exists() {
            RelationshipState::Friends
        } else if a_to_b.exists() {
            RelationshipState::PendingAtoB
        } else if b_to_a.exists() {
            RelationshipState::PendingBtoA
        } else {
            RelationshipState::None
        };
        Ok(state)
    }
}
