use crate::domain_model::*;
use std::collections::BTreeSet;

/// Point reads outside of any transaction. Results may lag behind a
/// mutation another caller has just committed.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    async fn exists(&self, key: &DocKey) -> anyhow::Result<bool>;
    async fn list(&self, owner: &UserId, collection: Collection)
    -> anyhow::Result<BTreeSet<UserId>>;
    async fn user_exists(&self, user: &UserId) -> anyhow::Result<bool>;
}
