use crate::domain_model::*;

#[async_trait::async_trait]
pub trait TxManager: Send + Sync {
    async fn begin<'t>(&'t self) -> anyhow::Result<Box<dyn StorageTx<'t> + 't>>;

    /// Consistent snapshot for reads only. Reads take no locks and writes
    /// are refused.
    async fn begin_read_only<'t>(&'t self) -> anyhow::Result<Box<dyn StorageTx<'t> + 't>>;
}

/// Handle to one multi-key transaction.
///
/// Reads observe a consistent snapshot that includes the handle's own staged
/// writes. Nothing is visible to other callers until `commit` succeeds, and a
/// handle dropped without `commit` behaves like `rollback`.
#[async_trait::async_trait]
pub trait StorageTx<'t>: Send {
    async fn exists(&mut self, key: &DocKey) -> anyhow::Result<bool>;
    /// Fails if `key.owner` is not an active user.
    async fn put(&mut self, key: &DocKey) -> anyhow::Result<()>;
    async fn delete(&mut self, key: &DocKey) -> anyhow::Result<()>;
    async fn user_exists(&mut self, user: &UserId) -> anyhow::Result<bool>;

    async fn commit(self: Box<Self>) -> anyhow::Result<()>;
    async fn rollback(self: Box<Self>) -> anyhow::Result<()>;
}
