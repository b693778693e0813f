use crate::domain_model::*;
use crate::domain_port::{StorageTx, TxManager};
use anyhow::anyhow;
use sqlx::{MySql, MySqlConnection, MySqlPool, Transaction};

pub struct MySqlTxManager {
    pool: MySqlPool,
}

impl MySqlTxManager {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlTxManager { pool }
    }
}

#[async_trait::async_trait]
impl TxManager for MySqlTxManager {
    async fn begin<'t>(&'t self) -> anyhow::Result<Box<dyn StorageTx<'t> + 't>> {
        let tx = self.pool.begin().await.map_err(|e| anyhow!(e))?;
        Ok(Box::new(MySqlTx::new(tx)))
    }

    async fn begin_read_only<'t>(&'t self) -> anyhow::Result<Box<dyn StorageTx<'t> + 't>> {
        let tx = self.pool.begin().await.map_err(|e| anyhow!(e))?;
        Ok(Box::new(MySqlTx::read_only(tx)))
    }
}

/// Reads inside a read-write transaction are locking reads, so two
/// transactions that check the same projection before writing it are
/// serialized by InnoDB. A read-only handle uses plain consistent reads and
/// takes no row locks. A dropped handle is rolled back by sqlx.
pub struct MySqlTx<'t> {
    inner: Transaction<'t, MySql>,
    read_only: bool,
}

impl<'t> MySqlTx<'t> {
    pub fn new(inner: Transaction<'t, MySql>) -> Self {
        MySqlTx {
            inner,
            read_only: false,
        }
    }

    pub fn read_only(inner: Transaction<'t, MySql>) -> Self {
        MySqlTx {
            inner,
            read_only: true,
        }
    }

    pub fn conn(&mut self) -> &mut MySqlConnection {
        self.inner.as_mut()
    }
}

#[async_trait::async_trait]
impl<'t> StorageTx<'t> for MySqlTx<'t> {
    async fn exists(&mut self, key: &DocKey) -> anyhow::Result<bool> {
        let sql = if self.read_only {
            r#"
SELECT 1 FROM shard_entry
WHERE owner_id = ? AND collection = ? AND member_id = ?
"#
        } else {
            r#"
SELECT 1 FROM shard_entry
WHERE owner_id = ? AND collection = ? AND member_id = ?
FOR UPDATE
"#
        };
        let row = sqlx::query(sql)
            .bind(&key.owner)
            .bind(key.collection.name())
            .bind(&key.member)
            .fetch_optional(self.conn())
            .await
            .map_err(|e| anyhow!("select {key}: {e}"))?;

        Ok(row.is_some())
    }

    async fn put(&mut self, key: &DocKey) -> anyhow::Result<()> {
        if self.read_only {
            return Err(anyhow!("write {key} in a read-only transaction"));
        }
        sqlx::query(
            r#"
INSERT INTO shard_entry (owner_id, collection, member_id)
VALUES (?, ?, ?)
ON DUPLICATE KEY UPDATE created_at = created_at
"#,
        )
        .bind(&key.owner)
        .bind(key.collection.name())
        .bind(&key.member)
        .execute(self.conn())
        .await
        .map_err(|e| anyhow!("insert {key}: {e}"))?;

        Ok(())
    }

    async fn delete(&mut self, key: &DocKey) -> anyhow::Result<()> {
        if self.read_only {
            return Err(anyhow!("delete {key} in a read-only transaction"));
        }
        sqlx::query(
            "DELETE FROM shard_entry WHERE owner_id = ? AND collection = ? AND member_id = ?",
        )
        .bind(&key.owner)
        .bind(key.collection.name())
        .bind(&key.member)
        .execute(self.conn())
        .await
        .map_err(|e| anyhow!("delete {key}: {e}"))?;

        Ok(())
    }

    async fn user_exists(&mut self, user: &UserId) -> anyhow::Result<bool> {
        let sql = if self.read_only {
            "SELECT 1 FROM user WHERE user_id = ? AND is_active = 1"
        } else {
            "SELECT 1 FROM user WHERE user_id = ? AND is_active = 1 FOR SHARE"
        };
        let row = sqlx::query(sql)
            .bind(user)
            .fetch_optional(self.conn())
            .await
            .map_err(|e| anyhow!("select user {user}: {e}"))?;

        Ok(row.is_some())
    }

    async fn commit(self: Box<Self>) -> anyhow::Result<()> {
        self.inner.commit().await.map_err(|e| anyhow!(e))?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> anyhow::Result<()> {
        self.inner.rollback().await.map_err(|e| anyhow!(e))?;
        Ok(())
    }
}
