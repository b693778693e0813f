use crate::domain_model::*;
use crate::domain_port::DocumentStore;
use anyhow::anyhow;
use sqlx::{MySqlPool, Row};
use std::collections::BTreeSet;

pub struct MySqlDocumentStore {
    pool: MySqlPool,
}

impl MySqlDocumentStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl DocumentStore for MySqlDocumentStore {
    async fn exists(&self, key: &DocKey) -> anyhow::Result<bool> {
        let count: i64 = sqlx::query_scalar(
            r#"
SELECT COUNT(1)
FROM shard_entry
WHERE owner_id = ? AND collection = ? AND member_id = ?
"#,
        )
        .bind(&key.owner)
        .bind(key.collection.name())
        .bind(&key.member)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| anyhow!("count {key}: {e}"))?;

        Ok(count > 0)
    }

    async fn list(
        &self,
        owner: &UserId,
        collection: Collection,
    ) -> anyhow::Result<BTreeSet<UserId>> {
        let rows = sqlx::query(
            r#"
SELECT member_id
FROM shard_entry
WHERE owner_id = ? AND collection = ?
"#,
        )
        .bind(owner)
        .bind(collection.name())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!("list {owner}/{collection}: {e}"))?;

        rows.iter()
            .map(|row| {
                row.try_get::<UserId, _>("member_id")
                    .map_err(|e| anyhow!("decode member_id: {e}"))
            })
            .collect()
    }

    async fn user_exists(&self, user: &UserId) -> anyhow::Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM user WHERE user_id = ? AND is_active = 1")
                .bind(user)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| anyhow!("count user {user}: {e}"))?;

        Ok(count > 0)
    }
}
