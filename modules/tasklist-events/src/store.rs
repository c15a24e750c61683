//! PgBroker: durable partitioned topic log backed by Postgres.
//!
//! Offsets are gap-free per partition: a send takes a transaction-scoped
//! advisory lock on its (topic, partition) before allocating the next offset,
//! so offsets are assigned in commit order and a reader never skips an
//! in-flight message. Consumer groups keep their committed offsets in
//! `consumer_offsets`, which is what lets the projector resume after a crash.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::RwLock;
use tracing::debug;

use crate::broker::{Consumer, Delivery, Producer, SendReceipt};
use crate::channel::partition_for;

// ---------------------------------------------------------------------------
// PgBroker
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct PgBroker {
    pool: PgPool,
    default_partitions: u32,
    /// topic -> partition count, as stored in `topics`
    partitions: Arc<RwLock<HashMap<String, u32>>>,
}

impl PgBroker {
    /// `default_partitions` applies only to topics this broker creates.
    pub fn new(pool: PgPool, default_partitions: u32) -> Self {
        Self {
            pool,
            default_partitions: default_partitions.max(1),
            partitions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create `topic` if it does not exist and return its partition count.
    ///
    /// The stored count always wins, so producers and consumers configured
    /// with different defaults still agree on the key → partition mapping.
    pub async fn ensure_topic(&self, topic: &str) -> Result<u32> {
        if let Some(count) = self.partitions.read().await.get(topic) {
            return Ok(*count);
        }

        sqlx::query(
            r#"
            INSERT INTO topics (name, partitions)
            VALUES ($1, $2)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(topic)
        .bind(self.default_partitions as i32)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query_as::<_, (i32,)>("SELECT partitions FROM topics WHERE name = $1")
            .bind(topic)
            .fetch_one(&self.pool)
            .await?;

        let count = u32::try_from(row.0)
            .with_context(|| format!("topic {topic} has invalid partition count {}", row.0))?
            .max(1);
        self.partitions.write().await.insert(topic.to_string(), count);
        Ok(count)
    }
}

#[async_trait]
impl Producer for PgBroker {
    async fn send(&self, topic: &str, key: &str, payload: serde_json::Value) -> Result<SendReceipt> {
        let partitions = self.ensure_topic(topic).await?;
        let partition = partition_for(key, partitions);

        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1), $2)")
            .bind(topic)
            .bind(partition as i32)
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query_as::<_, (i64,)>(
            r#"
            INSERT INTO topic_messages (topic, partition_no, msg_offset, msg_key, payload)
            SELECT $1, $2, COALESCE(MAX(msg_offset) + 1, 0), $3, $4
            FROM topic_messages
            WHERE topic = $1 AND partition_no = $2
            RETURNING msg_offset
            "#,
        )
        .bind(topic)
        .bind(partition as i32)
        .bind(key)
        .bind(&payload)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let offset = row.0;
        debug!(topic, partition, offset, key, "Message appended");
        Ok(SendReceipt { partition, offset })
    }
}

#[async_trait]
impl Consumer for PgBroker {
    async fn partitions(&self, topic: &str) -> Result<u32> {
        self.ensure_topic(topic).await
    }

    async fn fetch(
        &self,
        topic: &str,
        partition: u32,
        from_offset: i64,
        limit: usize,
    ) -> Result<Vec<Delivery>> {
        let rows = sqlx::query_as::<_, Delivery>(
            r#"
            SELECT topic, partition_no, msg_offset, msg_key, payload, ts
            FROM topic_messages
            WHERE topic = $1 AND partition_no = $2 AND msg_offset >= $3
            ORDER BY msg_offset ASC
            LIMIT $4
            "#,
        )
        .bind(topic)
        .bind(partition as i32)
        .bind(from_offset)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn committed(&self, group: &str, topic: &str, partition: u32) -> Result<i64> {
        let row = sqlx::query_as::<_, (i64,)>(
            r#"
            SELECT next_offset FROM consumer_offsets
            WHERE group_name = $1 AND topic = $2 AND partition_no = $3
            "#,
        )
        .bind(group)
        .bind(topic)
        .bind(partition as i32)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.0).unwrap_or(0))
    }

    async fn commit(
        &self,
        group: &str,
        topic: &str,
        partition: u32,
        next_offset: i64,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO consumer_offsets (group_name, topic, partition_no, next_offset)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (group_name, topic, partition_no)
            DO UPDATE SET next_offset = EXCLUDED.next_offset, committed_at = now()
            "#,
        )
        .bind(group)
        .bind(topic)
        .bind(partition as i32)
        .bind(next_offset)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// sqlx::FromRow for Delivery
// ---------------------------------------------------------------------------

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for Delivery {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> std::result::Result<Self, sqlx::Error> {
        use sqlx::Row;
        let partition: i32 = row.try_get("partition_no")?;
        Ok(Delivery {
            topic: row.try_get("topic")?,
            partition: u32::try_from(partition).map_err(|e| sqlx::Error::ColumnDecode {
                index: "partition_no".to_string(),
                source: Box::new(e),
            })?,
            offset: row.try_get("msg_offset")?,
            key: row.try_get("msg_key")?,
            payload: row.try_get("payload")?,
            ts: row.try_get("ts")?,
        })
    }
}
