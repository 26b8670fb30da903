use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct SubscriptionStore {
    pool: SqlitePool,
}

/// Public channel fields returned by subscription listings.
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct ChannelSummary {
    pub uuid: String,
    pub username: String,
    pub full_name: String,
}

impl SubscriptionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Toggle a subscription. Returns true when the caller is now
    /// subscribed, false when the existing subscription was removed.
    pub async fn toggle(&self, subscriber_id: i64, channel_id: i64) -> Result<bool, sqlx::Error> {
        let deleted =
            sqlx::query("DELETE FROM subscriptions WHERE subscriber_id = ? AND channel_id = ?")
                .bind(subscriber_id)
                .bind(channel_id)
                .execute(&self.pool)
                .await?;

        if deleted.rows_affected() > 0 {
            return Ok(false);
        }

        sqlx::query("INSERT INTO subscriptions (subscriber_id, channel_id) VALUES (?, ?)")
            .bind(subscriber_id)
            .bind(channel_id)
            .execute(&self.pool)
            .await?;
        Ok(true)
    }

    /// Is `subscriber_id` currently subscribed to `channel_id`?
    pub async fn is_subscribed(
        &self,
        subscriber_id: i64,
        channel_id: i64,
    ) -> Result<bool, sqlx::Error> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM subscriptions WHERE subscriber_id = ? AND channel_id = ?",
        )
        .bind(subscriber_id)
        .bind(channel_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count.0 > 0)
    }

    /// Number of subscribers a channel has.
    pub async fn subscriber_count(&self, channel_id: i64) -> Result<i64, sqlx::Error> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM subscriptions WHERE channel_id = ?")
                .bind(channel_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count.0)
    }

    /// Number of channels a user is subscribed to.
    pub async fn subscribed_count(&self, subscriber_id: i64) -> Result<i64, sqlx::Error> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM subscriptions WHERE subscriber_id = ?")
                .bind(subscriber_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count.0)
    }

    /// Channels the user is subscribed to, newest subscription first.
    pub async fn subscribed_channels(
        &self,
        subscriber_id: i64,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<ChannelSummary>, i64), sqlx::Error> {
        let rows: Vec<ChannelSummary> = sqlx::query_as(
            "SELECT u.uuid, u.username, u.full_name
             FROM subscriptions s JOIN users u ON u.id = s.channel_id
             WHERE s.subscriber_id = ?
             ORDER BY s.created_at DESC LIMIT ? OFFSET ?",
        )
        .bind(subscriber_id)
        .bind(limit)
        .bind((page - 1) * limit)
        .fetch_all(&self.pool)
        .await?;

        let total = self.subscribed_count(subscriber_id).await?;
        Ok((rows, total))
    }

    /// Subscribers of the given channel, newest first.
    pub async fn channel_subscribers(
        &self,
        channel_id: i64,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<ChannelSummary>, i64), sqlx::Error> {
        let rows: Vec<ChannelSummary> = sqlx::query_as(
            "SELECT u.uuid, u.username, u.full_name
             FROM subscriptions s JOIN users u ON u.id = s.subscriber_id
             WHERE s.channel_id = ?
             ORDER BY s.created_at DESC LIMIT ? OFFSET ?",
        )
        .bind(channel_id)
        .bind(limit)
        .bind((page - 1) * limit)
        .fetch_all(&self.pool)
        .await?;

        let total = self.subscriber_count(channel_id).await?;
        Ok((rows, total))
    }
}
