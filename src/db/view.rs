//! View records: who watched what, feeding watch history.

use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct ViewStore {
    pool: SqlitePool,
}

/// A viewer of some video, for publisher-facing listings.
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct ViewerEntry {
    pub uuid: String,
    pub username: String,
    pub full_name: String,
    pub viewed_at: String,
}

/// A watch-history entry joined with video and publisher fields.
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct WatchedVideo {
    pub uuid: String,
    pub title: String,
    pub thumbnail_url: String,
    pub duration_secs: f64,
    pub publisher_uuid: String,
    pub publisher_username: String,
    pub viewed_at: String,
}

impl ViewStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Record that `viewer_id` watched the video. Returns the view ID.
    pub async fn record(
        &self,
        video_id: i64,
        publisher_id: i64,
        viewer_id: i64,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO views (video_id, publisher_id, viewer_id) VALUES (?, ?, ?)",
        )
        .bind(video_id)
        .bind(publisher_id)
        .bind(viewer_id)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Distinct viewers of a video, most recent view first.
    pub async fn viewers_of_video(&self, video_id: i64) -> Result<Vec<ViewerEntry>, sqlx::Error> {
        sqlx::query_as(
            "SELECT u.uuid, u.username, u.full_name, MAX(w.created_at) AS viewed_at
             FROM views w JOIN users u ON u.id = w.viewer_id
             WHERE w.video_id = ?
             GROUP BY w.viewer_id
             ORDER BY viewed_at DESC",
        )
        .bind(video_id)
        .fetch_all(&self.pool)
        .await
    }

    /// The user's watch history, one entry per video, most recent first.
    pub async fn watch_history(&self, viewer_id: i64) -> Result<Vec<WatchedVideo>, sqlx::Error> {
        sqlx::query_as(
            "SELECT v.uuid, v.title, v.thumbnail_url, v.duration_secs,
                    u.uuid AS publisher_uuid, u.username AS publisher_username,
                    MAX(w.created_at) AS viewed_at
             FROM views w
             JOIN videos v ON v.id = w.video_id
             JOIN users u ON u.id = v.publisher_id
             WHERE w.viewer_id = ? AND w.in_history = 1
             GROUP BY w.video_id
             ORDER BY viewed_at DESC",
        )
        .bind(viewer_id)
        .fetch_all(&self.pool)
        .await
    }
}
