//! Video metadata storage.
//!
//! Media bytes live in an external blob store; rows here hold the asset URLs
//! plus publishing metadata. `publisher_id` is the ownership anchor checked
//! by mutation endpoints.

use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct VideoStore {
    pool: SqlitePool,
}

/// A video row as stored.
#[derive(Debug, Clone)]
pub struct Video {
    pub id: i64,
    pub uuid: String,
    pub publisher_id: i64,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub duration_secs: f64,
    pub published: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(sqlx::FromRow)]
struct VideoRow {
    id: i64,
    uuid: String,
    publisher_id: i64,
    title: String,
    description: String,
    video_url: String,
    thumbnail_url: String,
    duration_secs: f64,
    published: i64,
    created_at: String,
    updated_at: String,
}

impl From<VideoRow> for Video {
    fn from(row: VideoRow) -> Self {
        Self {
            id: row.id,
            uuid: row.uuid,
            publisher_id: row.publisher_id,
            title: row.title,
            description: row.description,
            video_url: row.video_url,
            thumbnail_url: row.thumbnail_url,
            duration_secs: row.duration_secs,
            published: row.published != 0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// A video joined with its publisher's public fields, for listings and
/// detail responses.
#[derive(Debug, Clone, serde::Serialize)]
pub struct VideoDetail {
    pub uuid: String,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub duration_secs: f64,
    pub published: bool,
    pub publisher_uuid: String,
    pub publisher_username: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(sqlx::FromRow)]
struct VideoDetailRow {
    uuid: String,
    title: String,
    description: String,
    video_url: String,
    thumbnail_url: String,
    duration_secs: f64,
    published: i64,
    publisher_uuid: String,
    publisher_username: String,
    created_at: String,
    updated_at: String,
}

impl From<VideoDetailRow> for VideoDetail {
    fn from(row: VideoDetailRow) -> Self {
        Self {
            uuid: row.uuid,
            title: row.title,
            description: row.description,
            video_url: row.video_url,
            thumbnail_url: row.thumbnail_url,
            duration_secs: row.duration_secs,
            published: row.published != 0,
            publisher_uuid: row.publisher_uuid,
            publisher_username: row.publisher_username,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const DETAIL_COLUMNS: &str = "v.uuid, v.title, v.description, v.video_url, v.thumbnail_url, \
     v.duration_secs, v.published, u.uuid AS publisher_uuid, \
     u.username AS publisher_username, v.created_at, v.updated_at";

impl VideoStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new video record. Returns the video ID.
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        uuid: &str,
        publisher_id: i64,
        title: &str,
        description: &str,
        video_url: &str,
        thumbnail_url: &str,
        duration_secs: f64,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO videos (uuid, publisher_id, title, description, video_url, thumbnail_url, duration_secs)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid)
        .bind(publisher_id)
        .bind(title)
        .bind(description)
        .bind(video_url)
        .bind(thumbnail_url)
        .bind(duration_secs)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Get a raw video row by UUID.
    pub async fn get_by_uuid(&self, uuid: &str) -> Result<Option<Video>, sqlx::Error> {
        let row: Option<VideoRow> = sqlx::query_as(
            "SELECT id, uuid, publisher_id, title, description, video_url, thumbnail_url,
                    duration_secs, published, created_at, updated_at
             FROM videos WHERE uuid = ?",
        )
        .bind(uuid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Video::from))
    }

    /// Get a video joined with its publisher, for responses.
    pub async fn get_detail(&self, uuid: &str) -> Result<Option<VideoDetail>, sqlx::Error> {
        let row: Option<VideoDetailRow> = sqlx::query_as(&format!(
            "SELECT {} FROM videos v JOIN users u ON u.id = v.publisher_id WHERE v.uuid = ?",
            DETAIL_COLUMNS
        ))
        .bind(uuid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(VideoDetail::from))
    }

    /// List videos with optional text and channel filters.
    ///
    /// Unpublished videos are included only when owned by `viewer_id`.
    /// Returns the page of results plus the total match count.
    pub async fn list(
        &self,
        viewer_id: i64,
        query: Option<&str>,
        channel_uuid: Option<&str>,
        newest_first: bool,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<VideoDetail>, i64), sqlx::Error> {
        let filter = "FROM videos v JOIN users u ON u.id = v.publisher_id
             WHERE (v.published = 1 OR v.publisher_id = ?1)
               AND (?2 IS NULL OR v.title LIKE '%' || ?2 || '%' OR v.description LIKE '%' || ?2 || '%')
               AND (?3 IS NULL OR u.uuid = ?3)";
        let order = if newest_first { "DESC" } else { "ASC" };
        let offset = (page - 1) * limit;

        let rows: Vec<VideoDetailRow> = sqlx::query_as(&format!(
            "SELECT {} {} ORDER BY v.created_at {} LIMIT ?4 OFFSET ?5",
            DETAIL_COLUMNS, filter, order
        ))
        .bind(viewer_id)
        .bind(query)
        .bind(channel_uuid)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) {}", filter))
            .bind(viewer_id)
            .bind(query)
            .bind(channel_uuid)
            .fetch_one(&self.pool)
            .await?;

        Ok((rows.into_iter().map(VideoDetail::from).collect(), total.0))
    }

    /// Update the title.
    pub async fn update_title(&self, id: i64, title: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE videos SET title = ?, updated_at = datetime('now') WHERE id = ?",
        )
        .bind(title)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Update the description.
    pub async fn update_description(&self, id: i64, description: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE videos SET description = ?, updated_at = datetime('now') WHERE id = ?",
        )
        .bind(description)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Point the record at a replacement video file.
    pub async fn update_video_file(
        &self,
        id: i64,
        video_url: &str,
        duration_secs: f64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE videos SET video_url = ?, duration_secs = ?, updated_at = datetime('now') WHERE id = ?",
        )
        .bind(video_url)
        .bind(duration_secs)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Point the record at a replacement thumbnail.
    pub async fn update_thumbnail(&self, id: i64, thumbnail_url: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE videos SET thumbnail_url = ?, updated_at = datetime('now') WHERE id = ?",
        )
        .bind(thumbnail_url)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Flip the published flag. Returns the new value.
    pub async fn toggle_published(&self, id: i64) -> Result<bool, sqlx::Error> {
        sqlx::query(
            "UPDATE videos SET published = 1 - published, updated_at = datetime('now') WHERE id = ?",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        let row: (i64,) = sqlx::query_as("SELECT published FROM videos WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0 != 0)
    }

    /// Delete a video. Its view rows cascade.
    pub async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM videos WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
