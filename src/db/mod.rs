mod subscription;
mod user;
mod video;
mod view;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

pub use subscription::{ChannelSummary, SubscriptionStore};
pub use user::{User, UserStore};
pub use video::{Video, VideoDetail, VideoStore};
pub use view::{ViewStore, ViewerEntry, WatchedVideo};

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open or create a database at the given path.
    /// Use ":memory:" for an in-memory database.
    pub async fn open(path: &str) -> Result<Self, sqlx::Error> {
        let url = if path == ":memory:" {
            "sqlite::memory:".to_string()
        } else {
            format!("sqlite:{}?mode=rwc", path)
        };

        // Foreign keys are off by default in SQLite; account deletion relies
        // on ON DELETE CASCADE.
        let options = SqliteConnectOptions::from_str(&url)?.foreign_keys(true);

        // An in-memory database exists per connection, so the pool must stay
        // at a single connection for every query to see the same data.
        let pool = if path == ":memory:" {
            SqlitePoolOptions::new()
                .min_connections(1)
                .max_connections(1)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Get the current schema version.
    async fn get_version(&self) -> Result<i32, sqlx::Error> {
        let result: Option<(i32,)> = sqlx::query_as("SELECT version FROM schema_version LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;
        Ok(result.map(|r| r.0).unwrap_or(0))
    }

    /// Set the schema version within a transaction.
    async fn set_version(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        version: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM schema_version")
            .execute(&mut **tx)
            .await?;
        sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
            .bind(version)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Run database migrations.
    async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::query("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)")
            .execute(&self.pool)
            .await?;

        let version = self.get_version().await?;

        if version < 1 {
            self.migrate_v1().await?;
        }

        Ok(())
    }

    /// Execute a list of queries in a transaction, then set the version.
    async fn run_migration(
        &self,
        version: i32,
        queries: &[&'static str],
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        for query in queries {
            sqlx::query(*query).execute(&mut *tx).await?;
        }
        Self::set_version(&mut tx, version).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn migrate_v1(&self) -> Result<(), sqlx::Error> {
        self.run_migration(
            1,
            &[
                // Users table. Usernames and emails are stored trimmed and
                // lowercased; lookups normalize the same way.
                "CREATE TABLE users (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT UNIQUE NOT NULL,
                    username TEXT UNIQUE NOT NULL COLLATE NOCASE,
                    email TEXT UNIQUE NOT NULL COLLATE NOCASE,
                    full_name TEXT NOT NULL,
                    password_hash TEXT NOT NULL,
                    refresh_token TEXT,
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                )",
                "CREATE INDEX idx_users_uuid ON users(uuid)",
                "CREATE INDEX idx_users_username ON users(username)",
                "CREATE INDEX idx_users_email ON users(email)",
                // Videos table
                "CREATE TABLE videos (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT UNIQUE NOT NULL,
                    publisher_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    title TEXT NOT NULL,
                    description TEXT NOT NULL,
                    video_url TEXT NOT NULL,
                    thumbnail_url TEXT NOT NULL,
                    duration_secs REAL NOT NULL DEFAULT 0,
                    published INTEGER NOT NULL DEFAULT 1,
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
                )",
                "CREATE INDEX idx_videos_uuid ON videos(uuid)",
                "CREATE INDEX idx_videos_publisher_id ON videos(publisher_id)",
                "CREATE INDEX idx_videos_created_at ON videos(created_at)",
                // Subscriptions table
                "CREATE TABLE subscriptions (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    subscriber_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    channel_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    UNIQUE (subscriber_id, channel_id)
                )",
                "CREATE INDEX idx_subscriptions_channel_id ON subscriptions(channel_id)",
                // Views table
                "CREATE TABLE views (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    video_id INTEGER NOT NULL REFERENCES videos(id) ON DELETE CASCADE,
                    publisher_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    viewer_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    in_history INTEGER NOT NULL DEFAULT 1,
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                )",
                "CREATE INDEX idx_views_video_id ON views(video_id)",
                "CREATE INDEX idx_views_viewer_id ON views(viewer_id)",
            ],
        )
        .await
    }

    /// Get the user store.
    pub fn users(&self) -> UserStore {
        UserStore::new(self.pool.clone())
    }

    /// Get the video store.
    pub fn videos(&self) -> VideoStore {
        VideoStore::new(self.pool.clone())
    }

    /// Get the subscription store.
    pub fn subscriptions(&self) -> SubscriptionStore {
        SubscriptionStore::new(self.pool.clone())
    }

    /// Get the view store.
    pub fn views(&self) -> ViewStore {
        ViewStore::new(self.pool.clone())
    }

    /// Get the underlying connection pool (for tests that need raw SQL access).
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_get_user() {
        let db = Database::open(":memory:").await.unwrap();

        let id = db
            .users()
            .create("uuid-123", "alice", "alice@example.com", "Alice A", "hash")
            .await
            .unwrap();

        let user = db.users().get_by_id(id).await.unwrap().unwrap();
        assert_eq!(user.uuid, "uuid-123");
        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "alice@example.com");
        assert!(user.refresh_token.is_none());

        let user = db.users().get_by_uuid("uuid-123").await.unwrap().unwrap();
        assert_eq!(user.id, id);

        let user = db
            .users()
            .find_by_identifier("alice")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.id, id);

        let user = db
            .users()
            .find_by_identifier("alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.id, id);
    }

    #[tokio::test]
    async fn test_duplicate_username_fails() {
        let db = Database::open(":memory:").await.unwrap();

        db.users()
            .create("uuid-1", "alice", "alice@example.com", "Alice", "hash")
            .await
            .unwrap();
        let result = db
            .users()
            .create("uuid-2", "alice", "other@example.com", "Other", "hash")
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_refresh_token_update_and_rotation() {
        let db = Database::open(":memory:").await.unwrap();

        let id = db
            .users()
            .create("uuid-123", "alice", "alice@example.com", "Alice", "hash")
            .await
            .unwrap();

        db.users()
            .update_refresh_token(id, Some("rt-1"))
            .await
            .unwrap();
        let user = db.users().get_by_id(id).await.unwrap().unwrap();
        assert_eq!(user.refresh_token.as_deref(), Some("rt-1"));

        // Compare-and-swap succeeds against the stored value
        assert!(
            db.users()
                .rotate_refresh_token(id, "rt-1", "rt-2")
                .await
                .unwrap()
        );
        // ...and fails against a superseded one
        assert!(
            !db.users()
                .rotate_refresh_token(id, "rt-1", "rt-3")
                .await
                .unwrap()
        );

        db.users().update_refresh_token(id, None).await.unwrap();
        let user = db.users().get_by_id(id).await.unwrap().unwrap();
        assert!(user.refresh_token.is_none());
    }

    #[tokio::test]
    async fn test_delete_user_cascades_to_videos() {
        let db = Database::open(":memory:").await.unwrap();

        let id = db
            .users()
            .create("uuid-123", "alice", "alice@example.com", "Alice", "hash")
            .await
            .unwrap();
        db.videos()
            .create("vid-1", id, "Title", "Desc", "https://cdn/v.mp4", "https://cdn/t.jpg", 12.5)
            .await
            .unwrap();

        assert!(db.users().delete(id).await.unwrap());
        assert!(db.videos().get_by_uuid("vid-1").await.unwrap().is_none());
    }
}
