//! Resource ownership checks for mutating endpoints.

use crate::db::{Database, Video};

/// Why an ownership check failed.
#[derive(Debug)]
pub enum OwnershipError {
    /// The resource does not exist
    NotFound,
    /// The caller is not the resource's owner
    NotOwner,
    /// Store failure while loading the resource
    Store(sqlx::Error),
}

/// Verify that `owner_id` owns the video identified by `video_uuid`.
///
/// Returns the loaded video so callers do not look it up a second time.
pub async fn require_video_owner(
    db: &Database,
    video_uuid: &str,
    owner_id: i64,
) -> Result<Video, OwnershipError> {
    let video = db
        .videos()
        .get_by_uuid(video_uuid)
        .await
        .map_err(OwnershipError::Store)?
        .ok_or(OwnershipError::NotFound)?;

    if video.publisher_id != owner_id {
        return Err(OwnershipError::NotOwner);
    }

    Ok(video)
}
