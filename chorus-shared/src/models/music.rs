/// Music model and catalog queries
///
/// This module provides the Music model, the like relation, and the catalog
/// queries behind the listing, popular, search, and liked endpoints.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE music (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     artist VARCHAR(255) NOT NULL DEFAULT '',
///     audio_file VARCHAR(512) NOT NULL,
///     cover_image VARCHAR(512),
///     uploaded_by UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     uploaded_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE music_likes (
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     music_id UUID NOT NULL REFERENCES music(id) ON DELETE CASCADE,
///     PRIMARY KEY (user_id, music_id)
/// );
/// ```
///
/// Catalog queries return [`MusicRow`], which carries the uploader's
/// username, the like count, and whether the viewing user likes the track.
/// For anonymous viewers `is_liked` is always false.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Columns selected for annotated catalog rows
///
/// `$1` is the viewing user (nullable): the `is_liked` EXISTS never matches
/// when it is NULL, which yields false for anonymous viewers.
const MUSIC_ROW_SELECT: &str = r#"
    SELECT m.id, m.title, m.artist, m.audio_file, m.cover_image,
           m.uploaded_by, u.username AS uploaded_by_username, m.uploaded_at,
           (SELECT COUNT(*) FROM music_likes ml WHERE ml.music_id = m.id) AS like_count,
           EXISTS (SELECT 1 FROM music_likes ml
                   WHERE ml.music_id = m.id AND ml.user_id = $1) AS is_liked
    FROM music m
    JOIN users u ON u.id = m.uploaded_by
"#;

/// Music model representing one uploaded track
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Music {
    /// Unique music ID (UUID v4)
    pub id: Uuid,

    /// Track title
    pub title: String,

    /// Artist name (empty string when not provided)
    pub artist: String,

    /// Audio file path relative to the media root
    pub audio_file: String,

    /// Optional cover image path relative to the media root
    pub cover_image: Option<String>,

    /// Uploading user; deleting that user deletes their music
    pub uploaded_by: Uuid,

    /// When the track was uploaded
    pub uploaded_at: DateTime<Utc>,
}

/// Input for creating a new music record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMusic {
    /// Track title (required)
    pub title: String,

    /// Artist name (defaults to empty)
    pub artist: String,

    /// Stored audio file path (required)
    pub audio_file: String,

    /// Stored cover image path
    pub cover_image: Option<String>,

    /// Uploading user
    pub uploaded_by: Uuid,
}

/// Catalog row: a track annotated for a specific viewer
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MusicRow {
    /// Music ID
    pub id: Uuid,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Audio file path relative to the media root
    pub audio_file: String,

    /// Cover image path relative to the media root
    pub cover_image: Option<String>,

    /// Uploading user's ID
    pub uploaded_by: Uuid,

    /// Uploading user's username
    pub uploaded_by_username: String,

    /// Upload time
    pub uploaded_at: DateTime<Utc>,

    /// Number of users who like this track
    pub like_count: i64,

    /// Whether the viewing user likes this track (false for anonymous)
    pub is_liked: bool,
}

impl Music {
    /// Creates a new music record
    ///
    /// The caller has already validated the title and stored the audio file;
    /// this only persists the row.
    ///
    /// # Errors
    ///
    /// Returns an error if the uploader does not exist or the database
    /// connection fails.
    pub async fn create(pool: &PgPool, data: CreateMusic) -> Result<Self, sqlx::Error> {
        let music = sqlx::query_as::<_, Music>(
            r#"
            INSERT INTO music (title, artist, audio_file, cover_image, uploaded_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, artist, audio_file, cover_image, uploaded_by, uploaded_at
            "#,
        )
        .bind(data.title)
        .bind(data.artist)
        .bind(data.audio_file)
        .bind(data.cover_image)
        .bind(data.uploaded_by)
        .fetch_one(pool)
        .await?;

        Ok(music)
    }

    /// Finds a music record by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let music = sqlx::query_as::<_, Music>(
            r#"
            SELECT id, title, artist, audio_file, cover_image, uploaded_by, uploaded_at
            FROM music
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(music)
    }

    /// Lists the whole catalog, newest upload first
    ///
    /// # Arguments
    ///
    /// * `viewer` - The viewing user, if authenticated; drives `is_liked`
    pub async fn list_all(
        pool: &PgPool,
        viewer: Option<Uuid>,
    ) -> Result<Vec<MusicRow>, sqlx::Error> {
        let sql = format!("{} ORDER BY m.uploaded_at DESC", MUSIC_ROW_SELECT);

        sqlx::query_as::<_, MusicRow>(&sql)
            .bind(viewer)
            .fetch_all(pool)
            .await
    }

    /// Lists the tracks a user currently likes
    ///
    /// No ordering beyond the relation's natural order.
    pub async fn list_liked(pool: &PgPool, user_id: Uuid) -> Result<Vec<MusicRow>, sqlx::Error> {
        let sql = format!(
            "{} WHERE EXISTS (SELECT 1 FROM music_likes ml
                              WHERE ml.music_id = m.id AND ml.user_id = $1)",
            MUSIC_ROW_SELECT
        );

        sqlx::query_as::<_, MusicRow>(&sql)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Lists tracks ranked by like count, most liked first
    ///
    /// Ties fall back to the store's arbitrary stable order.
    pub async fn popular(
        pool: &PgPool,
        viewer: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<MusicRow>, sqlx::Error> {
        let sql = format!("{} ORDER BY like_count DESC LIMIT $2", MUSIC_ROW_SELECT);

        sqlx::query_as::<_, MusicRow>(&sql)
            .bind(viewer)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Case-insensitive substring search over title and artist
    ///
    /// Results come back newest first, capped at `limit`. Callers are
    /// expected to have rejected empty queries already; an empty pattern
    /// here would match everything.
    pub async fn search(
        pool: &PgPool,
        viewer: Option<Uuid>,
        query: &str,
        limit: i64,
    ) -> Result<Vec<MusicRow>, sqlx::Error> {
        let pattern = format!("%{}%", query);
        let sql = format!(
            "{} WHERE m.title ILIKE $2 OR m.artist ILIKE $2
             ORDER BY m.uploaded_at DESC
             LIMIT $3",
            MUSIC_ROW_SELECT
        );

        sqlx::query_as::<_, MusicRow>(&sql)
            .bind(viewer)
            .bind(pattern)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Toggles a user's like on a track
    ///
    /// An involution: add if absent, remove if present. The check-then-write
    /// races with concurrent toggles at read-then-write granularity; last
    /// write wins.
    ///
    /// # Returns
    ///
    /// `Some((liked, like_count))` with the new state, or None if the track
    /// does not exist
    pub async fn toggle_like(
        pool: &PgPool,
        user_id: Uuid,
        music_id: Uuid,
    ) -> Result<Option<(bool, i64)>, sqlx::Error> {
        if Music::find_by_id(pool, music_id).await?.is_none() {
            return Ok(None);
        }

        let already_liked: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM music_likes WHERE user_id = $1 AND music_id = $2)",
        )
        .bind(user_id)
        .bind(music_id)
        .fetch_one(pool)
        .await?;

        if already_liked {
            sqlx::query("DELETE FROM music_likes WHERE user_id = $1 AND music_id = $2")
                .bind(user_id)
                .bind(music_id)
                .execute(pool)
                .await?;
        } else {
            sqlx::query(
                "INSERT INTO music_likes (user_id, music_id) VALUES ($1, $2)
                 ON CONFLICT DO NOTHING",
            )
            .bind(user_id)
            .bind(music_id)
            .execute(pool)
            .await?;
        }

        let like_count = Music::like_count(pool, music_id).await?;
        Ok(Some((!already_liked, like_count)))
    }

    /// Adds a like without ever removing one
    ///
    /// Used by the liked-songs pseudo-playlist's add-song path, which is
    /// add-only by design (unlike the toggle endpoint).
    ///
    /// # Returns
    ///
    /// `Some(true)` if the like was added, `Some(false)` if it already
    /// existed, None if the track does not exist
    pub async fn like_if_absent(
        pool: &PgPool,
        user_id: Uuid,
        music_id: Uuid,
    ) -> Result<Option<bool>, sqlx::Error> {
        if Music::find_by_id(pool, music_id).await?.is_none() {
            return Ok(None);
        }

        let inserted = sqlx::query(
            "INSERT INTO music_likes (user_id, music_id) VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(music_id)
        .execute(pool)
        .await?
        .rows_affected();

        Ok(Some(inserted > 0))
    }

    /// Number of users who like a track
    pub async fn like_count(pool: &PgPool, music_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM music_likes WHERE music_id = $1")
            .bind(music_id)
            .fetch_one(pool)
            .await
    }

    /// Number of tracks a user likes (the liked-songs pseudo-playlist size)
    pub async fn count_liked(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM music_likes WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// Deletes a track if it is owned by the given user
    ///
    /// The ownership check doubles as the existence check: a track owned by
    /// someone else deletes zero rows, indistinguishable from a missing one.
    ///
    /// # Returns
    ///
    /// True if a row was deleted
    pub async fn delete_owned(
        pool: &PgPool,
        user_id: Uuid,
        music_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM music WHERE id = $1 AND uploaded_by = $2")
            .bind(music_id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_music_struct() {
        let create = CreateMusic {
            title: "Song A".to_string(),
            artist: String::new(),
            audio_file: "music/abc.mp3".to_string(),
            cover_image: None,
            uploaded_by: Uuid::new_v4(),
        };

        assert_eq!(create.title, "Song A");
        assert!(create.artist.is_empty());
        assert!(create.cover_image.is_none());
    }

    #[test]
    fn test_music_row_select_mentions_viewer_bind() {
        // The annotated select drives every catalog query; the nullable
        // viewer bind is what keeps is_liked false for anonymous callers.
        assert!(MUSIC_ROW_SELECT.contains("ml.user_id = $1"));
        assert!(MUSIC_ROW_SELECT.contains("AS like_count"));
        assert!(MUSIC_ROW_SELECT.contains("AS is_liked"));
    }

    // Integration tests for database operations are in chorus-api/tests/
}
