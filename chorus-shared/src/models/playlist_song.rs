/// Playlist membership join rows
///
/// # Schema
///
/// ```sql
/// CREATE TABLE playlist_songs (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     playlist_id UUID NOT NULL REFERENCES playlists(id) ON DELETE CASCADE,
///     music_id UUID NOT NULL REFERENCES music(id) ON DELETE CASCADE,
///     added_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Membership order is governed entirely by `added_at`; there is no
/// position column. The schema does NOT enforce uniqueness of
/// (playlist_id, music_id): callers pre-check with [`PlaylistSong::exists`]
/// before inserting, so duplicate joins are logically possible but
/// suppressed at the application layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::music::MusicRow;

/// One playlist membership row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PlaylistSong {
    /// Unique row ID
    pub id: Uuid,

    /// The playlist
    pub playlist_id: Uuid,

    /// The member song
    pub music_id: Uuid,

    /// When the song was added; drives playlist ordering
    pub added_at: DateTime<Utc>,
}

impl PlaylistSong {
    /// Checks whether a song is already in a playlist
    pub async fn exists(
        pool: &PgPool,
        playlist_id: Uuid,
        music_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM playlist_songs
                            WHERE playlist_id = $1 AND music_id = $2)",
        )
        .bind(playlist_id)
        .bind(music_id)
        .fetch_one(pool)
        .await
    }

    /// Inserts a membership row stamped with the current time
    ///
    /// Callers wanting at-most-one membership must call [`Self::exists`]
    /// first; this insert itself does not deduplicate.
    pub async fn add(
        pool: &PgPool,
        playlist_id: Uuid,
        music_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let row = sqlx::query_as::<_, PlaylistSong>(
            r#"
            INSERT INTO playlist_songs (playlist_id, music_id)
            VALUES ($1, $2)
            RETURNING id, playlist_id, music_id, added_at
            "#,
        )
        .bind(playlist_id)
        .bind(music_id)
        .fetch_one(pool)
        .await?;

        Ok(row)
    }

    /// Removes all membership rows for a (playlist, song) pair
    ///
    /// Idempotent: zero matching rows is not an error.
    ///
    /// # Returns
    ///
    /// Number of rows removed
    pub async fn remove(
        pool: &PgPool,
        playlist_id: Uuid,
        music_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM playlist_songs WHERE playlist_id = $1 AND music_id = $2")
                .bind(playlist_id)
                .bind(music_id)
                .execute(pool)
                .await?;

        Ok(result.rows_affected())
    }

    /// Number of songs in a playlist
    pub async fn count(pool: &PgPool, playlist_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM playlist_songs WHERE playlist_id = $1")
            .bind(playlist_id)
            .fetch_one(pool)
            .await
    }

    /// Lists a playlist's songs in insertion order, annotated for a viewer
    pub async fn songs(
        pool: &PgPool,
        playlist_id: Uuid,
        viewer: Option<Uuid>,
    ) -> Result<Vec<MusicRow>, sqlx::Error> {
        sqlx::query_as::<_, MusicRow>(
            r#"
            SELECT m.id, m.title, m.artist, m.audio_file, m.cover_image,
                   m.uploaded_by, u.username AS uploaded_by_username, m.uploaded_at,
                   (SELECT COUNT(*) FROM music_likes ml WHERE ml.music_id = m.id) AS like_count,
                   EXISTS (SELECT 1 FROM music_likes ml
                           WHERE ml.music_id = m.id AND ml.user_id = $1) AS is_liked
            FROM playlist_songs ps
            JOIN music m ON m.id = ps.music_id
            JOIN users u ON u.id = m.uploaded_by
            WHERE ps.playlist_id = $2
            ORDER BY ps.added_at ASC
            "#,
        )
        .bind(viewer)
        .bind(playlist_id)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playlist_song_serde() {
        let row = PlaylistSong {
            id: Uuid::new_v4(),
            playlist_id: Uuid::new_v4(),
            music_id: Uuid::new_v4(),
            added_at: Utc::now(),
        };

        let json = serde_json::to_string(&row).expect("serialize");
        let back: PlaylistSong = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.id, row.id);
        assert_eq!(back.playlist_id, row.playlist_id);
        assert_eq!(back.music_id, row.music_id);
    }

    // Integration tests for database operations are in chorus-api/tests/
}
