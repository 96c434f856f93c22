/// Playlist model, the public flag, and the liked-songs sentinel
///
/// # Schema
///
/// ```sql
/// CREATE TABLE playlists (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     is_public BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # The liked-songs pseudo-playlist
///
/// Every user has a virtual "Liked Songs" playlist computed from their like
/// relation. It is never persisted and is addressed by the sentinel id
/// `liked_songs`. [`PlaylistRef`] is the tagged variant that forces call
/// sites to handle the sentinel explicitly instead of treating it as a
/// malformed UUID.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Sentinel identifier of the virtual liked-songs playlist
pub const LIKED_SONGS_ID: &str = "liked_songs";

/// A playlist reference as it appears on the wire: either the liked-songs
/// sentinel or a real playlist id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaylistRef {
    /// The user's virtual liked-songs playlist
    LikedSongs,

    /// A persisted playlist
    Playlist(Uuid),
}

impl FromStr for PlaylistRef {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == LIKED_SONGS_ID {
            Ok(PlaylistRef::LikedSongs)
        } else {
            Uuid::parse_str(s).map(PlaylistRef::Playlist)
        }
    }
}

impl fmt::Display for PlaylistRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaylistRef::LikedSongs => f.write_str(LIKED_SONGS_ID),
            PlaylistRef::Playlist(id) => write!(f, "{}", id),
        }
    }
}

impl<'de> Deserialize<'de> for PlaylistRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(|_| {
            serde::de::Error::custom(format!(
                "expected a playlist id or \"{}\", got \"{}\"",
                LIKED_SONGS_ID, s
            ))
        })
    }
}

impl Serialize for PlaylistRef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

/// Playlist model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Playlist {
    /// Unique playlist ID (UUID v4)
    pub id: Uuid,

    /// Playlist name
    pub name: String,

    /// Description (empty string when not provided)
    pub description: String,

    /// Owning user; deleting that user deletes their playlists
    pub owner_id: Uuid,

    /// Whether the playlist is visible to other users
    ///
    /// Defaults to private; flips only via the owner's explicit toggle.
    pub is_public: bool,

    /// When the playlist was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new playlist
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlaylist {
    /// Playlist name (required)
    pub name: String,

    /// Description (defaults to empty)
    pub description: String,

    /// Owning user
    pub owner_id: Uuid,

    /// Initial visibility
    pub is_public: bool,
}

/// A playlist annotated for listings: owner name, song count, and the cover
/// of its first-inserted song
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PlaylistSummary {
    /// Playlist ID
    pub id: Uuid,

    /// Playlist name
    pub name: String,

    /// Description
    pub description: String,

    /// Owner's username
    pub owner_username: String,

    /// Visibility flag
    pub is_public: bool,

    /// Creation time
    pub created_at: DateTime<Utc>,

    /// Number of member songs
    pub song_count: i64,

    /// Cover image of the first-inserted song (by insertion time), if that
    /// song exists and has one
    pub cover_image: Option<String>,
}

/// Columns selected for annotated playlist summaries
const SUMMARY_SELECT: &str = r#"
    SELECT p.id, p.name, p.description, u.username AS owner_username,
           p.is_public, p.created_at,
           (SELECT COUNT(*) FROM playlist_songs ps WHERE ps.playlist_id = p.id) AS song_count,
           (SELECT m.cover_image
            FROM playlist_songs ps
            JOIN music m ON m.id = ps.music_id
            WHERE ps.playlist_id = p.id
            ORDER BY ps.added_at ASC
            LIMIT 1) AS cover_image
    FROM playlists p
    JOIN users u ON u.id = p.owner_id
"#;

impl Playlist {
    /// Creates a new playlist
    ///
    /// # Errors
    ///
    /// Returns an error if the owner does not exist or the database
    /// connection fails.
    pub async fn create(pool: &PgPool, data: CreatePlaylist) -> Result<Self, sqlx::Error> {
        let playlist = sqlx::query_as::<_, Playlist>(
            r#"
            INSERT INTO playlists (name, description, owner_id, is_public)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, description, owner_id, is_public, created_at
            "#,
        )
        .bind(data.name)
        .bind(data.description)
        .bind(data.owner_id)
        .bind(data.is_public)
        .fetch_one(pool)
        .await?;

        Ok(playlist)
    }

    /// Finds a playlist owned by the given user
    ///
    /// The ownership filter doubles as the existence check: a playlist owned
    /// by someone else comes back None, same as a missing one.
    pub async fn find_owned(
        pool: &PgPool,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let playlist = sqlx::query_as::<_, Playlist>(
            r#"
            SELECT id, name, description, owner_id, is_public, created_at
            FROM playlists
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await?;

        Ok(playlist)
    }

    /// Finds a playlist that is public, regardless of owner
    ///
    /// Private playlists come back None for every caller.
    pub async fn find_public(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let playlist = sqlx::query_as::<_, Playlist>(
            r#"
            SELECT id, name, description, owner_id, is_public, created_at
            FROM playlists
            WHERE id = $1 AND is_public = TRUE
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(playlist)
    }

    /// Lists a user's playlists with summary annotations, newest first
    pub async fn list_owned(
        pool: &PgPool,
        owner_id: Uuid,
    ) -> Result<Vec<PlaylistSummary>, sqlx::Error> {
        let sql = format!(
            "{} WHERE p.owner_id = $1 ORDER BY p.created_at DESC",
            SUMMARY_SELECT
        );

        sqlx::query_as::<_, PlaylistSummary>(&sql)
            .bind(owner_id)
            .fetch_all(pool)
            .await
    }

    /// Lists all public playlists with summary annotations, newest first
    pub async fn list_public(pool: &PgPool) -> Result<Vec<PlaylistSummary>, sqlx::Error> {
        let sql = format!(
            "{} WHERE p.is_public = TRUE ORDER BY p.created_at DESC",
            SUMMARY_SELECT
        );

        sqlx::query_as::<_, PlaylistSummary>(&sql).fetch_all(pool).await
    }

    /// Flips the public flag of a playlist owned by the given user
    ///
    /// Last write wins under concurrent toggles.
    ///
    /// # Returns
    ///
    /// The new flag value, or None if the playlist is missing or not owned
    /// by the user
    pub async fn toggle_public(
        pool: &PgPool,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<bool>, sqlx::Error> {
        let is_public: Option<bool> = sqlx::query_scalar(
            r#"
            UPDATE playlists
            SET is_public = NOT is_public
            WHERE id = $1 AND owner_id = $2
            RETURNING is_public
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await?;

        Ok(is_public)
    }

    /// Deletes a playlist owned by the given user
    ///
    /// Removes its membership rows then the playlist itself, in one
    /// transaction.
    ///
    /// # Returns
    ///
    /// True if the playlist existed, was owned by the user, and was deleted
    pub async fn delete_owned(
        pool: &PgPool,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            "DELETE FROM playlist_songs
             WHERE playlist_id IN (SELECT id FROM playlists WHERE id = $1 AND owner_id = $2)",
        )
        .bind(id)
        .bind(owner_id)
        .execute(&mut *tx)
        .await?;

        let deleted = sqlx::query("DELETE FROM playlists WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playlist_ref_parses_sentinel() {
        let parsed: PlaylistRef = "liked_songs".parse().expect("sentinel should parse");
        assert_eq!(parsed, PlaylistRef::LikedSongs);
        assert_eq!(parsed.to_string(), "liked_songs");
    }

    #[test]
    fn test_playlist_ref_parses_uuid() {
        let id = Uuid::new_v4();
        let parsed: PlaylistRef = id.to_string().parse().expect("uuid should parse");
        assert_eq!(parsed, PlaylistRef::Playlist(id));
        assert_eq!(parsed.to_string(), id.to_string());
    }

    #[test]
    fn test_playlist_ref_rejects_garbage() {
        assert!("not-a-playlist".parse::<PlaylistRef>().is_err());
        assert!("".parse::<PlaylistRef>().is_err());
        // The sentinel must match exactly
        assert!("Liked_Songs".parse::<PlaylistRef>().is_err());
    }

    #[test]
    fn test_playlist_ref_serde_roundtrip() {
        let sentinel: PlaylistRef = serde_json::from_str("\"liked_songs\"").unwrap();
        assert_eq!(sentinel, PlaylistRef::LikedSongs);
        assert_eq!(serde_json::to_string(&sentinel).unwrap(), "\"liked_songs\"");

        let id = Uuid::new_v4();
        let json = format!("\"{}\"", id);
        let parsed: PlaylistRef = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, PlaylistRef::Playlist(id));
        assert_eq!(serde_json::to_string(&parsed).unwrap(), json);
    }

    #[test]
    fn test_summary_select_cover_uses_insertion_order() {
        // The listing cover comes from the first-inserted song even when
        // that song has no cover image; it must not fall through to later
        // songs.
        assert!(SUMMARY_SELECT.contains("ORDER BY ps.added_at ASC"));
        assert!(SUMMARY_SELECT.contains("LIMIT 1"));
    }

    // Integration tests for database operations are in chorus-api/tests/
}
