/// User model and database operations
///
/// This module provides the User model and CRUD operations for managing
/// accounts. Chorus authenticates by username; usernames are unique with a
/// case-sensitive exact match.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     username VARCHAR(150) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     profile_image VARCHAR(512),
///     is_staff BOOLEAN NOT NULL DEFAULT FALSE,
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     date_joined TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use chorus_shared::models::user::{CreateUser, User};
/// # use sqlx::PgPool;
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(
///     &pool,
///     CreateUser {
///         username: "alice".to_string(),
///         password_hash: "$argon2id$...".to_string(),
///         profile_image: None,
///     },
/// )
/// .await?;
///
/// let found = User::find_by_username(&pool, "alice").await?;
/// assert!(found.is_some());
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

/// User model representing an account
///
/// Passwords are stored as Argon2id hashes, never in plaintext.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Username (unique, matched case-sensitively)
    pub username: String,

    /// Argon2id password hash
    pub password_hash: String,

    /// Optional profile image (path relative to the media root)
    pub profile_image: Option<String>,

    /// Whether the user has staff privileges
    pub is_staff: bool,

    /// Whether the account is active
    pub is_active: bool,

    /// When the account was created
    pub date_joined: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Username (must not already exist)
    pub username: String,

    /// Argon2id password hash (NOT plaintext password!)
    pub password_hash: String,

    /// Optional profile image path
    pub profile_image: Option<String>,
}

/// Counts of rows purged by an account deletion, for logging
#[derive(Debug, Clone, Copy, Default)]
pub struct AccountDeletion {
    /// Music rows uploaded by the user
    pub music_deleted: u64,

    /// Playlists owned by the user
    pub playlists_deleted: u64,

    /// Like rows cleared for the user
    pub likes_cleared: u64,
}

impl User {
    /// Creates a new user in the database
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Username already exists (unique constraint violation)
    /// - Database connection fails
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash, profile_image)
            VALUES ($1, $2, $3)
            RETURNING id, username, password_hash, profile_image,
                      is_staff, is_active, date_joined
            "#,
        )
        .bind(data.username)
        .bind(data.password_hash)
        .bind(data.profile_image)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    ///
    /// # Returns
    ///
    /// The user if found, None otherwise
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, profile_image,
                   is_staff, is_active, date_joined
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by username (case-sensitive exact match)
    ///
    /// # Returns
    ///
    /// The user if found, None otherwise
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, profile_image,
                   is_staff, is_active, date_joined
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Checks whether a username is already taken (case-sensitive)
    pub async fn username_taken(pool: &PgPool, username: &str) -> Result<bool, sqlx::Error> {
        let taken: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(pool)
                .await?;

        Ok(taken)
    }

    /// Deletes an account and everything it owns
    ///
    /// The purge runs in one transaction, category by category: the user's
    /// music (with that music's like and playlist-membership rows), the
    /// user's playlists (with their membership rows), the user's own like
    /// rows, and finally the user record. Irreversible.
    ///
    /// # Returns
    ///
    /// Counts of purged rows, or None if the user did not exist
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction fails; no partial deletion is
    /// left behind.
    pub async fn delete_account(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<AccountDeletion>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        // Music uploaded by the user, with dependent join rows first
        sqlx::query(
            "DELETE FROM music_likes
             WHERE music_id IN (SELECT id FROM music WHERE uploaded_by = $1)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "DELETE FROM playlist_songs
             WHERE music_id IN (SELECT id FROM music WHERE uploaded_by = $1)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let music_deleted = sqlx::query("DELETE FROM music WHERE uploaded_by = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        // Playlists owned by the user
        sqlx::query(
            "DELETE FROM playlist_songs
             WHERE playlist_id IN (SELECT id FROM playlists WHERE owner_id = $1)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let playlists_deleted = sqlx::query("DELETE FROM playlists WHERE owner_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        // The user's own likes
        let likes_cleared = sqlx::query("DELETE FROM music_likes WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        // Finally, the user record itself
        let user_deleted = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        if user_deleted == 0 {
            return Ok(None);
        }

        info!(
            user_id = %id,
            music_deleted,
            playlists_deleted,
            likes_cleared,
            "Account deleted"
        );

        Ok(Some(AccountDeletion {
            music_deleted,
            playlists_deleted,
            likes_cleared,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_user_struct() {
        let create_user = CreateUser {
            username: "alice".to_string(),
            password_hash: "hash".to_string(),
            profile_image: None,
        };

        assert_eq!(create_user.username, "alice");
        assert_eq!(create_user.password_hash, "hash");
        assert!(create_user.profile_image.is_none());
    }

    #[test]
    fn test_account_deletion_default() {
        let deletion = AccountDeletion::default();
        assert_eq!(deletion.music_deleted, 0);
        assert_eq!(deletion.playlists_deleted, 0);
        assert_eq!(deletion.likes_cleared, 0);
    }

    // Integration tests for database operations are in chorus-api/tests/
}
